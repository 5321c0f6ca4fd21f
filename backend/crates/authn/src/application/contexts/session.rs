//! Optional session module
//!
//! Without a module: `validate_request` fails, `secure_response` passes
//! and `clean_subject` does nothing.

use async_trait::async_trait;

use crate::domain::auth_context::AuthContext;
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::Outcome;
use crate::domain::subject::Subject;
use crate::error::AuthResult;

pub struct SessionContext<M> {
    module: Option<M>,
}

impl<M> SessionContext<M> {
    pub fn new(module: Option<M>) -> Self {
        Self { module }
    }

    pub fn module(&self) -> Option<&M> {
        self.module.as_ref()
    }
}

impl<M> Default for SessionContext<M> {
    fn default() -> Self {
        Self { module: None }
    }
}

#[async_trait]
impl<M: AuthContext> AuthContext for SessionContext<M> {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        match &self.module {
            Some(module) => {
                module
                    .validate_request(context, client_subject, service_subject)
                    .await
            }
            None => Ok(Outcome::ResponseFailure),
        }
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        match &self.module {
            Some(module) => module.secure_response(context, service_subject).await,
            None => Ok(Outcome::ResponseAuthenticated),
        }
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        match &self.module {
            Some(module) => module.clean_subject(context, client_subject).await,
            None => Ok(()),
        }
    }
}
