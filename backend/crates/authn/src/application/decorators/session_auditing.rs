//! Session module auditing
//!
//! Module auditing for the session module, plus session id propagation.
//! After both `validate_request` and `secure_response` the side channel is
//! drained so the session module's metadata never ends up on the entry of
//! a module that runs later.

use async_trait::async_trait;

use crate::domain::auth_context::{AuthContext, AuthModule};
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::Outcome;
use crate::domain::subject::Subject;
use crate::error::AuthResult;

use super::auditing::ModuleAuditing;

pub struct SessionAuditing<M> {
    inner: ModuleAuditing<M>,
}

impl<M> SessionAuditing<M> {
    pub fn new(inner: M) -> Self {
        Self {
            inner: ModuleAuditing::new(inner),
        }
    }
}

fn audit_session_id(context: &mut MessageContext) {
    let (side_channel, trail) = context.audit_parts();
    side_channel.take_module_info();
    side_channel.take_failure_reason();
    trail.set_session_id(side_channel.take_session_id());
}

#[async_trait]
impl<M: AuthModule> AuthContext for SessionAuditing<M> {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let result = self
            .inner
            .validate_request(context, client_subject, service_subject)
            .await;
        audit_session_id(context);
        result
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let result = self.inner.secure_response(context, service_subject).await;
        audit_session_id(context);
        result
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        self.inner.clean_subject(context, client_subject).await
    }
}

delegate_auth_module!(SessionAuditing);
