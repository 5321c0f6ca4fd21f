//! Fallback through an ordered module list
//!
//! `validate_request` stops at the first module that does not answer
//! `ResponseFailure` and remembers it; `secure_response` goes to that module
//! only. `clean_subject` always reaches every module.

use async_trait::async_trait;
use kernel::id::ContextId;

use super::{clean_result, push_clean_failure};
use crate::domain::auth_context::AuthContext;
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::Outcome;
use crate::domain::subject::Subject;
use crate::error::{AuthError, AuthResult};

/// Per-request memory of which module answered
#[derive(Debug, Default)]
struct FallbackState {
    answered: Option<usize>,
}

pub struct FallbackContext<M> {
    id: ContextId,
    modules: Vec<M>,
}

impl<M> FallbackContext<M> {
    pub fn new(modules: Vec<M>) -> Self {
        Self {
            id: ContextId::new(),
            modules,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn modules(&self) -> &[M] {
        &self.modules
    }
}

#[async_trait]
impl<M: AuthContext> AuthContext for FallbackContext<M> {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        for (index, module) in self.modules.iter().enumerate() {
            let outcome = module
                .validate_request(context, client_subject, service_subject)
                .await?;
            if outcome != Outcome::ResponseFailure {
                context.state::<FallbackState>(self.id).answered = Some(index);
                return Ok(outcome);
            }
        }
        Ok(Outcome::ResponseFailure)
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let module = context
            .existing_state::<FallbackState>(self.id)
            .and_then(|state| state.answered)
            .and_then(|index| self.modules.get(index));
        match module {
            Some(module) => module.secure_response(context, service_subject).await,
            None => Err(AuthError::NoModuleAuthenticated),
        }
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        let mut failures = Vec::new();
        for module in &self.modules {
            if let Err(e) = module.clean_subject(context, client_subject).await {
                push_clean_failure(&mut failures, e);
            }
        }
        clean_result(failures)
    }
}
