//! Outcome validation
//!
//! Turns outcomes that are illegal for a phase into
//! [`AuthError::InvalidOutcome`].

use async_trait::async_trait;

use crate::domain::auth_context::AuthContext;
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::{Outcome, Phase};
use crate::domain::subject::Subject;
use crate::error::{AuthError, AuthResult};

pub struct Validating<M> {
    inner: M,
}

impl<M> Validating<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

fn check(phase: Phase, outcome: Outcome) -> AuthResult<Outcome> {
    if outcome.is_valid_for(phase) {
        Ok(outcome)
    } else {
        Err(AuthError::InvalidOutcome { phase, outcome })
    }
}

#[async_trait]
impl<M: AuthContext> AuthContext for Validating<M> {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let outcome = self
            .inner
            .validate_request(context, client_subject, service_subject)
            .await?;
        check(Phase::ValidateRequest, outcome)
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let outcome = self.inner.secure_response(context, service_subject).await?;
        check(Phase::SecureResponse, outcome)
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        self.inner.clean_subject(context, client_subject).await
    }
}

delegate_auth_module!(Validating);
