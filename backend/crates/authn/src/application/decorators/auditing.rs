//! Auditing decorators
//!
//! - [`ModuleAuditing`] records one audit entry per module
//!   `validate_request` from the metadata the module left in the side
//!   channel.
//! - [`ContextAuditing`] completes the trail after the composed context
//!   ran and flushes it to the [`AuditApi`].

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::audit_api::AuditApi;
use crate::domain::auth_context::{AuthContext, AuthModule};
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::{Outcome, Phase};
use crate::domain::subject::{Principal, Subject};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// ModuleAuditing
// ============================================================================

pub struct ModuleAuditing<M> {
    inner: M,
}

impl<M> ModuleAuditing<M> {
    pub fn new(inner: M) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &M {
        &self.inner
    }
}

fn reason(key: &str, message: String) -> Map<String, Value> {
    Map::from_iter([(key.to_string(), Value::String(message))])
}

/// Append the entry for one module's `validate_request`
///
/// `ResponseIncomplete` is not a conclusion and leaves the side channel
/// untouched.
pub(crate) fn audit_module_result(
    context: &mut MessageContext,
    module_id: String,
    result: &AuthResult<Outcome>,
) {
    let (side_channel, trail) = context.audit_parts();
    match result {
        Ok(Outcome::ResponseIncomplete) => {}
        Ok(outcome) if outcome.is_authenticated() => {
            let mut info = side_channel.take_module_info();
            if let Some(principal) = side_channel.principal() {
                info.insert(
                    "principal".to_string(),
                    Value::String(principal.to_string()),
                );
            }
            trail.audit_success(module_id, info);
        }
        Ok(Outcome::ResponseFailure) => {
            let reason = side_channel.take_failure_reason().unwrap_or_default();
            trail.audit_failure(module_id, reason, side_channel.take_module_info());
        }
        Ok(outcome) => {
            let message = AuthError::InvalidOutcome {
                phase: Phase::ValidateRequest,
                outcome: *outcome,
            }
            .to_string();
            trail.audit_failure(
                module_id,
                reason("message", message),
                side_channel.take_module_info(),
            );
        }
        Err(error) => {
            side_channel.take_failure_reason();
            trail.audit_failure(
                module_id,
                reason("exception", error.to_string()),
                side_channel.take_module_info(),
            );
        }
    }
}

#[async_trait]
impl<M: AuthModule> AuthContext for ModuleAuditing<M> {
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
        audit_module_result(context, self.inner.module_id(), &result);
        result
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        self.inner.secure_response(context, service_subject).await
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        self.inner.clean_subject(context, client_subject).await
    }
}

delegate_auth_module!(ModuleAuditing);

// ============================================================================
// ContextAuditing
// ============================================================================

pub struct ContextAuditing<C, A> {
    inner: C,
    audit_api: Arc<A>,
}

impl<C, A> ContextAuditing<C, A> {
    pub fn new(inner: C, audit_api: Arc<A>) -> Self {
        Self { inner, audit_api }
    }

    pub fn inner(&self) -> &C {
        &self.inner
    }
}

#[async_trait]
impl<C, A> AuthContext for ContextAuditing<C, A>
where
    C: AuthContext,
    A: AuditApi + Send + Sync,
{
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

        let trail = context.audit_trail_mut();
        match &result {
            Ok(outcome) if outcome.is_authenticated() => {
                let principal = client_subject.last_principal().map(Principal::name);
                trail.complete_as_successful(principal);
            }
            Ok(_) => {
                trail.complete_as_failed(None);
            }
            Err(error) => {
                trail.complete_as_failed(Some(&error.to_string()));
            }
        }

        let record = context.audit_trail().to_value();
        if let Err(e) = self.audit_api.audit(record).await {
            tracing::warn!(
                error = %e,
                request_id = %context.request_id(),
                "Failed to publish audit record"
            );
        }

        result
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        self.inner.secure_response(context, service_subject).await
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        self.inner.clean_subject(context, client_subject).await
    }
}
