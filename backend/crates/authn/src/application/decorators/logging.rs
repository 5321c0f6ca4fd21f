//! Outcome logging
//!
//! Debug line for every regular outcome, error line for invalid outcomes
//! and errors. A successful `clean_subject` is silent.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::domain::auth_context::{
    AuthContext, AuthModule, CallbackHandler, MessagePolicy, MessageType,
};
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::{Outcome, Phase};
use crate::domain::subject::Subject;
use crate::error::AuthResult;

use super::logger::{AuthLogger, LogRecord};

pub struct Logging<M> {
    inner: M,
    name: String,
    logger: Arc<dyn AuthLogger>,
}

impl<M: AuthModule> Logging<M> {
    /// Log under the module's id
    pub fn module(module: M, logger: Arc<dyn AuthLogger>) -> Self {
        Self {
            name: module.module_id(),
            inner: module,
            logger,
        }
    }
}

impl<M> Logging<M> {
    /// Log a composed context under `name`
    pub fn context(context: M, name: impl Into<String>, logger: Arc<dyn AuthLogger>) -> Self {
        Self {
            inner: context,
            name: name.into(),
            logger,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn record(
        &self,
        phase: Phase,
        outcome: Option<Outcome>,
        error: Option<String>,
        message: String,
    ) -> LogRecord {
        LogRecord {
            name: self.name.clone(),
            phase,
            outcome,
            error,
            message,
        }
    }

    fn log_outcome(&self, phase: Phase, result: &AuthResult<Outcome>) {
        let (done, doing) = match phase {
            Phase::ValidateRequest => ("validated request", "validating request"),
            Phase::SecureResponse => ("secured response", "securing response"),
            Phase::CleanSubject => ("cleaned subject", "cleaning subject"),
            Phase::Initialize => ("initialized", "initializing"),
        };
        let name = &self.name;

        match result {
            Ok(outcome) if !outcome.is_valid_for(phase) => {
                let message = format!("{name} returned invalid outcome from {phase}: {outcome}");
                self.logger
                    .error(&self.record(phase, Some(*outcome), None, message));
            }
            Ok(Outcome::ResponseIncomplete) => {
                let message = format!("{name} has not finished {doing}");
                self.logger
                    .debug(&self.record(phase, Some(Outcome::ResponseIncomplete), None, message));
            }
            Ok(Outcome::ResponseFailure) => {
                let message = format!("{name} failed {doing}");
                self.logger
                    .debug(&self.record(phase, Some(Outcome::ResponseFailure), None, message));
            }
            Ok(outcome) => {
                let message = format!("{name} successfully {done}");
                self.logger
                    .debug(&self.record(phase, Some(*outcome), None, message));
            }
            Err(e) => {
                let message = format!("{name} failed {doing}");
                self.logger
                    .error(&self.record(phase, None, Some(e.to_string()), message));
            }
        }
    }
}

#[async_trait]
impl<M: AuthContext> AuthContext for Logging<M> {
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
        self.log_outcome(Phase::ValidateRequest, &result);
        result
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let result = self.inner.secure_response(context, service_subject).await;
        self.log_outcome(Phase::SecureResponse, &result);
        result
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        let result = self.inner.clean_subject(context, client_subject).await;
        if let Err(e) = &result {
            let message = format!("{} failed cleaning subject", self.name);
            self.logger
                .error(&self.record(Phase::CleanSubject, None, Some(e.to_string()), message));
        }
        result
    }
}

#[async_trait]
impl<M: AuthModule> AuthModule for Logging<M> {
    fn module_id(&self) -> String {
        self.inner.module_id()
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        self.inner.supported_message_types()
    }

    async fn initialize(
        &self,
        request_policy: Option<&MessagePolicy>,
        response_policy: Option<&MessagePolicy>,
        handler: Option<Arc<dyn CallbackHandler>>,
        options: &Map<String, Value>,
    ) -> AuthResult<()> {
        let result = self
            .inner
            .initialize(request_policy, response_policy, handler, options)
            .await;
        match &result {
            Ok(()) => {
                let message = format!("{} successfully initialized", self.name);
                self.logger
                    .debug(&self.record(Phase::Initialize, None, None, message));
            }
            Err(e) => {
                let message = format!("{} failed initializing", self.name);
                self.logger
                    .error(&self.record(Phase::Initialize, None, Some(e.to_string()), message));
            }
        }
        result
    }
}
