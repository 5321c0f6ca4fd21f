//! Test doubles shared by the unit tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use http::{Request, StatusCode};
use serde_json::{Map, Value};

use crate::application::decorators::logger::{AuthLogger, LogRecord};
use crate::domain::auth_context::{
    AuthContext, AuthModule, CallbackHandler, MessagePolicy, MessageType,
};
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::{Outcome, Phase};
use crate::domain::subject::{Principal, Subject};
use crate::error::{AuthError, AuthResult, ModuleError};

pub fn context() -> MessageContext {
    MessageContext::new(Request::new(Body::empty()), "test-transaction")
}

// ============================================================================
// CallLog
// ============================================================================

/// Phase calls shared across several mocks, in call order
#[derive(Clone, Default)]
pub struct CallLog {
    calls: Arc<Mutex<Vec<(String, Phase)>>>,
    initialized: Arc<Mutex<Vec<String>>>,
}

impl CallLog {
    fn record(&self, id: &str, phase: Phase) {
        self.calls.lock().unwrap().push((id.to_string(), phase));
    }

    pub fn count(&self, id: &str, phase: Phase) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|(i, p)| i == id && *p == phase)
            .count()
    }

    pub fn calls(&self) -> Vec<(String, Phase)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn initialized(&self, id: &str) -> usize {
        self.initialized
            .lock()
            .unwrap()
            .iter()
            .filter(|i| *i == id)
            .count()
    }
}

// ============================================================================
// MockModule
// ============================================================================

/// Module with scripted results that records every call
pub struct MockModule {
    id: String,
    validate: AuthResult<Outcome>,
    secure: AuthResult<Outcome>,
    clean_error: Option<String>,
    init_error: Option<String>,
    principals: Vec<String>,
    announce_principal: bool,
    session_id: Option<String>,
    info: Map<String, Value>,
    failure_reason: Option<Map<String, Value>>,
    response_status: Option<StatusCode>,
    message_types: Vec<MessageType>,
    log: CallLog,
}

impl MockModule {
    pub fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            validate: Ok(Outcome::Authenticated),
            secure: Ok(Outcome::ResponseAuthenticated),
            clean_error: None,
            init_error: None,
            principals: Vec::new(),
            announce_principal: true,
            session_id: None,
            info: Map::new(),
            failure_reason: None,
            response_status: None,
            message_types: vec![MessageType::HttpRequest, MessageType::HttpResponse],
            log: CallLog::default(),
        }
    }

    pub fn validate_returns(mut self, outcome: Outcome) -> Self {
        self.validate = Ok(outcome);
        self
    }

    pub fn validate_fails(self, message: &str) -> Self {
        self.validate_error(ModuleError::new(message).into())
    }

    pub fn validate_error(mut self, error: AuthError) -> Self {
        self.validate = Err(error);
        self
    }

    pub fn secure_returns(mut self, outcome: Outcome) -> Self {
        self.secure = Ok(outcome);
        self
    }

    pub fn secure_fails(mut self, message: &str) -> Self {
        self.secure = Err(ModuleError::new(message).into());
        self
    }

    pub fn clean_fails(mut self, message: &str) -> Self {
        self.clean_error = Some(message.to_string());
        self
    }

    pub fn init_fails(mut self, message: &str) -> Self {
        self.init_error = Some(message.to_string());
        self
    }

    pub fn with_principal(mut self, name: &str) -> Self {
        self.principals.push(name.to_string());
        self
    }

    /// Add principals to the client subject only, leaving the side
    /// channel principal unset
    pub fn subject_only(mut self) -> Self {
        self.announce_principal = false;
        self
    }

    pub fn with_session_id(mut self, session_id: &str) -> Self {
        self.session_id = Some(session_id.to_string());
        self
    }

    pub fn with_info(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.info.insert(key.to_string(), value.into());
        self
    }

    pub fn with_failure_reason(mut self, reason: Value) -> Self {
        self.failure_reason = Some(reason.as_object().cloned().unwrap_or_default());
        self
    }

    /// Status the module writes to the response in every phase
    pub fn writes_status(mut self, status: StatusCode) -> Self {
        self.response_status = Some(status);
        self
    }

    pub fn with_message_types(mut self, types: Vec<MessageType>) -> Self {
        self.message_types = types;
        self
    }

    pub fn with_log(mut self, log: &CallLog) -> Self {
        self.log = log.clone();
        self
    }

    pub fn calls(&self) -> CallLog {
        self.log.clone()
    }
}

#[async_trait]
impl AuthContext for MockModule {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        _service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        self.log.record(&self.id, Phase::ValidateRequest);
        for name in &self.principals {
            client_subject.add_principal(Principal::new(name.clone()));
        }
        let channel = context.side_channel_mut();
        if let Some(name) = self.principals.last().filter(|_| self.announce_principal) {
            channel.set_principal(name.clone());
        }
        if let Some(session_id) = &self.session_id {
            channel.set_session_id(session_id.clone());
        }
        channel.module_info.extend(self.info.clone());
        if let Some(reason) = &self.failure_reason {
            channel.set_failure_reason(reason.clone());
        }
        if let Some(status) = self.response_status {
            *context.response_mut().status_mut() = status;
        }
        self.validate.clone()
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        _service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        self.log.record(&self.id, Phase::SecureResponse);
        if let Some(session_id) = &self.session_id {
            context.side_channel_mut().set_session_id(session_id.clone());
        }
        if let Some(status) = self.response_status {
            *context.response_mut().status_mut() = status;
        }
        self.secure.clone()
    }

    async fn clean_subject(
        &self,
        _context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        self.log.record(&self.id, Phase::CleanSubject);
        match &self.clean_error {
            Some(message) => Err(ModuleError::new(message.clone()).into()),
            None => {
                client_subject.clear();
                Ok(())
            }
        }
    }
}

#[async_trait]
impl AuthModule for MockModule {
    fn module_id(&self) -> String {
        self.id.clone()
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        self.message_types.clone()
    }

    async fn initialize(
        &self,
        _request_policy: Option<&MessagePolicy>,
        _response_policy: Option<&MessagePolicy>,
        _handler: Option<Arc<dyn CallbackHandler>>,
        _options: &Map<String, Value>,
    ) -> AuthResult<()> {
        self.log.initialized.lock().unwrap().push(self.id.clone());
        match &self.init_error {
            Some(message) => Err(ModuleError::new(message.clone()).into()),
            None => Ok(()),
        }
    }
}

// ============================================================================
// RecordingLogger
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Debug,
    Error,
}

#[derive(Default)]
pub struct RecordingLogger {
    lines: Mutex<Vec<(Level, LogRecord)>>,
}

impl RecordingLogger {
    pub fn lines(&self) -> Vec<(Level, LogRecord)> {
        self.lines.lock().unwrap().clone()
    }
}

impl AuthLogger for RecordingLogger {
    fn debug(&self, record: &LogRecord) {
        self.lines.lock().unwrap().push((Level::Debug, record.clone()));
    }

    fn error(&self, record: &LogRecord) {
        self.lines.lock().unwrap().push((Level::Error, record.clone()));
    }
}
