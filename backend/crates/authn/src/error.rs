//! Authn Error Types
//!
//! This module provides pipeline-specific error variants that integrate
//! with the unified `kernel::error::AppError` system.

use std::error::Error;
use std::fmt;
use std::sync::Arc;

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use serde_json::{Value, json};
use thiserror::Error;

use crate::domain::outcome::{Outcome, Phase};

/// Authn-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

// ============================================================================
// AuthError
// ============================================================================

/// Pipeline error variants
///
/// Cloneable so that one initialization failure can be reported to every
/// request that observes it.
#[derive(Debug, Clone, Error)]
pub enum AuthError {
    /// A module returned an outcome that is illegal for the phase
    #[error("Invalid outcome returned from {phase}: {outcome}")]
    InvalidOutcome { phase: Phase, outcome: Outcome },

    /// Error raised by a module
    #[error(transparent)]
    Module(#[from] ModuleError),

    /// The caller sent something a module could not parse
    #[error("Malformed request: {0}")]
    MalformedRequest(String),

    /// `validate_request` ended in `ResponseFailure`
    #[error("Access Denied")]
    AuthenticationFailed,

    /// A module failed to initialize
    #[error("Failed to initialize auth module {module_id}: {message}")]
    Initialization { module_id: String, message: String },

    /// `secure_response` reached a fallback context that never authenticated
    #[error("No auth module authenticated the incoming request message")]
    NoModuleAuthenticated,

    /// One or more `clean_subject` calls failed
    #[error("Failed to clean subject: {}", .0.join("; "))]
    CleanSubject(Vec<String>),

    /// Module cannot process HTTP request/response pairs
    #[error("Auth module {module_id} does not support HTTP request/response messages")]
    UnsupportedMessageTypes { module_id: String },

    /// The audit sink rejected a document
    #[error("Failed to publish audit record: {0}")]
    Audit(String),
}

impl AuthError {
    /// Get the ErrorKind for this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            AuthError::Module(e) => e.kind().unwrap_or(ErrorKind::InternalServerError),
            AuthError::MalformedRequest(_) => ErrorKind::BadRequest,
            AuthError::AuthenticationFailed => ErrorKind::Unauthorized,
            AuthError::InvalidOutcome { .. }
            | AuthError::Initialization { .. }
            | AuthError::NoModuleAuthenticated
            | AuthError::CleanSubject(_)
            | AuthError::UnsupportedMessageTypes { .. }
            | AuthError::Audit(_) => ErrorKind::InternalServerError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Whether this error is a module contract violation
    pub fn is_protocol_error(&self) -> bool {
        matches!(self, AuthError::InvalidOutcome { .. })
    }

    /// Convert to AppError
    pub fn to_app_error(&self) -> AppError {
        let error = AppError::new(self.kind(), self.to_string());
        match self {
            AuthError::InvalidOutcome { phase, outcome } => error.with_detail(json!({
                "phase": phase.to_string(),
                "outcome": outcome.code(),
            })),
            AuthError::Module(e) => match e.detail() {
                Some(detail) => error.with_detail(detail.clone()),
                None => error,
            },
            AuthError::Initialization { module_id, .. }
            | AuthError::UnsupportedMessageTypes { module_id } => {
                error.with_detail(json!({ "moduleId": module_id }))
            }
            AuthError::CleanSubject(failures) => {
                error.with_detail(json!({ "failures": failures }))
            }
            _ => error,
        }
    }

    /// Log the error with appropriate level
    pub(crate) fn log(&self) {
        match self {
            AuthError::InvalidOutcome { phase, outcome } => {
                tracing::error!(%phase, %outcome, "Auth module broke the outcome protocol");
            }
            AuthError::Initialization { module_id, message } => {
                tracing::error!(module_id = %module_id, message = %message, "Auth module initialization failed");
            }
            AuthError::Module(e) if e.kind().is_none_or(|k| k.is_server_error()) => {
                tracing::error!(error = %e, "Auth module error");
            }
            AuthError::CleanSubject(failures) => {
                tracing::warn!(?failures, "Clean subject failed");
            }
            AuthError::AuthenticationFailed => {
                tracing::debug!("Authentication failed");
            }
            _ => {
                tracing::debug!(error = %self, "Authn error");
            }
        }
    }
}

/// Plain JSON rendering, without content negotiation
impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<AppError> for AuthError {
    fn from(err: AppError) -> Self {
        AuthError::Module(ModuleError::new(err.message().to_string()).with_kind(err.kind()))
    }
}

// ============================================================================
// ModuleError
// ============================================================================

/// Error raised by an auth module
///
/// The message is what gets audited and rendered. An optional [`ErrorKind`]
/// overrides the default `500`, and an optional cause is exposed through
/// [`Error::source`].
#[derive(Debug, Clone)]
pub struct ModuleError {
    message: String,
    kind: Option<ErrorKind>,
    detail: Option<Value>,
    source: Option<Arc<dyn Error + Send + Sync>>,
}

impl ModuleError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            kind: None,
            detail: None,
            source: None,
        }
    }

    pub fn with_kind(mut self, kind: ErrorKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = Some(detail);
        self
    }

    pub fn with_source<E>(mut self, source: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.source = Some(Arc::new(source));
        self
    }

    /// Attach an already type-erased cause
    pub fn with_shared_source(mut self, source: Arc<dyn Error + Send + Sync>) -> Self {
        self.source = Some(source);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        self.kind
    }

    pub fn detail(&self) -> Option<&Value> {
        self.detail.as_ref()
    }
}

impl fmt::Display for ModuleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl Error for ModuleError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn Error + 'static))
    }
}
