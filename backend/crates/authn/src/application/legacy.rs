//! Legacy Module Adapter
//!
//! Runs synchronous, error-returning modules behind the asynchronous
//! [`AuthContext`] / [`AuthModule`] contract.
//!
//! - `Ok(Some(outcome))` resolves to the same outcome
//! - `Ok(None)` resolves to [`Outcome::ProtocolError`]
//! - `Err(e)` fails with [`AuthError::Module`] carrying the same message and
//!   the same cause (if any)

use std::any::type_name;
use std::error::Error;
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use http::{Request, Response};
use serde_json::{Map, Value};

use crate::domain::auth_context::{
    AuthContext, AuthModule, CallbackHandler, MessagePolicy, MessageType,
};
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::Outcome;
use crate::domain::side_channel::SideChannel;
use crate::domain::subject::Subject;
use crate::error::{AuthError, AuthResult, ModuleError};

// ============================================================================
// Legacy contract
// ============================================================================

/// Error returned by a legacy module
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct LegacyError {
    message: String,
    #[source]
    cause: Option<Box<dyn Error + Send + Sync>>,
}

impl LegacyError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            cause: None,
        }
    }

    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: Error + Send + Sync + 'static,
    {
        self.cause = Some(Box::new(cause));
        self
    }
}

impl From<LegacyError> for AuthError {
    fn from(err: LegacyError) -> Self {
        let module_error = ModuleError::new(err.message);
        let module_error = match err.cause {
            Some(cause) => module_error.with_shared_source(Arc::from(cause)),
            None => module_error,
        };
        AuthError::Module(module_error)
    }
}

/// Synchronous view of a [`MessageContext`]
pub struct MessageInfo<'a> {
    context: &'a mut MessageContext,
}

impl<'a> MessageInfo<'a> {
    pub fn new(context: &'a mut MessageContext) -> Self {
        Self { context }
    }

    pub fn request(&self) -> &Request<Body> {
        self.context.request()
    }

    pub fn request_mut(&mut self) -> &mut Request<Body> {
        self.context.request_mut()
    }

    pub fn set_request(&mut self, request: Request<Body>) {
        self.context.set_request(request);
    }

    pub fn response(&self) -> &Response<Body> {
        self.context.response()
    }

    pub fn response_mut(&mut self) -> &mut Response<Body> {
        self.context.response_mut()
    }

    pub fn set_response(&mut self, response: Response<Body>) {
        self.context.set_response(response);
    }

    /// Audit metadata shared with the decorators
    pub fn map(&mut self) -> &mut SideChannel {
        self.context.side_channel_mut()
    }
}

/// Synchronous counterpart of [`AuthContext`]
pub trait LegacyAuthContext: Send + Sync {
    fn validate_request(
        &self,
        message_info: &mut MessageInfo<'_>,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> Result<Option<Outcome>, LegacyError>;

    fn secure_response(
        &self,
        message_info: &mut MessageInfo<'_>,
        service_subject: &Subject,
    ) -> Result<Option<Outcome>, LegacyError>;

    fn clean_subject(
        &self,
        message_info: &mut MessageInfo<'_>,
        client_subject: &mut Subject,
    ) -> Result<(), LegacyError>;
}

/// Synchronous counterpart of [`AuthModule`]
pub trait LegacyAuthModule: LegacyAuthContext {
    /// `None` falls back to the module's type name
    fn module_id(&self) -> Option<String> {
        None
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        vec![MessageType::HttpRequest, MessageType::HttpResponse]
    }

    fn initialize(
        &self,
        request_policy: Option<&MessagePolicy>,
        response_policy: Option<&MessagePolicy>,
        handler: Option<Arc<dyn CallbackHandler>>,
        options: &Map<String, Value>,
    ) -> Result<(), LegacyError> {
        let _ = (request_policy, response_policy, handler, options);
        Ok(())
    }
}

// ============================================================================
// Adapter
// ============================================================================

/// Async wrapper around a legacy context or module
pub struct LegacyAdapter<T> {
    inner: T,
}

/// Adapt a legacy context
pub fn adapt_context<C: LegacyAuthContext>(context: C) -> LegacyAdapter<C> {
    LegacyAdapter { inner: context }
}

/// Adapt a legacy module
pub fn adapt_module<M: LegacyAuthModule>(module: M) -> LegacyAdapter<M> {
    LegacyAdapter { inner: module }
}

impl<T> LegacyAdapter<T> {
    pub fn inner(&self) -> &T {
        &self.inner
    }
}

#[async_trait]
impl<T: LegacyAuthContext> AuthContext for LegacyAdapter<T> {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let mut info = MessageInfo::new(context);
        let outcome = self
            .inner
            .validate_request(&mut info, client_subject, service_subject)?;
        Ok(Outcome::from(outcome))
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let mut info = MessageInfo::new(context);
        let outcome = self.inner.secure_response(&mut info, service_subject)?;
        Ok(Outcome::from(outcome))
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        let mut info = MessageInfo::new(context);
        self.inner.clean_subject(&mut info, client_subject)?;
        Ok(())
    }
}

#[async_trait]
impl<T: LegacyAuthModule> AuthModule for LegacyAdapter<T> {
    fn module_id(&self) -> String {
        self.inner
            .module_id()
            .unwrap_or_else(|| type_name::<T>().to_string())
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
        self.inner
            .initialize(request_policy, response_policy, handler, options)?;
        Ok(())
    }
}
