//! Auth Context Traits
//!
//! The asynchronous three-phase contract every module, decorator and
//! composition strategy implements. The traits are object safe so that
//! contexts can be stored as `Arc<dyn AuthContext>` and nested without
//! naming their concrete types.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::message_context::MessageContext;
use super::outcome::Outcome;
use super::subject::Subject;
use crate::error::{AuthResult, ModuleError};

// ============================================================================
// AuthContext
// ============================================================================

/// Something that can authenticate a request/response pair
#[async_trait]
pub trait AuthContext: Send + Sync {
    /// Establish the caller's identity, adding principals to
    /// `client_subject`
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome>;

    /// Secure the response produced by the protected resource
    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome>;

    /// Remove whatever `validate_request` added to `client_subject`
    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()>;
}

// ============================================================================
// AuthModule
// ============================================================================

/// Kind of message a module can process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageType {
    HttpRequest,
    HttpResponse,
}

/// Whether a module must produce a result for its message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessagePolicy {
    pub mandatory: bool,
}

impl MessagePolicy {
    pub const fn mandatory() -> Self {
        Self { mandatory: true }
    }

    pub const fn optional() -> Self {
        Self { mandatory: false }
    }
}

/// Information a module may request from the host during processing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Callback {
    /// Host-side principal name for the caller
    CallerPrincipal(Option<String>),
    /// Groups the caller belongs to
    GroupPrincipals(Vec<String>),
}

/// Host hook answering module callbacks
pub trait CallbackHandler: Send + Sync {
    fn handle(&self, callbacks: &mut [Callback]) -> Result<(), ModuleError>;
}

/// A pluggable authentication module
#[async_trait]
pub trait AuthModule: AuthContext {
    /// Identifier used in audit entries and logs
    fn module_id(&self) -> String;

    fn supported_message_types(&self) -> Vec<MessageType> {
        vec![MessageType::HttpRequest, MessageType::HttpResponse]
    }

    /// Called once before the first request is processed
    async fn initialize(
        &self,
        _request_policy: Option<&MessagePolicy>,
        _response_policy: Option<&MessagePolicy>,
        _handler: Option<Arc<dyn CallbackHandler>>,
        _options: &Map<String, Value>,
    ) -> AuthResult<()> {
        Ok(())
    }
}

/// Whether `module` can process HTTP request/response pairs
pub fn supports_http<M: AuthModule + ?Sized>(module: &M) -> bool {
    let types = module.supported_message_types();
    types.contains(&MessageType::HttpRequest) && types.contains(&MessageType::HttpResponse)
}

// ============================================================================
// Shared contexts
// ============================================================================

#[async_trait]
impl<T: AuthContext + ?Sized> AuthContext for Arc<T> {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        (**self)
            .validate_request(context, client_subject, service_subject)
            .await
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        (**self).secure_response(context, service_subject).await
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        (**self).clean_subject(context, client_subject).await
    }
}

#[async_trait]
impl<T: AuthModule + ?Sized> AuthModule for Arc<T> {
    fn module_id(&self) -> String {
        (**self).module_id()
    }

    fn supported_message_types(&self) -> Vec<MessageType> {
        (**self).supported_message_types()
    }

    async fn initialize(
        &self,
        request_policy: Option<&MessagePolicy>,
        response_policy: Option<&MessagePolicy>,
        handler: Option<Arc<dyn CallbackHandler>>,
        options: &Map<String, Value>,
    ) -> AuthResult<()> {
        (**self)
            .initialize(request_policy, response_policy, handler, options)
            .await
    }
}
