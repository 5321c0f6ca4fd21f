//! Application Configuration
//!
//! Configuration for the authentication filter and its modules.

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::domain::auth_context::{CallbackHandler, MessagePolicy};

/// Filter-wide configuration
#[derive(Debug, Clone)]
pub struct AuthnConfig {
    /// Name reported in log fields
    pub name: String,
    /// Header carrying an upstream transaction id
    pub transaction_id_header: String,
    /// Whether error responses include structured detail
    pub include_error_detail: bool,
}

impl Default for AuthnConfig {
    fn default() -> Self {
        Self {
            name: "AuthenticationFilter".to_string(),
            transaction_id_header: "x-transaction-id".to_string(),
            include_error_detail: false,
        }
    }
}

impl AuthnConfig {
    /// Create config for development (error detail rendered)
    pub fn development() -> Self {
        Self {
            include_error_detail: true,
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

/// Arguments handed to a module's `initialize`
#[derive(Clone, Default)]
pub struct ModuleConfig {
    pub request_policy: Option<MessagePolicy>,
    pub response_policy: Option<MessagePolicy>,
    pub callback_handler: Option<Arc<dyn CallbackHandler>>,
    pub options: Map<String, Value>,
}

impl ModuleConfig {
    pub fn new() -> Self {
        Self {
            request_policy: Some(MessagePolicy::mandatory()),
            response_policy: Some(MessagePolicy::optional()),
            ..Default::default()
        }
    }

    pub fn with_option(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.options.insert(key.into(), value.into());
        self
    }

    pub fn with_callback_handler(mut self, handler: Arc<dyn CallbackHandler>) -> Self {
        self.callback_handler = Some(handler);
        self
    }
}

impl fmt::Debug for ModuleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleConfig")
            .field("request_policy", &self.request_policy)
            .field("response_policy", &self.response_policy)
            .field("callback_handler", &self.callback_handler.is_some())
            .field("options", &self.options)
            .finish()
    }
}
