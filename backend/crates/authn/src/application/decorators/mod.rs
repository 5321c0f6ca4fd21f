//! Decorators
//!
//! Cross-cutting behaviour wrapped around modules and composed contexts.
//! Each decorator holds the wrapped capability and is itself an
//! [`AuthContext`](crate::domain::AuthContext), and an
//! [`AuthModule`](crate::domain::AuthModule) whenever the wrapped value is.

/// Forward the module methods to `self.inner`
macro_rules! delegate_auth_module {
    ($decorator:ident) => {
        #[async_trait::async_trait]
        impl<M> $crate::domain::auth_context::AuthModule for $decorator<M>
        where
            M: $crate::domain::auth_context::AuthModule,
        {
            fn module_id(&self) -> String {
                self.inner.module_id()
            }

            fn supported_message_types(
                &self,
            ) -> Vec<$crate::domain::auth_context::MessageType> {
                self.inner.supported_message_types()
            }

            async fn initialize(
                &self,
                request_policy: Option<&$crate::domain::auth_context::MessagePolicy>,
                response_policy: Option<&$crate::domain::auth_context::MessagePolicy>,
                handler: Option<
                    std::sync::Arc<dyn $crate::domain::auth_context::CallbackHandler>,
                >,
                options: &serde_json::Map<String, serde_json::Value>,
            ) -> $crate::error::AuthResult<()> {
                self.inner
                    .initialize(request_policy, response_policy, handler, options)
                    .await
            }
        }
    };
}

pub mod auditing;
pub mod logger;
pub mod logging;
pub mod session_auditing;
pub mod validating;

pub use auditing::{ContextAuditing, ModuleAuditing};
pub use logger::{AuthLogger, LogRecord, TracingLogger};
pub use logging::Logging;
pub use session_auditing::SessionAuditing;
pub use validating::Validating;
