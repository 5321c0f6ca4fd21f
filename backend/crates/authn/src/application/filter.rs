//! Authentication Filter
//!
//! Assembles the module stack and owns the resulting
//! [`AuthenticationFramework`].
//!
//! ```text
//! Aggregate
//! ├── Session(Validating(SessionAuditing(Logging(session module))))
//! └── Fallback[Validating(ModuleAuditing(Logging(auth module))), ...]
//! ```

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use http::{Request, Response};

use super::config::{AuthnConfig, ModuleConfig};
use super::contexts::{AggregateContext, FallbackContext, SessionContext};
use super::decorators::{
    AuthLogger, Logging, ModuleAuditing, SessionAuditing, TracingLogger, Validating,
};
use super::framework::AuthenticationFramework;
use crate::domain::audit_api::AuditApi;
use crate::domain::auth_context::{AuthModule, supports_http};
use crate::domain::subject::Subject;
use crate::error::{AuthError, AuthResult};
use crate::infra::audit::TracingAuditApi;
use crate::presentation::negotiation::{ResponseHandler, ResponseWriter};

/// Cloneable handle on a configured pipeline
pub struct AuthenticationFilter<A = TracingAuditApi> {
    framework: Arc<AuthenticationFramework<A>>,
}

impl<A> Clone for AuthenticationFilter<A> {
    fn clone(&self) -> Self {
        Self {
            framework: Arc::clone(&self.framework),
        }
    }
}

impl AuthenticationFilter {
    pub fn builder() -> AuthenticationFilterBuilder {
        AuthenticationFilterBuilder::new()
    }
}

impl<A> AuthenticationFilter<A>
where
    A: AuditApi + Send + Sync + 'static,
{
    pub fn framework(&self) -> &AuthenticationFramework<A> {
        &self.framework
    }

    /// Initialize the modules ahead of the first request
    pub async fn initialize(&self) -> AuthResult<()> {
        self.framework.initialize().await
    }

    pub async fn process_message<F, Fut>(&self, request: Request<Body>, next: F) -> Response<Body>
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response<Body>>,
    {
        self.framework.process_message(request, next).await
    }
}

// ============================================================================
// Builder
// ============================================================================

pub struct AuthenticationFilterBuilder<A = TracingAuditApi> {
    config: AuthnConfig,
    session_module: Option<(Arc<dyn AuthModule>, ModuleConfig)>,
    auth_modules: Vec<(Arc<dyn AuthModule>, ModuleConfig)>,
    response_handler: ResponseHandler,
    audit_api: Arc<A>,
    logger: Arc<dyn AuthLogger>,
    service_subject: Subject,
}

impl Default for AuthenticationFilterBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthenticationFilterBuilder {
    pub fn new() -> Self {
        Self {
            config: AuthnConfig::default(),
            session_module: None,
            auth_modules: Vec::new(),
            response_handler: ResponseHandler::new(),
            audit_api: Arc::new(TracingAuditApi::new()),
            logger: Arc::new(TracingLogger),
            service_subject: Subject::new(),
        }
    }
}

impl<A> AuthenticationFilterBuilder<A>
where
    A: AuditApi + Send + Sync + 'static,
{
    pub fn config(mut self, config: AuthnConfig) -> Self {
        self.config = config;
        self
    }

    /// Module consulted first, typically one that recognises an existing
    /// session
    pub fn session_module(
        mut self,
        module: impl AuthModule + 'static,
        config: ModuleConfig,
    ) -> Self {
        self.session_module = Some((Arc::new(module), config));
        self
    }

    /// Module tried, in registration order, when the session module did
    /// not answer
    pub fn auth_module(mut self, module: impl AuthModule + 'static, config: ModuleConfig) -> Self {
        self.auth_modules.push((Arc::new(module), config));
        self
    }

    pub fn auth_modules<I, M>(mut self, modules: I) -> Self
    where
        I: IntoIterator<Item = (M, ModuleConfig)>,
        M: AuthModule + 'static,
    {
        self.auth_modules.extend(
            modules
                .into_iter()
                .map(|(module, config)| (Arc::new(module) as Arc<dyn AuthModule>, config)),
        );
        self
    }

    pub fn response_handler(mut self, response_handler: ResponseHandler) -> Self {
        self.response_handler = response_handler;
        self
    }

    /// Register a writer ahead of the default JSON writer
    pub fn response_writer(mut self, writer: impl ResponseWriter + 'static) -> Self {
        self.response_handler = self.response_handler.with_writer(writer);
        self
    }

    pub fn audit_api<B>(self, audit_api: B) -> AuthenticationFilterBuilder<B>
    where
        B: AuditApi + Send + Sync + 'static,
    {
        self.shared_audit_api(Arc::new(audit_api))
    }

    pub fn shared_audit_api<B>(self, audit_api: Arc<B>) -> AuthenticationFilterBuilder<B>
    where
        B: AuditApi + Send + Sync + 'static,
    {
        AuthenticationFilterBuilder {
            config: self.config,
            session_module: self.session_module,
            auth_modules: self.auth_modules,
            response_handler: self.response_handler,
            audit_api,
            logger: self.logger,
            service_subject: self.service_subject,
        }
    }

    pub fn logger(mut self, logger: Arc<dyn AuthLogger>) -> Self {
        self.logger = logger;
        self
    }

    pub fn service_subject(mut self, service_subject: Subject) -> Self {
        self.service_subject = service_subject;
        self
    }

    /// Wrap and compose the modules
    ///
    /// Fails with [`AuthError::UnsupportedMessageTypes`] when a module
    /// cannot process HTTP request/response pairs.
    pub fn build(self) -> AuthResult<AuthenticationFilter<A>> {
        let mut modules: Vec<(Arc<dyn AuthModule>, ModuleConfig)> = Vec::new();

        let session = match self.session_module {
            Some((module, config)) => {
                ensure_http(module.as_ref())?;
                let wrapped: Arc<dyn AuthModule> = Arc::new(Validating::new(SessionAuditing::new(
                    Logging::module(module, Arc::clone(&self.logger)),
                )));
                modules.push((Arc::clone(&wrapped), config));
                Some(wrapped)
            }
            None => None,
        };

        let mut auth_modules = Vec::with_capacity(self.auth_modules.len());
        for (module, config) in self.auth_modules {
            ensure_http(module.as_ref())?;
            let wrapped: Arc<dyn AuthModule> = Arc::new(Validating::new(ModuleAuditing::new(
                Logging::module(module, Arc::clone(&self.logger)),
            )));
            modules.push((Arc::clone(&wrapped), config));
            auth_modules.push(wrapped);
        }

        tracing::debug!(
            filter = %self.config.name,
            session_module = ?session.as_ref().map(|m| m.module_id()),
            auth_modules = ?auth_modules.iter().map(|m| m.module_id()).collect::<Vec<_>>(),
            "Authentication filter configured"
        );

        let context = AggregateContext::new(
            SessionContext::new(session),
            FallbackContext::new(auth_modules),
        );

        let framework = AuthenticationFramework::new(
            self.config,
            Arc::new(context),
            self.audit_api,
            self.logger,
            self.response_handler,
            self.service_subject,
            modules,
        );

        Ok(AuthenticationFilter {
            framework: Arc::new(framework),
        })
    }
}

fn ensure_http(module: &dyn AuthModule) -> AuthResult<()> {
    if supports_http(module) {
        Ok(())
    } else {
        Err(AuthError::UnsupportedMessageTypes {
            module_id: module.module_id(),
        })
    }
}
