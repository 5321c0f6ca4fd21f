//! Authentication Framework
//!
//! Drives one request through the composed auth context:
//!
//! 1. wait for module initialization (shared, run once)
//! 2. `validate_request`, then the downstream handler on success
//! 3. `secure_response` on the handler's response
//! 4. `clean_subject`, exactly once, whatever happened in 2 and 3
//!
//! Every failure is turned into a negotiated error response, so callers
//! never observe an error.

use std::future::Future;
use std::sync::Arc;

use axum::body::Body;
use http::{Request, Response, StatusCode};
use kernel::id::TransactionId;
use tokio::sync::OnceCell;
use tracing::Instrument;

use super::config::{AuthnConfig, ModuleConfig};
use super::decorators::{AuthLogger, ContextAuditing, Logging, Validating};
use crate::domain::audit_api::AuditApi;
use crate::domain::auth_context::{AuthContext, AuthModule};
use crate::domain::authenticated_request::AuthenticatedRequest;
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::{Outcome, Phase};
use crate::domain::subject::Subject;
use crate::error::{AuthError, AuthResult};
use crate::presentation::negotiation::ResponseHandler;

type ComposedContext<A> = Validating<ContextAuditing<Logging<Arc<dyn AuthContext>>, A>>;

/// How `validate_request` ended for the orchestrator
enum Validation {
    /// The downstream handler ran; go on to `secure_response`
    Proceed,
    /// The response in the context is final
    Respond,
}

pub struct AuthenticationFramework<A> {
    config: Arc<AuthnConfig>,
    context: ComposedContext<A>,
    response_handler: ResponseHandler,
    service_subject: Subject,
    modules: Vec<(Arc<dyn AuthModule>, ModuleConfig)>,
    initialization: OnceCell<AuthResult<()>>,
}

impl<A> AuthenticationFramework<A>
where
    A: AuditApi + Send + Sync + 'static,
{
    pub fn new(
        config: AuthnConfig,
        context: Arc<dyn AuthContext>,
        audit_api: Arc<A>,
        logger: Arc<dyn AuthLogger>,
        response_handler: ResponseHandler,
        service_subject: Subject,
        modules: Vec<(Arc<dyn AuthModule>, ModuleConfig)>,
    ) -> Self {
        let response_handler = if config.include_error_detail {
            response_handler.include_detail(true)
        } else {
            response_handler
        };
        let context = Validating::new(ContextAuditing::new(
            Logging::context(context, config.name.clone(), logger),
            audit_api,
        ));
        Self {
            config: Arc::new(config),
            context,
            response_handler,
            service_subject,
            modules,
            initialization: OnceCell::new(),
        }
    }

    pub fn config(&self) -> &AuthnConfig {
        &self.config
    }

    /// Initialize every module once. Later calls return the first result.
    pub async fn initialize(&self) -> AuthResult<()> {
        self.initialization
            .get_or_init(|| self.initialize_modules())
            .await
            .clone()
    }

    async fn initialize_modules(&self) -> AuthResult<()> {
        for (module, config) in &self.modules {
            module
                .initialize(
                    config.request_policy.as_ref(),
                    config.response_policy.as_ref(),
                    config.callback_handler.clone(),
                    &config.options,
                )
                .await
                .map_err(|e| AuthError::Initialization {
                    module_id: module.module_id(),
                    message: e.to_string(),
                })?;
        }
        Ok(())
    }

    /// Authenticate `request`, hand it to `next` and secure the response
    pub async fn process_message<F, Fut>(&self, request: Request<Body>, next: F) -> Response<Body>
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response<Body>>,
    {
        if let Err(error) = self.initialize().await {
            error.log();
            return self
                .response_handler
                .render(request.headers(), &error.to_app_error());
        }

        let transaction_id =
            platform::headers::transaction_id(request.headers(), &self.config.transaction_id_header)
                .map(str::to_string)
                .unwrap_or_else(|| TransactionId::new().to_string());
        let mut context = MessageContext::new(request, transaction_id);

        let span = tracing::debug_span!(
            "authenticate",
            filter = %self.config.name,
            request_id = %context.request_id(),
            transaction_id = %context.transaction_id(),
        );

        async move {
            let mut client_subject = Subject::new();

            if let Validation::Proceed = self
                .validate(&mut context, &mut client_subject, next)
                .await
            {
                self.secure(&mut context).await;
            }

            if let Err(e) = self
                .context
                .clean_subject(&mut context, &mut client_subject)
                .await
            {
                e.log();
            }

            context.take_response()
        }
        .instrument(span)
        .await
    }

    async fn validate<F, Fut>(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        next: F,
    ) -> Validation
    where
        F: FnOnce(Request<Body>) -> Fut,
        Fut: Future<Output = Response<Body>>,
    {
        let result = self
            .context
            .validate_request(context, client_subject, &self.service_subject)
            .await;

        match result {
            Ok(outcome @ (Outcome::Authenticated | Outcome::ResponseAuthenticated)) => {
                if outcome == Outcome::Authenticated {
                    let authenticated = AuthenticatedRequest {
                        request_id: context.request_id(),
                        principal: client_subject.last_principal().map(|p| p.name().to_string()),
                        context: context.side_channel().attributes.clone(),
                    };
                    context.request_mut().extensions_mut().insert(authenticated);
                }
                let response = next(context.take_request()).await;
                context.set_response(response);
                Validation::Proceed
            }
            Ok(Outcome::ResponseIncomplete) => Validation::Respond,
            Ok(Outcome::ResponseFailure) => {
                let error = AuthError::AuthenticationFailed;
                error.log();
                self.write_error(context, &error);
                Validation::Respond
            }
            Ok(outcome) => {
                let error = AuthError::InvalidOutcome {
                    phase: Phase::ValidateRequest,
                    outcome,
                };
                error.log();
                self.write_error(context, &error);
                Validation::Respond
            }
            Err(error) => {
                error.log();
                self.write_error(context, &error);
                Validation::Respond
            }
        }
    }

    async fn secure(&self, context: &mut MessageContext) {
        let result = self
            .context
            .secure_response(context, &self.service_subject)
            .await;

        match result {
            Ok(Outcome::ResponseAuthenticated | Outcome::ResponseIncomplete) => {}
            Ok(Outcome::ResponseFailure) => {
                tracing::debug!("Securing response failed");
                *context.response_mut().status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
            }
            Ok(outcome) => {
                let error = AuthError::InvalidOutcome {
                    phase: Phase::SecureResponse,
                    outcome,
                };
                error.log();
                self.write_error(context, &error);
            }
            Err(error) => {
                error.log();
                self.write_error(context, &error);
            }
        }
    }

    /// Negotiated error written over the current response, keeping headers
    /// the modules already set
    fn write_error(&self, context: &mut MessageContext, error: &AuthError) {
        let app_error = error.to_app_error();
        let headers = context.request().headers().clone();
        self.response_handler
            .write(&headers, context.response_mut(), &app_error);
    }
}
