//! Two-tier aggregate: session tier, then request tier
//!
//! The request tier only runs when the session tier answers
//! `ResponseFailure`. On the way out the request tier secures the response
//! first when it authenticated, then hands over to the session tier if it
//! answered `ResponseAuthenticated` (typically to issue a session).

use async_trait::async_trait;
use kernel::id::ContextId;

use super::{clean_result, push_clean_failure};
use crate::domain::auth_context::AuthContext;
use crate::domain::message_context::MessageContext;
use crate::domain::outcome::Outcome;
use crate::domain::subject::Subject;
use crate::error::AuthResult;

#[derive(Debug, Default)]
struct AggregateState {
    request_authenticated: bool,
}

pub struct AggregateContext<S, R> {
    id: ContextId,
    session: S,
    request: R,
}

impl<S, R> AggregateContext<S, R> {
    pub fn new(session: S, request: R) -> Self {
        Self {
            id: ContextId::new(),
            session,
            request,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn request(&self) -> &R {
        &self.request
    }
}

#[async_trait]
impl<S: AuthContext, R: AuthContext> AuthContext for AggregateContext<S, R> {
    async fn validate_request(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let outcome = self
            .session
            .validate_request(context, client_subject, service_subject)
            .await?;
        if outcome != Outcome::ResponseFailure {
            return Ok(outcome);
        }

        let outcome = self
            .request
            .validate_request(context, client_subject, service_subject)
            .await?;
        if outcome.is_authenticated() {
            context.state::<AggregateState>(self.id).request_authenticated = true;
        }
        Ok(outcome)
    }

    async fn secure_response(
        &self,
        context: &mut MessageContext,
        service_subject: &Subject,
    ) -> AuthResult<Outcome> {
        let request_authenticated = context
            .existing_state::<AggregateState>(self.id)
            .is_some_and(|state| state.request_authenticated);
        if !request_authenticated {
            return self.session.secure_response(context, service_subject).await;
        }

        let outcome = self.request.secure_response(context, service_subject).await?;
        if outcome == Outcome::ResponseAuthenticated {
            self.session.secure_response(context, service_subject).await
        } else {
            Ok(outcome)
        }
    }

    async fn clean_subject(
        &self,
        context: &mut MessageContext,
        client_subject: &mut Subject,
    ) -> AuthResult<()> {
        let mut failures = Vec::new();
        if let Err(e) = self.session.clean_subject(context, client_subject).await {
            push_clean_failure(&mut failures, e);
        }
        if let Err(e) = self.request.clean_subject(context, client_subject).await {
            push_clean_failure(&mut failures, e);
        }
        clean_result(failures)
    }
}
