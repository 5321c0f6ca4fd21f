//! Authentication Middleware
//!
//! Runs the authentication pipeline in front of an axum router.
//!
//! ```ignore
//! let app = Router::new()
//!     .route("/whoami", get(whoami))
//!     .layer(middleware::from_fn_with_state(filter, authenticate));
//! ```

use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::application::filter::AuthenticationFilter;
use crate::domain::audit_api::AuditApi;

pub use crate::domain::authenticated_request::AuthenticatedRequest;

/// Middleware that authenticates every request before it reaches `next`
pub async fn authenticate<A>(
    State(filter): State<AuthenticationFilter<A>>,
    req: Request<Body>,
    next: Next,
) -> Response
where
    A: AuditApi + Send + Sync + 'static,
{
    filter
        .process_message(req, |req| next.run(req))
        .await
}
