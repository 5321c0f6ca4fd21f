//! Authn (Authentication Pipeline) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Outcome vocabulary, request-scoped carriers, phase traits
//! - `application/` - Decorators, composition strategies, orchestrator
//! - `infra/` - Audit sink implementations
//! - `presentation/` - Response negotiation, axum middleware
//!
//! ## Request flow
//! 1. `validate_request` on the composed context (session module first,
//!    then the auth modules in order)
//! 2. the protected handler, when the request authenticated
//! 3. `secure_response` on the handler's response
//! 4. `clean_subject`, exactly once
//!
//! Each module's conclusion lands in the request's audit trail, which is
//! published to the [`AuditApi`](domain::AuditApi) once validation ends.

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod test_support;
#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::{AuthnConfig, ModuleConfig};
pub use application::filter::{AuthenticationFilter, AuthenticationFilterBuilder};
pub use domain::{AuthContext, AuthModule, AuthenticatedRequest, MessageContext, Outcome, Subject};
pub use error::{AuthError, AuthResult, ModuleError};
pub use presentation::middleware::authenticate;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
