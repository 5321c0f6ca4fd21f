//! Presentation Layer
//!
//! Response negotiation and the axum middleware.

pub mod middleware;
pub mod negotiation;

pub use middleware::{AuthenticatedRequest, authenticate};
pub use negotiation::{JsonResponseWriter, ResponseHandler, ResponseWriter, XmlResponseWriter};
