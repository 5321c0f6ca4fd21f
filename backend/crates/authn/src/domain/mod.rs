//! Domain Layer
//!
//! Contains the outcome vocabulary, the request-scoped carriers and the
//! phase traits.

pub mod audit_api;
pub mod audit_trail;
pub mod authenticated_request;
pub mod auth_context;
pub mod message_context;
pub mod outcome;
pub mod side_channel;
pub mod subject;

// Re-exports
pub use audit_api::{AuditApi, LocalAuditApi};
pub use audit_trail::{AuditDocument, AuditEntry, AuditResult, AuditTrail};
pub use authenticated_request::AuthenticatedRequest;
pub use auth_context::{
    AuthContext, AuthModule, Callback, CallbackHandler, MessagePolicy, MessageType, supports_http,
};
pub use message_context::MessageContext;
pub use outcome::{Outcome, Phase};
pub use side_channel::SideChannel;
pub use subject::{Principal, Subject};
