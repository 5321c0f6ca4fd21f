//! Infrastructure Layer
//!
//! Audit sink implementations.

pub mod audit;

pub use audit::{InMemoryAuditApi, TracingAuditApi};
