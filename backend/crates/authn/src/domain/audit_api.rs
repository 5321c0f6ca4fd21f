//! Audit Sink Trait
//!
//! Interface for publishing audit documents. Implementations are in the
//! infrastructure layer.

use serde_json::Value;

use crate::error::AuthResult;

/// Destination for completed audit documents
///
/// Shared by every in-flight request, so implementations must tolerate
/// concurrent calls.
#[trait_variant::make(AuditApi: Send)]
pub trait LocalAuditApi {
    /// Publish one audit document
    async fn audit(&self, record: Value) -> AuthResult<()>;
}
