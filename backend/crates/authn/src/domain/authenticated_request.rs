//! Authenticated request extension

use kernel::id::RequestId;
use serde_json::{Map, Value};

/// Inserted into the request extensions once `validate_request` returned
/// `Authenticated`, so downstream handlers can see who called
#[derive(Debug, Clone)]
pub struct AuthenticatedRequest {
    pub request_id: RequestId,
    pub principal: Option<String>,
    pub context: Map<String, Value>,
}

impl AuthenticatedRequest {
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref()
    }
}
