//! Audit Sink Implementations

use std::sync::Mutex;

use serde_json::Value;

use crate::domain::audit_api::AuditApi;
use crate::error::{AuthError, AuthResult};

/// Emits every audit document as an `info` event on the `audit` target
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingAuditApi;

impl TracingAuditApi {
    pub fn new() -> Self {
        Self
    }
}

impl AuditApi for TracingAuditApi {
    async fn audit(&self, record: Value) -> AuthResult<()> {
        let request_id = record
            .get("requestId")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let result = record
            .get("result")
            .and_then(Value::as_str)
            .unwrap_or_default();
        tracing::info!(
            target: "audit",
            request_id = %request_id,
            result = %result,
            record = %record,
            "Authentication audit"
        );
        Ok(())
    }
}

/// Keeps audit documents in memory
#[derive(Debug, Default)]
pub struct InMemoryAuditApi {
    records: Mutex<Vec<Value>>,
    fail: bool,
}

impl InMemoryAuditApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink that rejects every document
    pub fn failing() -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            fail: true,
        }
    }

    /// Documents received so far, in arrival order
    pub fn records(&self) -> Vec<Value> {
        self.records
            .lock()
            .map(|records| records.clone())
            .unwrap_or_default()
    }
}

impl AuditApi for InMemoryAuditApi {
    async fn audit(&self, record: Value) -> AuthResult<()> {
        if self.fail {
            return Err(AuthError::Audit("audit sink unavailable".to_string()));
        }
        let mut records = self
            .records
            .lock()
            .map_err(|_| AuthError::Audit("audit sink poisoned".to_string()))?;
        records.push(record);
        Ok(())
    }
}
