//! Audit Trail
//!
//! Per-request record of what every module concluded, completed once with
//! the overall result and rendered as the audit document:
//!
//! ```json
//! {
//!   "requestId": "...",
//!   "transactionId": "...",
//!   "context": {},
//!   "entries": [{ "moduleId": "...", "result": "FAILED", "reason": {}, "info": {} }],
//!   "result": "SUCCESSFUL",
//!   "principal": ["alice"],
//!   "sessionId": "..."
//! }
//! ```
//!
//! `entries`, `result`, `principal` and `sessionId` only appear once the
//! corresponding data was recorded.

use derive_more::Display;
use kernel::id::RequestId;
use serde::Serialize;
use serde_json::{Map, Value};

// ============================================================================
// Entries
// ============================================================================

/// Result of an entry or of the whole request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditResult {
    #[display("SUCCESSFUL")]
    Successful,
    #[display("FAILED")]
    Failed,
}

/// What one module concluded
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditEntry {
    pub module_id: String,
    pub result: AuditResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<Map<String, Value>>,
    pub info: Map<String, Value>,
}

/// Serialized form flushed to the audit sink
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuditDocument {
    pub request_id: String,
    pub transaction_id: String,
    pub context: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub entries: Vec<AuditEntry>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AuditResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub principal: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

// ============================================================================
// AuditTrail
// ============================================================================

#[derive(Debug, Clone)]
pub struct AuditTrail {
    request_id: RequestId,
    transaction_id: String,
    context: Map<String, Value>,
    entries: Vec<AuditEntry>,
    result: Option<AuditResult>,
    principals: Option<Vec<String>>,
    session_id: Option<String>,
}

impl AuditTrail {
    pub fn new(request_id: RequestId, transaction_id: impl Into<String>) -> Self {
        Self {
            request_id,
            transaction_id: transaction_id.into(),
            context: Map::new(),
            entries: Vec::new(),
            result: None,
            principals: None,
            session_id: None,
        }
    }

    /// Record a successful module entry
    pub fn audit_success(&mut self, module_id: impl Into<String>, info: Map<String, Value>) {
        self.entries.push(AuditEntry {
            module_id: module_id.into(),
            result: AuditResult::Successful,
            reason: None,
            info,
        });
    }

    /// Record a failed module entry
    pub fn audit_failure(
        &mut self,
        module_id: impl Into<String>,
        reason: Map<String, Value>,
        info: Map<String, Value>,
    ) {
        self.entries.push(AuditEntry {
            module_id: module_id.into(),
            result: AuditResult::Failed,
            reason: Some(reason),
            info,
        });
    }

    /// Overwrites any previous value, including with `None`
    pub fn set_session_id(&mut self, session_id: Option<String>) {
        self.session_id = session_id;
    }

    pub fn insert_context(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.context.insert(key.into(), value.into());
    }

    /// Mark the request as successful
    ///
    /// Returns `false` (and changes nothing) if the trail was already
    /// completed.
    pub fn complete_as_successful(&mut self, principal: Option<&str>) -> bool {
        if self.is_completed() {
            return false;
        }
        self.result = Some(AuditResult::Successful);
        self.principals = principal.map(|p| vec![p.to_string()]);
        true
    }

    /// Mark the request as failed, recording the error message if any
    pub fn complete_as_failed(&mut self, error: Option<&str>) -> bool {
        if self.is_completed() {
            return false;
        }
        self.result = Some(AuditResult::Failed);
        if let Some(message) = error {
            self.context
                .insert("exception".to_string(), Value::String(message.to_string()));
        }
        true
    }

    pub fn is_completed(&self) -> bool {
        self.result.is_some()
    }

    pub fn entries(&self) -> &[AuditEntry] {
        &self.entries
    }

    pub fn result(&self) -> Option<AuditResult> {
        self.result
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }

    pub fn document(&self) -> AuditDocument {
        AuditDocument {
            request_id: self.request_id.to_string(),
            transaction_id: self.transaction_id.clone(),
            context: self.context.clone(),
            entries: self.entries.clone(),
            result: self.result,
            principal: self.principals.clone(),
            session_id: self.session_id.clone(),
        }
    }

    /// Audit document as JSON, ready for the sink
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self.document()).unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn reason(message: &str) -> Map<String, Value> {
        Map::from_iter([("message".to_string(), json!(message))])
    }

    #[test]
    fn test_document_of_fresh_trail_is_minimal() {
        let request_id = RequestId::new();
        let trail = AuditTrail::new(request_id, "tx-1");

        assert_eq!(
            trail.to_value(),
            json!({
                "requestId": request_id.to_string(),
                "transactionId": "tx-1",
                "context": {},
            })
        );
    }

    #[test]
    fn test_three_entries_and_successful_completion() {
        let mut trail = AuditTrail::new(RequestId::new(), "tx-2");
        trail.audit_failure("basic", reason("bad password"), Map::new());
        trail.audit_failure("cert", reason("no certificate"), Map::new());
        trail.audit_success(
            "api-key",
            Map::from_iter([("principal".to_string(), json!("bob"))]),
        );
        assert!(trail.complete_as_successful(Some("alice")));

        let doc = trail.to_value();
        let entries = doc["entries"].as_array().unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0]["moduleId"], "basic");
        assert_eq!(entries[0]["result"], "FAILED");
        assert_eq!(entries[0]["reason"]["message"], "bad password");
        assert_eq!(entries[1]["reason"]["message"], "no certificate");
        assert_eq!(entries[2]["result"], "SUCCESSFUL");
        assert!(entries[2].get("reason").is_none());
        assert_eq!(doc["result"], "SUCCESSFUL");
        assert_eq!(doc["principal"], json!(["alice"]));
    }

    #[test]
    fn test_completion_happens_once() {
        let mut trail = AuditTrail::new(RequestId::new(), "tx-3");
        assert!(trail.complete_as_failed(Some("boom")));
        assert!(!trail.complete_as_successful(Some("alice")));

        let doc = trail.to_value();
        assert_eq!(doc["result"], "FAILED");
        assert_eq!(doc["context"]["exception"], "boom");
        assert!(doc.get("principal").is_none());
    }

    #[test]
    fn test_session_id_is_overwritten() {
        let mut trail = AuditTrail::new(RequestId::new(), "tx-4");
        trail.set_session_id(Some("s-1".to_string()));
        assert_eq!(trail.to_value()["sessionId"], "s-1");

        trail.set_session_id(None);
        assert!(trail.to_value().get("sessionId").is_none());
    }
}
