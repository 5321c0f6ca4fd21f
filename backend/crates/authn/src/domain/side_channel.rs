//! Side Channel
//!
//! Audit metadata a module leaves behind for its decorators. Modules only
//! write here; the auditing decorators read and drain it, so modules never
//! need to know which decorators wrap them.

use serde_json::{Map, Value};

/// Well-known audit metadata for the module currently running
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideChannel {
    /// Name of the principal the module authenticated
    pub principal: Option<String>,
    /// Session id established or resumed by a session module
    pub session_id: Option<String>,
    /// Free-form info recorded on the module's audit entry
    pub module_info: Map<String, Value>,
    /// Reason recorded on a failed audit entry
    pub failure_reason: Option<Map<String, Value>>,
    /// Module-private values, never audited
    pub attributes: Map<String, Value>,
}

impl SideChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_principal(&mut self, principal: impl Into<String>) {
        self.principal = Some(principal.into());
    }

    pub fn set_session_id(&mut self, session_id: impl Into<String>) {
        self.session_id = Some(session_id.into());
    }

    pub fn insert_info(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.module_info.insert(key.into(), value.into());
    }

    pub fn set_failure_reason(&mut self, reason: Map<String, Value>) {
        self.failure_reason = Some(reason);
    }

    pub fn take_module_info(&mut self) -> Map<String, Value> {
        std::mem::take(&mut self.module_info)
    }

    pub fn take_failure_reason(&mut self) -> Option<Map<String, Value>> {
        self.failure_reason.take()
    }

    pub fn take_session_id(&mut self) -> Option<String> {
        self.session_id.take()
    }

    /// Principal name, ignoring empty values
    pub fn principal(&self) -> Option<&str> {
        self.principal.as_deref().filter(|p| !p.is_empty())
    }
}
