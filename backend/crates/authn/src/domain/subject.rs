//! Subject and Principal
//!
//! The client subject collects the identities established by modules
//! during `validate_request`. The service subject describes the server
//! side and is read-only for modules.

use derive_more::Display;
use serde::{Deserialize, Serialize};

/// A single authenticated identity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Display, Serialize, Deserialize)]
#[display("{name}")]
pub struct Principal {
    name: String,
}

impl Principal {
    #[inline]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Ordered set of principals
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Subject {
    principals: Vec<Principal>,
}

impl Subject {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subject holding a single principal
    pub fn with_principal(name: impl Into<String>) -> Self {
        let mut subject = Self::new();
        subject.add_principal(Principal::new(name));
        subject
    }

    /// Add a principal, keeping insertion order. Duplicates are ignored.
    pub fn add_principal(&mut self, principal: Principal) -> bool {
        if self.principals.contains(&principal) {
            return false;
        }
        self.principals.push(principal);
        true
    }

    pub fn principals(&self) -> &[Principal] {
        &self.principals
    }

    /// Most recently added principal
    pub fn last_principal(&self) -> Option<&Principal> {
        self.principals.last()
    }

    pub fn is_empty(&self) -> bool {
        self.principals.is_empty()
    }

    pub fn clear(&mut self) {
        self.principals.clear();
    }
}
