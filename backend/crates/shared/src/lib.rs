//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of vocabulary shared by the
//! authentication pipeline and its hosts:
//! - Error classification mapped onto HTTP status codes
//! - The uniform error envelope rendered on the wire
//! - Typed identifiers (auth context identity, request id, transaction id)
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all crates.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
