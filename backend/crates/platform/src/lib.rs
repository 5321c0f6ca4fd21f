//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared HTTP foundations that carry no
//! authentication semantics of their own:
//! - Accept header parsing (media ranges, quality weights, specificity)
//! - Header extraction helpers

pub mod accept;
pub mod headers;
