//! Application Layer
//!
//! Decorators, composition strategies and the orchestrator that drives a
//! request through them.

pub mod config;
pub mod contexts;
pub mod decorators;
pub mod filter;
pub mod framework;
pub mod legacy;

// Re-exports
pub use config::{AuthnConfig, ModuleConfig};
pub use filter::{AuthenticationFilter, AuthenticationFilterBuilder};
pub use framework::AuthenticationFramework;
pub use legacy::{
    LegacyAdapter, LegacyAuthContext, LegacyAuthModule, LegacyError, MessageInfo, adapt_context,
    adapt_module,
};
