//! Composition Strategies
//!
//! Contexts that combine modules into a single [`AuthContext`]:
//! - [`SessionContext`] - an optional session module
//! - [`FallbackContext`] - first module that does not fail wins
//! - [`AggregateContext`] - session tier in front of a request tier
//!
//! [`AuthContext`]: crate::domain::AuthContext

pub mod aggregate;
pub mod fallback;
pub mod session;

pub use aggregate::AggregateContext;
pub use fallback::FallbackContext;
pub use session::SessionContext;

use crate::error::AuthError;

/// Flatten a `clean_subject` failure into `failures`
fn push_clean_failure(failures: &mut Vec<String>, error: AuthError) {
    match error {
        AuthError::CleanSubject(nested) => failures.extend(nested),
        other => failures.push(other.to_string()),
    }
}

fn clean_result(failures: Vec<String>) -> Result<(), AuthError> {
    if failures.is_empty() {
        Ok(())
    } else {
        Err(AuthError::CleanSubject(failures))
    }
}
