//! Auth Logger
//!
//! Sink for the [`Logging`](super::Logging) decorator. Production code logs
//! through `tracing`; tests plug in a recorder.

use crate::domain::outcome::{Outcome, Phase};

/// One log line emitted by the logging decorator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    /// Module id or context name
    pub name: String,
    pub phase: Phase,
    pub outcome: Option<Outcome>,
    pub error: Option<String>,
    pub message: String,
}

pub trait AuthLogger: Send + Sync {
    fn debug(&self, record: &LogRecord);
    fn error(&self, record: &LogRecord);
}

/// [`AuthLogger`] backed by `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl AuthLogger for TracingLogger {
    fn debug(&self, record: &LogRecord) {
        tracing::debug!(
            name = %record.name,
            phase = %record.phase,
            outcome = record.outcome.map(|o| o.code()),
            "{}",
            record.message
        );
    }

    fn error(&self, record: &LogRecord) {
        tracing::error!(
            name = %record.name,
            phase = %record.phase,
            outcome = record.outcome.map(|o| o.code()),
            error = record.error.as_deref(),
            "{}",
            record.message
        );
    }
}
