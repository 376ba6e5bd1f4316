//! Structured event definitions for logging.
//!
//! Every event carries the run id and the dispatcher stage it came from.

use serde::{Deserialize, Serialize};

/// Log levels for events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl From<tracing::Level> for Level {
    fn from(level: tracing::Level) -> Self {
        match level {
            tracing::Level::TRACE => Level::Trace,
            tracing::Level::DEBUG => Level::Debug,
            tracing::Level::INFO => Level::Info,
            tracing::Level::WARN => Level::Warn,
            tracing::Level::ERROR => Level::Error,
        }
    }
}

/// Dispatcher stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Resolving the argument list.
    Parse,
    /// Applying error-mode settings.
    Configure,
    /// Capturing and writing the diagnostic snapshot.
    Report,
    /// Running the fault.
    Execute,
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Stage::Parse => "parse",
            Stage::Configure => "configure",
            Stage::Report => "report",
            Stage::Execute => "execute",
        };
        write!(f, "{}", s)
    }
}

/// Standard event names used in logging.
pub mod event_names {
    pub const RUN_STARTED: &str = "run.started";
    pub const RUN_EXIT: &str = "run.exit";

    pub const USAGE_ERROR: &str = "usage.error";

    pub const CONFIG_ERROR_MODE_SET: &str = "config.error_mode_set";
    pub const CONFIG_ERROR: &str = "config.error";

    pub const DIAG_SNAPSHOT: &str = "diag.snapshot";
    pub const DIAG_SNAPSHOT_FAILED: &str = "diag.snapshot_failed";

    pub const FAULT_TRIGGERING: &str = "fault.triggering";
    pub const FAULT_SUPPRESSED: &str = "fault.suppressed";
    pub const FAULT_RETURNED: &str = "fault.returned";
}

/// Correlation context for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogContext {
    pub run_id: String,
}

impl LogContext {
    pub fn new(run_id: impl Into<String>) -> Self {
        LogContext {
            run_id: run_id.into(),
        }
    }
}
