//! Error types for crashkit.
//!
//! Two classes of error reach the user:
//! - Usage errors: the argument list could not be turned into a run.
//!   Nothing downstream executes.
//! - Configuration errors: an error-mode OS call failed. The following
//!   fault could not be trusted, so the run stops.
//!
//! A fault that returns control is not an error of this type; the
//! dispatcher reports it as its own outcome.

use crate::error_mode::{ErrorModeScope, ErrorModeValue, ParseErrorModeError};
use thiserror::Error;

/// Result type alias for crashkit operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for crashkit.
#[derive(Error, Debug)]
pub enum Error {
    // Usage errors
    #[error("no fault mode given")]
    MissingMode,

    #[error("option '{flag}' requires a value")]
    MissingValue { flag: String },

    #[error("invalid value for '{flag}': {source}")]
    InvalidValue {
        flag: String,
        #[source]
        source: ParseErrorModeError,
    },

    #[error("unrecognized argument '{0}'")]
    UnrecognizedArgument(String),

    #[error("mode '{flag}' is unavailable in this build")]
    ModeUnavailable { flag: String },

    #[error("{0}")]
    Usage(String),

    // Configuration errors
    #[error("failed to set {scope} error mode to {value}: {source}")]
    ErrorMode {
        scope: ErrorModeScope,
        value: ErrorModeValue,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// True for errors caused by the argument list.
    pub fn is_usage(&self) -> bool {
        matches!(
            self,
            Error::MissingMode
                | Error::MissingValue { .. }
                | Error::InvalidValue { .. }
                | Error::UnrecognizedArgument(_)
                | Error::ModeUnavailable { .. }
                | Error::Usage(_)
        )
    }

    /// Stable machine-readable name, used as a log field.
    pub fn code_name(&self) -> &'static str {
        match self {
            Error::MissingMode => "ERR_MISSING_MODE",
            Error::MissingValue { .. } => "ERR_MISSING_VALUE",
            Error::InvalidValue { .. } => "ERR_INVALID_VALUE",
            Error::UnrecognizedArgument(_) => "ERR_UNRECOGNIZED",
            Error::ModeUnavailable { .. } => "ERR_MODE_UNAVAILABLE",
            Error::Usage(_) => "ERR_USAGE",
            Error::ErrorMode { .. } => "ERR_ERROR_MODE",
        }
    }
}
