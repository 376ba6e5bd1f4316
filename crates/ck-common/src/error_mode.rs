//! OS error-mode bitmask values.
//!
//! An error mode is the process- or thread-scoped flag set that decides
//! whether the OS shows a fault dialog, suppresses it, or lets the fault
//! propagate. The harness never validates the bits; any value the host
//! API accepts is passed through.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Error-mode bitmask.
///
/// Text form is hexadecimal with an optional `0x`/`0X` prefix, so `"8001"`
/// and `"0x8001"` denote the same value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorModeValue(u32);

impl ErrorModeValue {
    /// The system does not display the critical-error-handler message box.
    pub const FAIL_CRITICAL_ERRORS: u32 = 0x0001;
    /// The system does not display the fault error box (or collect a dump).
    pub const NO_GP_FAULT_ERROR_BOX: u32 = 0x0002;
    /// The system fixes memory alignment faults invisibly.
    pub const NO_ALIGNMENT_FAULT_EXCEPT: u32 = 0x0004;
    /// The system does not display a message box when it fails to find a file.
    pub const NO_OPEN_FILE_ERROR_BOX: u32 = 0x8000;

    pub const fn new(bits: u32) -> Self {
        Self(bits)
    }

    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Check whether every bit in `flag` is set.
    pub const fn contains(self, flag: u32) -> bool {
        self.0 & flag == flag
    }
}

impl From<u32> for ErrorModeValue {
    fn from(bits: u32) -> Self {
        Self(bits)
    }
}

impl From<ErrorModeValue> for u32 {
    fn from(value: ErrorModeValue) -> Self {
        value.0
    }
}

impl fmt::Display for ErrorModeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:08X}", self.0)
    }
}

/// Failure to read an error-mode value from text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseErrorModeError {
    #[error("value is empty")]
    Empty,
    #[error("'{0}' is not a hexadecimal number")]
    NotHex(String),
    #[error("'{0}' does not fit in 32 bits")]
    Overflow(String),
}

impl FromStr for ErrorModeValue {
    type Err = ParseErrorModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() {
            return Err(ParseErrorModeError::Empty);
        }
        // from_str_radix tolerates a leading '+', which is not a hex digit.
        if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseErrorModeError::NotHex(s.to_string()));
        }

        u32::from_str_radix(digits, 16)
            .map(Self)
            .map_err(|_| ParseErrorModeError::Overflow(s.to_string()))
    }
}

/// Which error mode a value applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ErrorModeScope {
    Process,
    Thread,
}

impl fmt::Display for ErrorModeScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorModeScope::Process => write!(f, "process"),
            ErrorModeScope::Thread => write!(f, "thread"),
        }
    }
}
