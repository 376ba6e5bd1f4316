//! Exit codes for the crashkit CLI.
//!
//! A successful run never produces one of these: it ends in a crash. The
//! codes below cover the ways a run can end without the requested crash,
//! plus the codes the deliberate terminations are expected to produce.

/// Exit codes for crashkit runs.
///
/// These codes are a stable contract for harnesses that drive the tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// A fault returned control instead of terminating the process.
    DidNotCrash = 1,

    /// `--terminate-process` ended the process through the OS.
    Terminated = 86,

    /// An error-mode OS call failed.
    ConfigError = 98,

    /// Usage error, or `--help`.
    Usage = 99,

    /// Set by the Rust runtime when a panic unwinds out of `main`.
    UnhandledPanic = 101,
}

impl ExitCode {
    /// Convert to i32 for process exit.
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the code name as a string constant (for log fields).
    pub fn code_name(&self) -> &'static str {
        match self {
            ExitCode::DidNotCrash => "ERR_DID_NOT_CRASH",
            ExitCode::Terminated => "TERMINATED",
            ExitCode::ConfigError => "ERR_CONFIG",
            ExitCode::Usage => "ERR_USAGE",
            ExitCode::UnhandledPanic => "UNHANDLED_PANIC",
        }
    }
}
