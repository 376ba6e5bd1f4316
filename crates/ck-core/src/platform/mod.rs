//! Platform facade.
//!
//! Everything the harness needs from the OS that the Rust standard library
//! does not expose goes through [`Platform`]: the process/thread error-mode
//! flags, native exception raising, and runtime-bypassing termination.
//! There is one implementation per target OS.
//!
//! # Unix substitutions
//!
//! Unix has neither error modes nor structured exceptions:
//! - The error modes are kept by the harness itself. A process mode with
//!   [`ErrorModeValue::NO_GP_FAULT_ERROR_BOX`] lowers the core-dump limit
//!   to zero, which is what suppressing the fault report means there.
//! - The access-violation exception is `raise(SIGSEGV)`.

use ck_common::ErrorModeValue;
use std::io;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

#[cfg(unix)]
pub use unix::UnixPlatform as NativePlatform;
#[cfg(windows)]
pub use windows::WindowsPlatform as NativePlatform;

/// NTSTATUS code for an access violation.
pub const ACCESS_VIOLATION_CODE: u32 = 0xC000_0005;

/// OS operations the fault harness depends on.
pub trait Platform {
    /// Short platform name for logs.
    fn name(&self) -> &'static str;

    /// Current process error mode. No side effects.
    fn process_error_mode(&self) -> ErrorModeValue;

    /// Current error mode of the calling thread. No side effects.
    fn thread_error_mode(&self) -> ErrorModeValue;

    /// Set the process error mode, returning the previous one.
    fn set_process_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue>;

    /// Set the calling thread's error mode, returning the previous one.
    fn set_thread_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue>;

    /// Raise a native access-violation exception, bypassing the Rust
    /// runtime's error model.
    ///
    /// Returns only if the OS suppressed the exception.
    fn raise_access_violation(&self);

    /// Terminate the current process through the OS with `code`, skipping
    /// runtime shutdown (no destructors, no exit handlers).
    fn terminate_process(&self, code: i32) -> !;
}

/// The platform this binary was built for.
pub fn native() -> NativePlatform {
    NativePlatform::default()
}

/// Flush the standard streams before a termination that will not.
pub(crate) fn flush_std_streams() {
    use std::io::Write;

    let _ = io::stdout().flush();
    let _ = io::stderr().flush();
}
