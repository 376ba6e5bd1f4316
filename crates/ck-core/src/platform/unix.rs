//! Unix platform.

use super::{flush_std_streams, Platform};
use crate::logging::event_names;
use ck_common::ErrorModeValue;
use std::cell::Cell;
use std::io;
use std::sync::atomic::{AtomicU32, Ordering};

static PROCESS_ERROR_MODE: AtomicU32 = AtomicU32::new(0);

thread_local! {
    static THREAD_ERROR_MODE: Cell<u32> = const { Cell::new(0) };
}

#[derive(Debug, Default, Clone, Copy)]
pub struct UnixPlatform;

impl UnixPlatform {
    /// Lower the soft `RLIMIT_CORE` to zero so the fault leaves no core file.
    fn suppress_core_dumps(&self) -> io::Result<()> {
        let mut limit = libc::rlimit {
            rlim_cur: 0,
            rlim_max: 0,
        };
        let result = unsafe { libc::getrlimit(libc::RLIMIT_CORE, &mut limit) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }

        limit.rlim_cur = 0;
        let result = unsafe { libc::setrlimit(libc::RLIMIT_CORE, &limit) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    /// Whether SIGSEGV is currently ignored (inherited `SIG_IGN`).
    fn segv_ignored(&self) -> io::Result<bool> {
        let mut current: libc::sigaction = unsafe { std::mem::zeroed() };
        let result = unsafe { libc::sigaction(libc::SIGSEGV, std::ptr::null(), &mut current) };
        if result != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(current.sa_sigaction == libc::SIG_IGN)
    }
}

impl Platform for UnixPlatform {
    fn name(&self) -> &'static str {
        "unix"
    }

    fn process_error_mode(&self) -> ErrorModeValue {
        ErrorModeValue::new(PROCESS_ERROR_MODE.load(Ordering::SeqCst))
    }

    fn thread_error_mode(&self) -> ErrorModeValue {
        ErrorModeValue::new(THREAD_ERROR_MODE.with(Cell::get))
    }

    fn set_process_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue> {
        if value.contains(ErrorModeValue::NO_GP_FAULT_ERROR_BOX) {
            self.suppress_core_dumps()?;
        }
        let previous = PROCESS_ERROR_MODE.swap(value.bits(), Ordering::SeqCst);
        Ok(ErrorModeValue::new(previous))
    }

    fn set_thread_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue> {
        let previous = THREAD_ERROR_MODE.with(|mode| mode.replace(value.bits()));
        Ok(ErrorModeValue::new(previous))
    }

    fn raise_access_violation(&self) {
        // The Rust runtime's SIGSEGV handler only knows stack-guard faults;
        // for a raised signal it restores the default and returns, which
        // would swallow this one. An inherited SIG_IGN is left alone: that
        // is the OS suppressing the fault, and the caller must see it.
        match self.segv_ignored() {
            Ok(true) => {
                tracing::warn!(
                    target: event_names::FAULT_SUPPRESSED,
                    signal = "SIGSEGV",
                    message = "SIGSEGV is ignored by this process"
                );
            }
            Ok(false) => unsafe {
                libc::signal(libc::SIGSEGV, libc::SIG_DFL);
            },
            Err(err) => {
                tracing::warn!(
                    target: event_names::FAULT_SUPPRESSED,
                    error = %err,
                    message = "could not inspect SIGSEGV disposition"
                );
            }
        }

        flush_std_streams();
        unsafe {
            libc::raise(libc::SIGSEGV);
        }
    }

    fn terminate_process(&self, code: i32) -> ! {
        flush_std_streams();
        unsafe { libc::_exit(code) }
    }
}
