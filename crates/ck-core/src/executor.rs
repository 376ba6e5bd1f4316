//! Fault execution.
//!
//! Each [`FaultKind`] maps to one low-level operation that ends the process.
//! None of them may be caught by an ordinary error path: there is no
//! `catch_unwind` anywhere in the binary, aborts skip unwinding entirely,
//! and the memory faults go through `black_box`/volatile accesses so the
//! optimizer cannot remove them.
//!
//! Operations whose divergence the compiler can prove are typed `-> !`.
//! The rest can, in principle, return: a raised signal may be ignored, and
//! a debug assertion is compiled out of release builds. When that happens
//! the runner hands back a [`FaultReturned`] and the caller reports it.

use crate::catalog::FaultKind;
use crate::platform::{flush_std_streams, Platform};
use std::error::Error as StdError;
use std::fmt;
use std::hint::black_box;
use std::io::Write;
use std::num::ParseIntError;
use thiserror::Error;

/// Element index of the out-of-bounds write, close to `i32::MAX`.
pub const INVALID_WRITE_INDEX: usize = i32::MAX as usize - 1;

/// Evidence that a fault did not terminate the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultReturned {
    pub kind: FaultKind,
    pub detail: String,
}

impl FaultReturned {
    pub fn new(kind: FaultKind, detail: impl Into<String>) -> Self {
        FaultReturned {
            kind,
            detail: detail.into(),
        }
    }
}

impl fmt::Display for FaultReturned {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fault {} returned control ({}); the process didn't crash as expected",
            self.kind, self.detail
        )
    }
}

/// Something that can trigger a fault.
pub trait FaultRunner {
    /// Trigger `kind`. Returning at all means the fault failed.
    fn trigger(&self, kind: FaultKind) -> FaultReturned;
}

/// Runs faults for real against a [`Platform`].
pub struct NativeFaultRunner<'a> {
    platform: &'a dyn Platform,
    terminate_exit_code: i32,
}

impl<'a> NativeFaultRunner<'a> {
    pub fn new(platform: &'a dyn Platform, terminate_exit_code: i32) -> Self {
        Self {
            platform,
            terminate_exit_code,
        }
    }
}

impl FaultRunner for NativeFaultRunner<'_> {
    fn trigger(&self, kind: FaultKind) -> FaultReturned {
        match kind {
            FaultKind::UncaughtException => uncaught_panic(),
            FaultKind::FailFast => fail_fast("fail-fast requested", None),
            FaultKind::FailFastWithCause => {
                let cause = provoke_cause();
                fail_fast(
                    "fail-fast requested after an inner failure",
                    cause.as_ref().map(|c| c as &(dyn StdError + 'static)),
                )
            }
            FaultKind::StackOverflow => {
                let depth = overflow_stack(0);
                FaultReturned::new(kind, format!("recursion came back with {depth}"))
            }
            FaultKind::DebugAssert => {
                debug_assert!(false, "debug assertion requested");
                FaultReturned::new(kind, "debug assertions are compiled out of this build")
            }
            FaultKind::RaiseAccessViolation => {
                self.platform.raise_access_violation();
                FaultReturned::new(kind, "the OS suppressed the access violation")
            }
            FaultKind::InvalidUnsafe => {
                write_out_of_bounds();
                FaultReturned::new(kind, "out-of-bounds write did not fault")
            }
            FaultKind::CrtAbort => crt_abort(),
            FaultKind::TerminateProcess => self.platform.terminate_process(self.terminate_exit_code),
        }
    }
}

/// Panic with nothing on the stack to catch it.
fn uncaught_panic() -> ! {
    panic!("uncaught exception requested");
}

/// Report `message` and any cause chain on stderr, then abort without
/// unwinding. No destructors or panic hooks run.
pub fn fail_fast(message: &str, cause: Option<&(dyn StdError + 'static)>) -> ! {
    let mut stderr = std::io::stderr().lock();
    let _ = writeln!(stderr, "crashkit: fail-fast: {message}");
    if let Some(cause) = cause {
        for line in cause_chain(cause) {
            let _ = writeln!(stderr, "  caused by: {line}");
        }
    }
    drop(stderr);
    flush_std_streams();
    std::process::abort()
}

/// Messages of `err` and each of its sources, outermost first.
pub fn cause_chain(err: &(dyn StdError + 'static)) -> Vec<String> {
    let mut chain = vec![err.to_string()];
    let mut next = err.source();
    while let Some(source) = next {
        chain.push(source.to_string());
        next = source.source();
    }
    chain
}

/// Inner failure attached to `--fail-fast-exception`.
#[derive(Debug, Error)]
#[error("failed to decode fault payload '{payload}'")]
pub struct FaultCause {
    pub payload: String,
    #[source]
    pub source: ParseIntError,
}

/// Produce a genuine inner error by decoding a malformed payload.
pub fn provoke_cause() -> Option<FaultCause> {
    let payload = black_box("not-a-number");
    payload.parse::<u32>().err().map(|source| FaultCause {
        payload: payload.to_string(),
        source,
    })
}

/// Recurse with no base case. Each frame keeps a buffer alive across the
/// call, so the call cannot become a jump.
#[inline(never)]
#[allow(unconditional_recursion)]
fn overflow_stack(depth: u64) -> u64 {
    let frame = black_box([depth; 32]);
    let below = overflow_stack(black_box(depth.wrapping_add(1)));
    frame[(below % 32) as usize].wrapping_add(below)
}

/// Write through a raw pointer far past the end of a one-element
/// allocation, defeating bounds checks.
fn write_out_of_bounds() {
    let mut cells = vec![0i32; 1];
    let base = cells.as_mut_ptr();
    let index = black_box(INVALID_WRITE_INDEX);
    unsafe {
        base.wrapping_add(index).write_volatile(42);
    }
    black_box(&cells);
}

/// The C runtime's abort, not the Rust runtime's.
fn crt_abort() -> ! {
    flush_std_streams();
    unsafe { libc::abort() }
}
