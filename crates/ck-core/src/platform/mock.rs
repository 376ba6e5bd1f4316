//! In-memory platform for tests.
//!
//! Records every call so tests can check ordering (e.g. that an error mode
//! was set before the snapshot read it back).

use super::Platform;
use ck_common::ErrorModeValue;
use std::cell::{Cell, RefCell};
use std::io;

/// A recorded platform call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlatformCall {
    ReadProcessErrorMode,
    ReadThreadErrorMode,
    SetProcessErrorMode(ErrorModeValue),
    SetThreadErrorMode(ErrorModeValue),
    RaiseAccessViolation,
}

#[derive(Debug, Default)]
pub struct MockPlatform {
    process_mode: Cell<u32>,
    thread_mode: Cell<u32>,
    fail_sets_with: Option<i32>,
    calls: RefCell<Vec<PlatformCall>>,
}

impl MockPlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every error-mode set fail with the given raw OS error.
    pub fn failing_sets(errno: i32) -> Self {
        MockPlatform {
            fail_sets_with: Some(errno),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.borrow().clone()
    }

    fn record(&self, call: PlatformCall) {
        self.calls.borrow_mut().push(call);
    }

    fn check_set(&self) -> io::Result<()> {
        match self.fail_sets_with {
            Some(errno) => Err(io::Error::from_raw_os_error(errno)),
            None => Ok(()),
        }
    }
}

impl Platform for MockPlatform {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn process_error_mode(&self) -> ErrorModeValue {
        self.record(PlatformCall::ReadProcessErrorMode);
        ErrorModeValue::new(self.process_mode.get())
    }

    fn thread_error_mode(&self) -> ErrorModeValue {
        self.record(PlatformCall::ReadThreadErrorMode);
        ErrorModeValue::new(self.thread_mode.get())
    }

    fn set_process_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue> {
        self.record(PlatformCall::SetProcessErrorMode(value));
        self.check_set()?;
        Ok(ErrorModeValue::new(self.process_mode.replace(value.bits())))
    }

    fn set_thread_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue> {
        self.record(PlatformCall::SetThreadErrorMode(value));
        self.check_set()?;
        Ok(ErrorModeValue::new(self.thread_mode.replace(value.bits())))
    }

    /// Behaves like an OS that swallowed the exception.
    fn raise_access_violation(&self) {
        self.record(PlatformCall::RaiseAccessViolation);
    }

    fn terminate_process(&self, code: i32) -> ! {
        panic!("mock platform asked to terminate with code {code}");
    }
}
