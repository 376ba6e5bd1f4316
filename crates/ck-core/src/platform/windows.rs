//! Windows platform.

use super::{flush_std_streams, Platform, ACCESS_VIOLATION_CODE};
use ck_common::ErrorModeValue;
use std::ffi::c_void;
use std::io;

#[link(name = "kernel32")]
extern "system" {
    fn GetErrorMode() -> u32;
    fn SetErrorMode(mode: u32) -> u32;
    fn GetThreadErrorMode() -> u32;
    fn SetThreadErrorMode(new_mode: u32, old_mode: *mut u32) -> i32;
    fn RaiseException(code: u32, flags: u32, argument_count: u32, arguments: *const usize);
    fn GetCurrentProcess() -> *mut c_void;
    fn TerminateProcess(process: *mut c_void, exit_code: u32) -> i32;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPlatform;

impl Platform for WindowsPlatform {
    fn name(&self) -> &'static str {
        "windows"
    }

    fn process_error_mode(&self) -> ErrorModeValue {
        ErrorModeValue::new(unsafe { GetErrorMode() })
    }

    fn thread_error_mode(&self) -> ErrorModeValue {
        ErrorModeValue::new(unsafe { GetThreadErrorMode() })
    }

    fn set_process_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue> {
        // SetErrorMode has no failure return.
        let previous = unsafe { SetErrorMode(value.bits()) };
        Ok(ErrorModeValue::new(previous))
    }

    fn set_thread_error_mode(&self, value: ErrorModeValue) -> io::Result<ErrorModeValue> {
        let mut previous = 0u32;
        let ok = unsafe { SetThreadErrorMode(value.bits(), &mut previous) };
        if ok == 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(ErrorModeValue::new(previous))
    }

    fn raise_access_violation(&self) {
        flush_std_streams();
        // Zero arguments, but a non-null pointer that points nowhere.
        let arguments: *const usize = std::ptr::without_provenance(1);
        unsafe { RaiseException(ACCESS_VIOLATION_CODE, 0, 0, arguments) };
    }

    fn terminate_process(&self, code: i32) -> ! {
        flush_std_streams();
        unsafe {
            TerminateProcess(GetCurrentProcess(), code as u32);
        }
        let err = io::Error::last_os_error();
        eprintln!("crashkit: TerminateProcess failed ({err}); aborting");
        std::process::abort()
    }
}
