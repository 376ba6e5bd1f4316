//! End-to-end fault tests on Unix.
//!
//! Each test spawns the real binary, lets it crash, and checks how the
//! process died: exit code or terminating signal. A run that prints the
//! "didn't crash as expected" message is always a failure.

#![cfg(unix)]

mod support;

use predicates::prelude::*;
use std::os::unix::process::CommandExt;
use std::process::{Command as StdCommand, Stdio};
use support::{crashkit, run, snapshot_run_id, stderr, stdout, termination, Termination};

const DID_NOT_CRASH: &str = "didn't crash as expected";

fn assert_crashed(args: &[&str], expected: &[Termination]) -> std::process::Output {
    let output = run(args);
    let how = termination(&output);
    assert!(
        expected.contains(&how),
        "{args:?} ended with {how:?}, expected one of {expected:?}\nstdout:\n{}\nstderr:\n{}",
        stdout(&output),
        stderr(&output)
    );
    assert!(!stdout(&output).contains(DID_NOT_CRASH));
    assert!(stdout(&output).contains("crashkit diagnostic snapshot"));
    output
}

// ============================================================================
// One test per mode
// ============================================================================

mod modes {
    use super::*;

    #[test]
    fn uncaught_exception_exits_101() {
        let output = assert_crashed(&["--uncaught-exception"], &[Termination::Exited(101)]);
        assert!(stderr(&output).contains("uncaught exception requested"));
    }

    #[test]
    fn fail_fast_aborts() {
        let output = assert_crashed(&["--fail-fast"], &[Termination::Signaled(libc::SIGABRT)]);
        assert!(stderr(&output).contains("crashkit: fail-fast: fail-fast requested"));
    }

    #[test]
    fn fail_fast_exception_reports_cause_then_aborts() {
        let output = assert_crashed(
            &["--fail-fast-exception"],
            &[Termination::Signaled(libc::SIGABRT)],
        );
        let err = stderr(&output);
        assert!(err.contains("caused by: failed to decode fault payload 'not-a-number'"));
        assert!(err.contains("caused by: invalid digit found in string"));
    }

    #[test]
    fn stack_overflow_is_fatal() {
        let output = assert_crashed(
            &["--stack-overflow"],
            &[
                Termination::Signaled(libc::SIGABRT),
                Termination::Signaled(libc::SIGSEGV),
            ],
        );
        assert!(!stderr(&output).contains("panicked"));
    }

    #[test]
    fn debug_assert_panics_in_debug_builds() {
        if !cfg!(debug_assertions) {
            return;
        }
        let output = assert_crashed(&["--debug-assert"], &[Termination::Exited(101)]);
        assert!(stderr(&output).contains("debug assertion requested"));
    }

    #[test]
    fn raise_access_violation_dies_of_sigsegv() {
        assert_crashed(
            &["--raise-av-exception"],
            &[Termination::Signaled(libc::SIGSEGV)],
        );
    }

    #[test]
    fn raise_exception_alias_behaves_the_same() {
        assert_crashed(&["--raise-exception"], &[Termination::Signaled(libc::SIGSEGV)]);
    }

    #[test]
    fn invalid_unsafe_write_faults() {
        assert_crashed(
            &["--invalid-unsafe"],
            &[
                Termination::Signaled(libc::SIGSEGV),
                Termination::Signaled(libc::SIGBUS),
            ],
        );
    }

    #[test]
    fn crt_abort_aborts() {
        assert_crashed(&["--crt-abort"], &[Termination::Signaled(libc::SIGABRT)]);
    }

    #[test]
    fn terminate_process_exits_86() {
        assert_crashed(&["--terminate-process"], &[Termination::Exited(86)]);
    }

    #[test]
    fn mode_is_case_insensitive() {
        assert_crashed(&["--TERMINATE-PROCESS"], &[Termination::Exited(86)]);
    }
}

// ============================================================================
// Ordering and configuration
// ============================================================================

mod ordering {
    use super::*;

    #[test]
    fn first_mode_wins() {
        let output = assert_crashed(
            &["--terminate-process", "--uncaught-exception"],
            &[Termination::Exited(86)],
        );
        assert!(!stderr(&output).contains("uncaught exception requested"));
    }

    #[test]
    fn error_mode_is_applied_before_the_fault() {
        let output = assert_crashed(
            &["--error-mode", "0x8001", "--uncaught-exception"],
            &[Termination::Exited(101)],
        );
        assert!(stdout(&output).contains("process error mode: 0x00008001"));
    }

    #[test]
    fn hex_prefix_is_optional() {
        for value in ["1234", "0x1234"] {
            let output = assert_crashed(
                &["--error-mode", value, "--terminate-process"],
                &[Termination::Exited(86)],
            );
            assert!(stdout(&output).contains("process error mode: 0x00001234"));
        }
    }

    #[test]
    fn thread_error_mode_is_reported() {
        let output = assert_crashed(
            &["--thread-error-mode=10", "--terminate-process"],
            &[Termination::Exited(86)],
        );
        assert!(stdout(&output).contains("thread error mode:  0x00000010"));
        assert!(stdout(&output).contains("process error mode: 0x00000000"));
    }

    #[test]
    fn options_after_the_mode_never_apply() {
        let output = assert_crashed(
            &["--terminate-process", "--error-mode", "4"],
            &[Termination::Exited(86)],
        );
        assert!(stdout(&output).contains("process error mode: 0x00000000"));
    }
}

// ============================================================================
// Diagnostic snapshot and logging
// ============================================================================

mod reporting {
    use super::*;

    #[test]
    fn snapshot_lists_only_matching_variables() {
        crashkit()
            .arg("--terminate-process")
            .env("CRASHKIT_PROBE", "visible")
            .env("UNRELATED_PROBE", "hidden")
            .assert()
            .code(86)
            .stdout(predicate::str::contains("CRASHKIT_PROBE=visible"))
            .stdout(predicate::str::contains("UNRELATED_PROBE").not());
    }

    #[test]
    fn jsonl_logs_share_the_snapshot_run_id() {
        let output = crashkit()
            .arg("--terminate-process")
            .env("CRASHKIT_LOG", "info")
            .env("CRASHKIT_LOG_FORMAT", "jsonl")
            .output()
            .expect("crashkit should spawn");
        assert_eq!(termination(&output), Termination::Exited(86));

        let run_id = snapshot_run_id(&stdout(&output)).expect("snapshot has a run id");
        let events: Vec<serde_json::Value> = stderr(&output)
            .lines()
            .filter(|line| line.starts_with('{'))
            .map(|line| serde_json::from_str(line).expect("log line is JSON"))
            .collect();

        let triggering = events
            .iter()
            .find(|event| event["event"] == "fault.triggering")
            .expect("fault.triggering was logged");
        assert_eq!(triggering["run_id"], run_id.as_str());
        assert_eq!(triggering["stage"], "execute");
    }

    #[test]
    fn logs_stay_quiet_by_default() {
        let output = crashkit()
            .arg("--terminate-process")
            .env_remove("CRASHKIT_LOG")
            .env_remove("RUST_LOG")
            .output()
            .expect("crashkit should spawn");
        assert_eq!(termination(&output), Termination::Exited(86));
        assert!(!stderr(&output).contains("fault.triggering"));
    }
}

// ============================================================================
// Suppressed faults
// ============================================================================

mod suppressed {
    use super::*;

    #[test]
    fn ignored_sigsegv_reports_the_fault_returned() {
        let mut cmd = StdCommand::new(env!("CARGO_BIN_EXE_crashkit"));
        cmd.arg("--raise-av-exception");
        unsafe {
            cmd.pre_exec(|| {
                libc::signal(libc::SIGSEGV, libc::SIG_IGN);
                Ok(())
            });
        }
        let output = cmd.output().expect("crashkit should spawn");

        assert_eq!(termination(&output), Termination::Exited(1));
        assert!(stdout(&output).contains(DID_NOT_CRASH));
        assert!(stdout(&output).contains("--raise-av-exception"));
    }
}

// ============================================================================
// Unwritable stdout
// ============================================================================

mod unwritable_stdout {
    use super::*;

    #[cfg(target_os = "linux")]
    #[test]
    fn full_disk_does_not_stop_the_fault() {
        let dev_full = std::fs::OpenOptions::new()
            .write(true)
            .open("/dev/full")
            .expect("/dev/full should exist");
        let output = StdCommand::new(env!("CARGO_BIN_EXE_crashkit"))
            .arg("--crt-abort")
            .env("CRASHKIT_LOG", "warn")
            .stdout(dev_full)
            .output()
            .expect("crashkit should spawn");

        assert_eq!(termination(&output), Termination::Signaled(libc::SIGABRT));
        assert!(stderr(&output).contains("could not write diagnostic snapshot"));
    }

    #[test]
    fn closed_pipe_does_not_stop_the_fault() {
        use std::os::unix::process::ExitStatusExt;

        let mut child = StdCommand::new(env!("CARGO_BIN_EXE_crashkit"))
            .arg("--crt-abort")
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .expect("crashkit should spawn");
        drop(child.stdout.take());

        let status = child.wait().expect("crashkit should finish");
        assert_eq!(status.signal(), Some(libc::SIGABRT));
    }
}
