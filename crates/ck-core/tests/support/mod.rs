//! Shared helpers for spawning crashkit and classifying how it died.

#![allow(dead_code)]
// Not every test file uses every helper.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use std::process::Output;

/// How a crashkit run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    Exited(i32),
    /// Killed by a signal (Unix only).
    Signaled(i32),
}

/// Get a Command for the crashkit binary.
pub fn crashkit() -> Command {
    let mut cmd = cargo_bin_cmd!("crashkit");
    // Keep the runtime's panic output short and stable.
    cmd.env_remove("RUST_BACKTRACE");
    cmd
}

/// Run crashkit with `args` and collect its output.
pub fn run(args: &[&str]) -> Output {
    crashkit()
        .args(args)
        .output()
        .expect("crashkit should spawn")
}

pub fn termination(output: &Output) -> Termination {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = output.status.signal() {
            return Termination::Signaled(signal);
        }
    }
    Termination::Exited(output.status.code().unwrap_or(-1))
}

pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

/// Pull the run id out of a diagnostic snapshot.
pub fn snapshot_run_id(stdout: &str) -> Option<String> {
    stdout
        .lines()
        .find_map(|line| line.trim().strip_prefix("run id:"))
        .map(|id| id.trim().to_string())
}
