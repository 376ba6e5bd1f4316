//! Pre-fault diagnostic snapshot.
//!
//! Written to stdout immediately before a fault so a harness capturing the
//! output can line up the pre-crash state with the crash artifact it gets.

use crate::config::HarnessConfig;
use crate::platform::Platform;
use chrono::{DateTime, SecondsFormat, Utc};
use ck_common::ErrorModeValue;
use serde::Serialize;
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::fmt::Write as _;
use std::io::{self, Write};

/// State captured right before a fault runs. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DiagnosticSnapshot {
    pub run_id: String,
    pub captured_at: DateTime<Utc>,
    pub runtime: String,
    pub process_error_mode: ErrorModeValue,
    pub thread_error_mode: ErrorModeValue,
    /// Matching environment variables, sorted by name.
    pub environment: BTreeMap<String, String>,
}

impl DiagnosticSnapshot {
    /// Capture from the live process environment.
    pub fn capture(platform: &dyn Platform, config: &HarnessConfig, run_id: &str) -> Self {
        Self::capture_from(platform, config, run_id, std::env::vars_os())
    }

    /// Capture using an explicit set of environment variables.
    pub fn capture_from<I>(
        platform: &dyn Platform,
        config: &HarnessConfig,
        run_id: &str,
        vars: I,
    ) -> Self
    where
        I: IntoIterator<Item = (OsString, OsString)>,
    {
        let environment = vars
            .into_iter()
            .map(|(name, value)| {
                (
                    name.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .filter(|(name, _)| has_recognized_prefix(name, &config.env_prefixes))
            .collect();

        DiagnosticSnapshot {
            run_id: run_id.to_string(),
            captured_at: Utc::now(),
            runtime: config.runtime_label.clone(),
            process_error_mode: platform.process_error_mode(),
            thread_error_mode: platform.thread_error_mode(),
            environment,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "crashkit diagnostic snapshot");
        let _ = writeln!(out, "  run id:             {}", self.run_id);
        let _ = writeln!(
            out,
            "  captured at:        {}",
            self.captured_at.to_rfc3339_opts(SecondsFormat::Millis, true)
        );
        let _ = writeln!(out, "  runtime:            {}", self.runtime);
        let _ = writeln!(out, "  process error mode: {}", self.process_error_mode);
        let _ = writeln!(out, "  thread error mode:  {}", self.thread_error_mode);
        let _ = writeln!(out, "  environment:");
        if self.environment.is_empty() {
            let _ = writeln!(out, "    (none)");
        }
        for (name, value) in &self.environment {
            let _ = writeln!(out, "    {name}={value}");
        }
        out
    }

    /// Write the rendered snapshot and flush, so it survives an abort.
    pub fn write_to(&self, out: &mut dyn Write) -> io::Result<()> {
        out.write_all(self.render().as_bytes())?;
        out.flush()
    }
}

/// Prefix match, ignoring ASCII case (Windows variable names are
/// case-insensitive).
fn has_recognized_prefix(name: &str, prefixes: &[String]) -> bool {
    prefixes.iter().any(|prefix| {
        name.len() >= prefix.len()
            && name.as_bytes()[..prefix.len()].eq_ignore_ascii_case(prefix.as_bytes())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::MockPlatform;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(OsString, OsString)> {
        pairs
            .iter()
            .map(|(k, v)| (OsString::from(k), OsString::from(v)))
            .collect()
    }

    #[test]
    fn test_filters_environment_by_prefix() {
        let platform = MockPlatform::new();
        let config = HarnessConfig::default().with_env_prefixes(["RUST_", "MALLOC_"]);
        let snapshot = DiagnosticSnapshot::capture_from(
            &platform,
            &config,
            "run-test",
            vars(&[
                ("RUST_BACKTRACE", "1"),
                ("HOME", "/root"),
                ("MALLOC_CHECK_", "3"),
                ("PATH", "/bin"),
                ("TRUST_LEVEL", "high"),
            ]),
        );

        let names: Vec<&str> = snapshot.environment.keys().map(String::as_str).collect();
        assert_eq!(names, ["MALLOC_CHECK_", "RUST_BACKTRACE"]);
    }

    #[test]
    fn test_prefix_match_ignores_case() {
        let prefixes = vec!["RUST_".to_string()];
        assert!(has_recognized_prefix("rust_log", &prefixes));
        assert!(!has_recognized_prefix("RUS", &prefixes));
    }

    #[test]
    fn test_reads_error_modes_from_platform() {
        use ck_common::ErrorModeValue;

        let platform = MockPlatform::new();
        platform
            .set_process_error_mode(ErrorModeValue::new(0x8001))
            .unwrap();
        platform
            .set_thread_error_mode(ErrorModeValue::new(0x10))
            .unwrap();

        let snapshot =
            DiagnosticSnapshot::capture_from(&platform, &HarnessConfig::default(), "run-x", vars(&[]));
        assert_eq!(snapshot.process_error_mode, ErrorModeValue::new(0x8001));
        assert_eq!(snapshot.thread_error_mode, ErrorModeValue::new(0x10));
    }

    #[test]
    fn test_render_lists_all_fields() {
        let platform = MockPlatform::new();
        let config = HarnessConfig::default().with_runtime_label("crashkit test");
        let snapshot = DiagnosticSnapshot::capture_from(
            &platform,
            &config,
            "run-abc",
            vars(&[("RUST_MIN_STACK", "65536")]),
        );

        let text = snapshot.render();
        assert!(text.contains("run id:             run-abc"));
        assert!(text.contains("runtime:            crashkit test"));
        assert!(text.contains("process error mode: 0x00000000"));
        assert!(text.contains("thread error mode:  0x00000000"));
        assert!(text.contains("    RUST_MIN_STACK=65536"));
    }

    #[test]
    fn test_render_marks_empty_environment() {
        let platform = MockPlatform::new();
        let snapshot = DiagnosticSnapshot::capture_from(
            &platform,
            &HarnessConfig::default(),
            "run-abc",
            vars(&[("HOME", "/root")]),
        );
        assert!(snapshot.render().contains("    (none)"));
    }

    #[test]
    fn test_write_to_emits_render() {
        let platform = MockPlatform::new();
        let snapshot = DiagnosticSnapshot::capture_from(
            &platform,
            &HarnessConfig::default(),
            "run-abc",
            vars(&[]),
        );
        let mut buffer = Vec::new();
        snapshot.write_to(&mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), snapshot.render());
    }

    #[test]
    fn test_serializes_to_json() {
        let platform = MockPlatform::new();
        let snapshot = DiagnosticSnapshot::capture_from(
            &platform,
            &HarnessConfig::default(),
            "run-abc",
            vars(&[("RUST_BACKTRACE", "full")]),
        );
        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["run_id"], "run-abc");
        assert_eq!(json["process_error_mode"], 0);
        assert_eq!(json["environment"]["RUST_BACKTRACE"], "full");
    }
}
