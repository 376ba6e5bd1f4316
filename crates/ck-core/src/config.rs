//! Harness configuration.
//!
//! There is no configuration file. The values here are fixed when the
//! binary is built (overridable through `CRASHKIT_RUNTIME_LABEL` and
//! `CRASHKIT_ENV_PREFIXES` at compile time) and handed to the dispatcher
//! at startup. Tests construct them directly.

use crate::exit_codes::ExitCode;

/// Name used in the runtime identity label.
pub const RUNTIME_NAME: &str = "crashkit";

/// Environment prefixes reported in the diagnostic snapshot.
///
/// These are the namespaces that change how the Rust runtime, the allocator
/// and sanitizers behave when a fault happens.
pub const DEFAULT_ENV_PREFIXES: &[&str] = &[
    "RUST_", "CRASHKIT_", "MALLOC_", "ASAN_", "LSAN_", "MSAN_", "TSAN_", "UBSAN_",
];

/// Startup configuration for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HarnessConfig {
    /// Static identity printed in the diagnostic snapshot.
    pub runtime_label: String,
    /// Environment variables starting with one of these are reported.
    pub env_prefixes: Vec<String>,
    /// Exit code passed to the OS by `--terminate-process`.
    pub terminate_exit_code: i32,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        HarnessConfig {
            runtime_label: default_runtime_label(),
            env_prefixes: DEFAULT_ENV_PREFIXES.iter().map(|p| p.to_string()).collect(),
            terminate_exit_code: ExitCode::Terminated.as_i32(),
        }
    }
}

impl HarnessConfig {
    /// Configuration baked into this binary.
    pub fn from_build() -> Self {
        let mut config = HarnessConfig::default();
        if let Some(label) = option_env!("CRASHKIT_RUNTIME_LABEL") {
            config.runtime_label = label.to_string();
        }
        if let Some(prefixes) = option_env!("CRASHKIT_ENV_PREFIXES") {
            config.env_prefixes = parse_prefix_list(prefixes);
        }
        config
    }

    pub fn with_runtime_label(mut self, label: impl Into<String>) -> Self {
        self.runtime_label = label.into();
        self
    }

    pub fn with_env_prefixes<I, S>(mut self, prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.env_prefixes = prefixes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_terminate_exit_code(mut self, code: i32) -> Self {
        self.terminate_exit_code = code;
        self
    }
}

/// `debug` when debug assertions are compiled in, `release` otherwise.
pub fn build_profile() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "release"
    }
}

/// e.g. `crashkit 0.1.0 (linux-x86_64, debug)`.
pub fn default_runtime_label() -> String {
    format!(
        "{} {} ({}-{}, {})",
        RUNTIME_NAME,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH,
        build_profile()
    )
}

/// Split a comma-separated prefix list, dropping blanks.
pub fn parse_prefix_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(str::to_string)
        .collect()
}
