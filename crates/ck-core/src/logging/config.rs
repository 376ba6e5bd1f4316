//! Logging configuration.
//!
//! Supports configuration via environment variables (CRASHKIT_LOG,
//! RUST_LOG, CRASHKIT_LOG_FORMAT). They only affect log output, never the
//! fault that runs.

use serde::{Deserialize, Serialize};

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format (default).
    #[default]
    Human,
    /// Machine-parseable JSON lines.
    Jsonl,
}

impl std::str::FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "human" | "console" | "pretty" => Ok(LogFormat::Human),
            "jsonl" | "json" => Ok(LogFormat::Jsonl),
            _ => Err(format!("unknown log format: {}", s)),
        }
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogFormat::Human => write!(f, "human"),
            LogFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

/// Log level filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    /// Default: keeps stderr quiet apart from problems and the fault itself.
    #[default]
    Warn,
    Error,
    Off,
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "trace" => Ok(LogLevel::Trace),
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warn),
            "error" => Ok(LogLevel::Error),
            "off" | "none" | "quiet" => Ok(LogLevel::Off),
            _ => Err(format!("unknown log level: {}", s)),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogLevel::Trace => write!(f, "trace"),
            LogLevel::Debug => write!(f, "debug"),
            LogLevel::Info => write!(f, "info"),
            LogLevel::Warn => write!(f, "warn"),
            LogLevel::Error => write!(f, "error"),
            LogLevel::Off => write!(f, "off"),
        }
    }
}

impl From<LogLevel> for tracing_subscriber::filter::LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => tracing_subscriber::filter::LevelFilter::TRACE,
            LogLevel::Debug => tracing_subscriber::filter::LevelFilter::DEBUG,
            LogLevel::Info => tracing_subscriber::filter::LevelFilter::INFO,
            LogLevel::Warn => tracing_subscriber::filter::LevelFilter::WARN,
            LogLevel::Error => tracing_subscriber::filter::LevelFilter::ERROR,
            LogLevel::Off => tracing_subscriber::filter::LevelFilter::OFF,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub format: LogFormat,
    pub level: LogLevel,
}

impl LogConfig {
    /// Create config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Create config from an arbitrary variable lookup.
    ///
    /// CRASHKIT_LOG takes precedence over RUST_LOG. Unparseable values are
    /// ignored rather than failing the run.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = LogConfig::default();

        if let Some(val) = lookup("CRASHKIT_LOG") {
            if let Ok(level) = val.parse::<LogLevel>() {
                config.level = level;
            }
        } else if let Some(val) = lookup("RUST_LOG") {
            if let Some(level) = loudest_directive_level(&val) {
                config.level = level;
            }
        }

        if let Some(val) = lookup("CRASHKIT_LOG_FORMAT") {
            if let Ok(format) = val.parse::<LogFormat>() {
                config.format = format;
            }
        }

        config
    }

    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }
}

impl LogLevel {
    /// Higher is more verbose; `Off` is the quietest.
    fn verbosity(self) -> u8 {
        match self {
            LogLevel::Off => 0,
            LogLevel::Error => 1,
            LogLevel::Warn => 2,
            LogLevel::Info => 3,
            LogLevel::Debug => 4,
            LogLevel::Trace => 5,
        }
    }
}

/// Most verbose level named in a `RUST_LOG` directive list.
///
/// Each directive is `level`, `target=level` or a bare `target`. Only the
/// level part counts, so a target named `trace_tool` enables nothing.
/// Bare targets and unparseable levels are skipped.
fn loudest_directive_level(directives: &str) -> Option<LogLevel> {
    directives
        .split(',')
        .map(str::trim)
        .filter(|directive| !directive.is_empty())
        .filter_map(|directive| {
            let level = directive
                .rsplit_once('=')
                .map_or(directive, |(_, level)| level);
            level.parse::<LogLevel>().ok()
        })
        .max_by_key(|level| level.verbosity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_in(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_log_format_parse() {
        assert_eq!("human".parse::<LogFormat>().unwrap(), LogFormat::Human);
        assert_eq!("jsonl".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert_eq!("JSON".parse::<LogFormat>().unwrap(), LogFormat::Jsonl);
        assert!("xml".parse::<LogFormat>().is_err());
    }

    #[test]
    fn test_log_level_parse() {
        assert_eq!("trace".parse::<LogLevel>().unwrap(), LogLevel::Trace);
        assert_eq!("warning".parse::<LogLevel>().unwrap(), LogLevel::Warn);
        assert_eq!("quiet".parse::<LogLevel>().unwrap(), LogLevel::Off);
        assert!("loud".parse::<LogLevel>().is_err());
    }

    #[test]
    fn test_defaults() {
        let config = LogConfig::from_lookup(lookup_in(&[]));
        assert_eq!(config.format, LogFormat::Human);
        assert_eq!(config.level, LogLevel::Warn);
    }

    #[test]
    fn test_crashkit_log_wins_over_rust_log() {
        let config = LogConfig::from_lookup(lookup_in(&[
            ("CRASHKIT_LOG", "error"),
            ("RUST_LOG", "debug"),
        ]));
        assert_eq!(config.level, LogLevel::Error);
    }

    #[test]
    fn test_rust_log_directives() {
        let config = LogConfig::from_lookup(lookup_in(&[("RUST_LOG", "ck_core=debug,hyper=warn")]));
        assert_eq!(config.level, LogLevel::Debug);
    }

    #[test]
    fn test_rust_log_quiet_levels_apply() {
        let off = LogConfig::from_lookup(lookup_in(&[("RUST_LOG", "off")]));
        assert_eq!(off.level, LogLevel::Off);

        let warn = LogConfig::from_lookup(lookup_in(&[("RUST_LOG", "warn")]));
        assert_eq!(warn.level, LogLevel::Warn);

        let error = LogConfig::from_lookup(lookup_in(&[("RUST_LOG", "ck_core=error")]));
        assert_eq!(error.level, LogLevel::Error);
    }

    #[test]
    fn test_rust_log_target_names_do_not_set_level() {
        let config = LogConfig::from_lookup(lookup_in(&[("RUST_LOG", "trace_tool=warn")]));
        assert_eq!(config.level, LogLevel::Warn);

        let bare = LogConfig::from_lookup(lookup_in(&[("RUST_LOG", "debugger_shim")]));
        assert_eq!(bare.level, LogLevel::Warn);
    }

    #[test]
    fn test_format_from_env() {
        let config = LogConfig::from_lookup(lookup_in(&[("CRASHKIT_LOG_FORMAT", "jsonl")]));
        assert_eq!(config.format, LogFormat::Jsonl);
    }

    #[test]
    fn test_builder() {
        let config = LogConfig::default()
            .with_format(LogFormat::Jsonl)
            .with_level(LogLevel::Debug);
        assert_eq!(config.format, LogFormat::Jsonl);
        assert_eq!(config.level, LogLevel::Debug);
    }
}
