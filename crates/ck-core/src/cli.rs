//! Command-line surface.
//!
//! `crashkit [OPTIONS] MODE [MODE ...]`. clap checks the grammar; the run
//! itself is a left-to-right sequence, which `dispatch::parse_args` reads
//! back from the normalized tokens.
//!
//! clap's own `--help`/`--version` are disabled: `--help` is part of the
//! usage path and exits with the usage code.

use crate::catalog::{self, CATALOG};
use clap::{Arg, ArgAction, Command};

pub const BIN_NAME: &str = "crashkit";

pub const ERROR_MODE_FLAG: &str = "--error-mode";
pub const THREAD_ERROR_MODE_FLAG: &str = "--thread-error-mode";
pub const HELP_FLAG: &str = "--help";

/// Argument ids (flag without the leading dashes).
pub const ERROR_MODE_ID: &str = "error-mode";
pub const THREAD_ERROR_MODE_ID: &str = "thread-error-mode";
pub const HELP_ID: &str = "help";

const OPTION_FLAGS: &[&str] = &[ERROR_MODE_FLAG, THREAD_ERROR_MODE_FLAG, HELP_FLAG];

/// The clap command. Every catalog entry becomes a countable flag so
/// repeated modes still parse; only the first one ever runs.
pub fn command() -> Command {
    let mut cmd = Command::new(BIN_NAME)
        .disable_help_flag(true)
        .disable_version_flag(true)
        .disable_help_subcommand(true)
        .arg(
            Arg::new(ERROR_MODE_ID)
                .long(ERROR_MODE_ID)
                .value_name("VALUE")
                .num_args(1)
                .action(ArgAction::Append),
        )
        .arg(
            Arg::new(THREAD_ERROR_MODE_ID)
                .long(THREAD_ERROR_MODE_ID)
                .value_name("VALUE")
                .num_args(1)
                .action(ArgAction::Append),
        )
        .arg(Arg::new(HELP_ID).long(HELP_ID).action(ArgAction::Count));

    for entry in CATALOG {
        cmd = cmd.arg(
            Arg::new(entry.name())
                .long(entry.name())
                .action(ArgAction::Count),
        );
    }
    cmd
}

/// Rewrite flag tokens to their canonical spelling.
///
/// Mode and option flags are matched case-insensitively and mode aliases
/// are replaced by the canonical flag. `--flag=value` keeps its value
/// untouched. Anything unrecognized passes through for clap to reject.
pub fn normalize_args<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| {
            if !arg.starts_with("--") {
                return arg;
            }
            let (flag, value) = match arg.split_once('=') {
                Some((flag, value)) => (flag, Some(value)),
                None => (arg.as_str(), None),
            };
            let canonical = catalog::lookup(flag).map(|entry| entry.flag).or_else(|| {
                OPTION_FLAGS
                    .iter()
                    .copied()
                    .find(|option| option.eq_ignore_ascii_case(flag))
            });
            let rewritten = canonical.map(|canonical| match value {
                Some(value) => format!("{canonical}={value}"),
                None => canonical.to_string(),
            });
            rewritten.unwrap_or(arg)
        })
        .collect()
}

/// Usage text, listing every catalog mode.
pub fn usage() -> String {
    let mut text = format!("Usage: {BIN_NAME} [OPTIONS] MODE [MODE ...]\n\n");
    text.push_str("Arguments are processed left to right; the first mode is terminal.\n\n");
    text.push_str("Options:\n");
    let options = [
        (
            format!("{ERROR_MODE_FLAG} VALUE"),
            "set the process error mode (hex, optional 0x prefix)",
        ),
        (
            format!("{THREAD_ERROR_MODE_FLAG} VALUE"),
            "set the calling thread's error mode (hex, optional 0x prefix)",
        ),
        (HELP_FLAG.to_string(), "print this text"),
    ];
    for (flag, description) in &options {
        text.push_str(&format!("  {flag:<28} {description}\n"));
    }

    text.push_str("\nModes:\n");
    for entry in CATALOG {
        let suffix = if entry.available {
            ""
        } else {
            " (unavailable in this build)"
        };
        text.push_str(&format!(
            "  {:<28} {}{}\n",
            entry.flag, entry.description, suffix
        ));
    }
    text
}
