//! The fault catalog.
//!
//! Every fault the harness can produce is listed here, once. Flag names are
//! a stable contract: automated harnesses invoke the tool by flag, so a
//! flag is never renamed, only aliased.

use serde::Serialize;
use std::fmt;

/// One reproducible failure mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FaultKind {
    /// Panic with no handler on the stack; unwinds out of `main`.
    UncaughtException,
    /// Non-unwinding immediate abort.
    FailFast,
    /// Non-unwinding abort that reports an inner error chain first.
    FailFastWithCause,
    /// Unbounded non-tail recursion.
    StackOverflow,
    /// `debug_assert!` on a false condition.
    DebugAssert,
    /// Native access-violation exception raised through the OS.
    RaiseAccessViolation,
    /// Raw write far outside a heap allocation.
    InvalidUnsafe,
    /// The C runtime's `abort()`.
    CrtAbort,
    /// OS-level termination of the current process.
    TerminateProcess,
}

impl FaultKind {
    pub const ALL: [FaultKind; 9] = [
        FaultKind::UncaughtException,
        FaultKind::FailFast,
        FaultKind::FailFastWithCause,
        FaultKind::StackOverflow,
        FaultKind::DebugAssert,
        FaultKind::RaiseAccessViolation,
        FaultKind::InvalidUnsafe,
        FaultKind::CrtAbort,
        FaultKind::TerminateProcess,
    ];

    /// The catalog entry for this kind.
    pub fn entry(self) -> &'static FaultEntry {
        // CATALOG is declared in FaultKind::ALL order.
        &CATALOG[self as usize]
    }

    pub fn flag(self) -> &'static str {
        self.entry().flag
    }

    pub fn description(self) -> &'static str {
        self.entry().description
    }

    pub fn is_available(self) -> bool {
        self.entry().available
    }
}

impl fmt::Display for FaultKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.flag())
    }
}

/// A catalog row: the flag that requests a fault and how it is described.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaultEntry {
    pub kind: FaultKind,
    /// Canonical flag, including the leading `--`.
    pub flag: &'static str,
    /// Older flag names accepted for the same fault; never shown in usage.
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    /// Fixed at build time. Unavailable entries are listed but refused.
    pub available: bool,
}

impl FaultEntry {
    /// Flag without the leading dashes, as used for argument ids.
    pub fn name(&self) -> &'static str {
        self.flag.trim_start_matches('-')
    }

    fn matches(&self, flag: &str) -> bool {
        self.flag.eq_ignore_ascii_case(flag)
            || self.aliases.iter().any(|alias| alias.eq_ignore_ascii_case(flag))
    }
}

pub const CATALOG: &[FaultEntry] = &[
    FaultEntry {
        kind: FaultKind::UncaughtException,
        flag: "--uncaught-exception",
        aliases: &[],
        description: "panic with no handler; unwinds to termination",
        available: true,
    },
    FaultEntry {
        kind: FaultKind::FailFast,
        flag: "--fail-fast",
        aliases: &[],
        description: "abort immediately without unwinding",
        available: true,
    },
    FaultEntry {
        kind: FaultKind::FailFastWithCause,
        flag: "--fail-fast-exception",
        aliases: &[],
        description: "abort immediately, reporting an inner error chain",
        available: true,
    },
    FaultEntry {
        kind: FaultKind::StackOverflow,
        flag: "--stack-overflow",
        aliases: &[],
        description: "recurse without a base case until the stack is exhausted",
        available: true,
    },
    FaultEntry {
        kind: FaultKind::DebugAssert,
        flag: "--debug-assert",
        aliases: &[],
        description: "fail a debug assertion (debug builds only)",
        available: cfg!(debug_assertions),
    },
    FaultEntry {
        kind: FaultKind::RaiseAccessViolation,
        flag: "--raise-av-exception",
        aliases: &["--raise-exception"],
        description: "raise a native access-violation exception through the OS",
        available: true,
    },
    FaultEntry {
        kind: FaultKind::InvalidUnsafe,
        flag: "--invalid-unsafe",
        aliases: &[],
        description: "write far outside a heap allocation through a raw pointer",
        available: true,
    },
    FaultEntry {
        kind: FaultKind::CrtAbort,
        flag: "--crt-abort",
        aliases: &[],
        description: "call the C runtime's abort()",
        available: true,
    },
    FaultEntry {
        kind: FaultKind::TerminateProcess,
        flag: "--terminate-process",
        aliases: &[],
        description: "have the OS terminate the process, skipping runtime shutdown",
        available: true,
    },
];

/// Resolve a flag to its catalog entry.
///
/// Matching is case-insensitive and exact; aliases resolve to the same
/// entry as the canonical flag.
pub fn lookup(flag: &str) -> Option<&'static FaultEntry> {
    CATALOG.iter().find(|entry| entry.matches(flag))
}
