//! The dispatcher.
//!
//! Turns an argument list into an [`InvocationRequest`] and runs it:
//!
//! ```text
//! ParsingArguments -> Configuring (0..n) -> ReportingState -> Executing -> (never) Done
//!        |                    |                                   |
//!        v                    v                                   v
//!    UsageError        (config error)                     UnexpectedReturn
//! ```
//!
//! The whole argument list is resolved before anything runs, so a usage
//! error never leaves an error mode half-applied. Steps then run strictly
//! left to right; the first fault step is terminal and everything after it
//! is unreachable.

use crate::catalog::{self, FaultKind};
use crate::cli::{self, ERROR_MODE_FLAG, HELP_FLAG, THREAD_ERROR_MODE_FLAG};
use crate::config::HarnessConfig;
use crate::diagnostics::DiagnosticSnapshot;
use crate::executor::{FaultReturned, FaultRunner};
use crate::log_event;
use crate::logging::{event_names, generate_run_id, LogContext, Stage};
use crate::platform::Platform;
use ck_common::{Error, ErrorModeScope, ErrorModeValue, Result};
use std::io::Write;

/// One resolved action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    SetProcessErrorMode(ErrorModeValue),
    SetThreadErrorMode(ErrorModeValue),
    Fault(FaultKind),
}

/// The resolved intent for one run.
///
/// Always contains at least one fault step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationRequest {
    steps: Vec<Step>,
}

impl InvocationRequest {
    pub fn new(steps: Vec<Step>) -> Result<Self> {
        if !steps.iter().any(|step| matches!(step, Step::Fault(_))) {
            return Err(Error::MissingMode);
        }
        Ok(InvocationRequest { steps })
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// The fault that will actually run.
    pub fn first_fault(&self) -> Option<FaultKind> {
        self.steps.iter().find_map(|step| match step {
            Step::Fault(kind) => Some(*kind),
            _ => None,
        })
    }
}

/// Result of parsing an argument list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// `--help` came before any fault.
    Help,
    Run(InvocationRequest),
}

/// Parse a full argument list, binary name first.
///
/// clap validates the grammar (unknown flags, missing values). The ordered
/// steps are then read back from the normalized tokens, since clap keeps
/// only the last position of a repeated flag.
pub fn parse_args<I, T>(args: I) -> Result<ParseOutcome>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    let normalized = cli::normalize_args(args);
    // Nothing after a leading `--help` is ever read, so it is not validated.
    let end = leading_help(&normalized).map_or(normalized.len(), |index| index + 1);
    let considered = &normalized[..end];
    cli::command()
        .try_get_matches_from(considered)
        .map_err(usage_error)?;

    let mut steps = Vec::new();
    let mut tokens = considered.iter().skip(1).map(String::as_str);
    while let Some(token) = tokens.next() {
        let (flag, inline_value) = match token.split_once('=') {
            Some((flag, value)) => (flag, Some(value)),
            None => (token, None),
        };

        if flag == HELP_FLAG {
            if !steps.iter().any(|step| matches!(step, Step::Fault(_))) {
                return Ok(ParseOutcome::Help);
            }
            continue;
        }

        if flag == ERROR_MODE_FLAG || flag == THREAD_ERROR_MODE_FLAG {
            let raw = inline_value
                .or_else(|| tokens.next())
                .ok_or_else(|| Error::MissingValue {
                    flag: flag.to_string(),
                })?;
            let value = raw
                .parse::<ErrorModeValue>()
                .map_err(|source| Error::InvalidValue {
                    flag: flag.to_string(),
                    source,
                })?;
            steps.push(if flag == ERROR_MODE_FLAG {
                Step::SetProcessErrorMode(value)
            } else {
                Step::SetThreadErrorMode(value)
            });
            continue;
        }

        let entry = catalog::lookup(flag)
            .ok_or_else(|| Error::UnrecognizedArgument(token.to_string()))?;
        if !entry.available {
            return Err(Error::ModeUnavailable {
                flag: entry.flag.to_string(),
            });
        }
        steps.push(Step::Fault(entry.kind));
    }

    InvocationRequest::new(steps).map(ParseOutcome::Run)
}

/// Index of a `--help` token that comes before any mode.
fn leading_help(tokens: &[String]) -> Option<usize> {
    let mut iter = tokens.iter().enumerate().skip(1);
    while let Some((index, token)) = iter.next() {
        if token == HELP_FLAG {
            return Some(index);
        }
        if token == ERROR_MODE_FLAG || token == THREAD_ERROR_MODE_FLAG {
            // Separate value.
            iter.next();
            continue;
        }
        let flag = token.split_once('=').map_or(token.as_str(), |(flag, _)| flag);
        if catalog::lookup(flag).is_some() {
            return None;
        }
    }
    None
}

/// Map a clap parse failure onto the harness's usage errors.
fn usage_error(err: clap::Error) -> Error {
    use clap::error::{ContextKind, ContextValue, ErrorKind};

    let invalid_arg = match err.get(ContextKind::InvalidArg) {
        Some(ContextValue::String(arg)) => arg.split_whitespace().next().map(str::to_string),
        _ => None,
    };

    match (err.kind(), invalid_arg) {
        (ErrorKind::UnknownArgument, Some(arg)) => Error::UnrecognizedArgument(arg),
        (ErrorKind::InvalidValue, Some(flag)) => Error::MissingValue { flag },
        (kind, _) => Error::Usage(kind.as_str().unwrap_or("invalid arguments").to_string()),
    }
}

/// Dispatcher states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    ParsingArguments,
    Configuring,
    ReportingState,
    Executing,
    /// Parsing failed or `--help` was requested.
    UsageError,
    /// A fault returned control.
    UnexpectedReturn,
}

/// How a dispatch ended without crashing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DispatchOutcome {
    Help,
    Returned(FaultReturned),
}

/// Drives one run from arguments to fault.
pub struct Dispatcher<'a> {
    platform: &'a dyn Platform,
    runner: &'a dyn FaultRunner,
    config: &'a HarnessConfig,
    ctx: LogContext,
    state: DispatchState,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        platform: &'a dyn Platform,
        runner: &'a dyn FaultRunner,
        config: &'a HarnessConfig,
    ) -> Self {
        Self::with_run_id(platform, runner, config, generate_run_id())
    }

    pub fn with_run_id(
        platform: &'a dyn Platform,
        runner: &'a dyn FaultRunner,
        config: &'a HarnessConfig,
        run_id: impl Into<String>,
    ) -> Self {
        Dispatcher {
            platform,
            runner,
            config,
            ctx: LogContext::new(run_id),
            state: DispatchState::ParsingArguments,
        }
    }

    pub fn state(&self) -> DispatchState {
        self.state
    }

    pub fn run_id(&self) -> &str {
        &self.ctx.run_id
    }

    /// Parse `args` (binary name first) and run the request.
    ///
    /// Returns only when the run did not crash: `--help`, or a fault that
    /// came back. Errors are usage or configuration failures.
    pub fn dispatch<I, T>(&mut self, args: I, out: &mut dyn Write) -> Result<DispatchOutcome>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.state = DispatchState::ParsingArguments;
        log_event!(
            self.ctx,
            DEBUG,
            event_names::RUN_STARTED,
            Stage::Parse,
            "resolving arguments",
            platform = self.platform.name()
        );

        let request = match parse_args(args) {
            Ok(ParseOutcome::Run(request)) => request,
            Ok(ParseOutcome::Help) => {
                self.state = DispatchState::UsageError;
                return Ok(DispatchOutcome::Help);
            }
            Err(err) => {
                self.state = DispatchState::UsageError;
                log_event!(
                    self.ctx,
                    DEBUG,
                    event_names::USAGE_ERROR,
                    Stage::Parse,
                    "argument list rejected",
                    code = err.code_name(),
                    error = %err
                );
                return Err(err);
            }
        };

        self.run(&request, out).map(DispatchOutcome::Returned)
    }

    /// Run a resolved request.
    pub fn run(&mut self, request: &InvocationRequest, out: &mut dyn Write) -> Result<FaultReturned> {
        for step in request.steps() {
            match *step {
                Step::SetProcessErrorMode(value) => {
                    self.configure(ErrorModeScope::Process, value)?;
                }
                Step::SetThreadErrorMode(value) => {
                    self.configure(ErrorModeScope::Thread, value)?;
                }
                Step::Fault(kind) => return Ok(self.execute(kind, out)),
            }
        }
        // InvocationRequest guarantees a fault step.
        Err(Error::MissingMode)
    }

    fn configure(&mut self, scope: ErrorModeScope, value: ErrorModeValue) -> Result<()> {
        self.state = DispatchState::Configuring;
        let result = match scope {
            ErrorModeScope::Process => self.platform.set_process_error_mode(value),
            ErrorModeScope::Thread => self.platform.set_thread_error_mode(value),
        };

        match result {
            Ok(previous) => {
                log_event!(
                    self.ctx,
                    INFO,
                    event_names::CONFIG_ERROR_MODE_SET,
                    Stage::Configure,
                    "error mode set",
                    scope = %scope,
                    value = %value,
                    previous = %previous
                );
                Ok(())
            }
            Err(source) => {
                let err = Error::ErrorMode {
                    scope,
                    value,
                    source,
                };
                log_event!(
                    self.ctx,
                    ERROR,
                    event_names::CONFIG_ERROR,
                    Stage::Configure,
                    "could not set error mode",
                    error = %err
                );
                Err(err)
            }
        }
    }

    fn execute(&mut self, kind: FaultKind, out: &mut dyn Write) -> FaultReturned {
        self.state = DispatchState::ReportingState;
        let snapshot = DiagnosticSnapshot::capture(self.platform, self.config, &self.ctx.run_id);
        // Best effort: a full disk or a closed pipe must not stop the fault.
        match snapshot.write_to(out) {
            Ok(()) => log_event!(
                self.ctx,
                DEBUG,
                event_names::DIAG_SNAPSHOT,
                Stage::Report,
                "diagnostic snapshot written",
                process_error_mode = %snapshot.process_error_mode,
                thread_error_mode = %snapshot.thread_error_mode,
                env_vars = snapshot.environment.len()
            ),
            Err(err) => log_event!(
                self.ctx,
                WARN,
                event_names::DIAG_SNAPSHOT_FAILED,
                Stage::Report,
                "could not write diagnostic snapshot",
                error = %err
            ),
        }

        self.state = DispatchState::Executing;
        log_event!(
            self.ctx,
            INFO,
            event_names::FAULT_TRIGGERING,
            Stage::Execute,
            "triggering fault",
            fault = %kind
        );

        let returned = self.runner.trigger(kind);

        self.state = DispatchState::UnexpectedReturn;
        log_event!(
            self.ctx,
            ERROR,
            event_names::FAULT_RETURNED,
            Stage::Execute,
            "fault returned control",
            fault = %kind,
            detail = %returned.detail
        );
        returned
    }
}
