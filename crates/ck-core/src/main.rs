//! crashkit - controlled fault injection
//!
//! Crashes its own process through a named mechanism so crash reporters,
//! core-dump collectors and watchdogs can be checked against a known,
//! labeled failure. A run that ends normally is a failed run.

use ck_core::cli;
use ck_core::config::HarnessConfig;
use ck_core::dispatch::{DispatchOutcome, Dispatcher};
use ck_core::executor::NativeFaultRunner;
use ck_core::exit_codes::ExitCode;
use ck_core::logging::{event_names, init_logging, LogConfig};
use ck_core::platform;
use std::io::Write;

fn main() {
    init_logging(&LogConfig::from_env());

    let args: Vec<String> = std::env::args_os()
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();

    if args.len() <= 1 {
        eprint!("{}", cli::usage());
        std::process::exit(ExitCode::Usage.as_i32());
    }

    let code = run(args);
    std::process::exit(code.as_i32());
}

fn run(args: Vec<String>) -> ExitCode {
    let config = HarnessConfig::from_build();
    let platform = platform::native();
    let runner = NativeFaultRunner::new(&platform, config.terminate_exit_code);
    let mut dispatcher = Dispatcher::new(&platform, &runner, &config);

    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    let code = match dispatcher.dispatch(args, &mut out) {
        Ok(DispatchOutcome::Help) => {
            let _ = write!(out, "{}", cli::usage());
            ExitCode::Usage
        }
        Ok(DispatchOutcome::Returned(returned)) => {
            let _ = writeln!(out, "{returned}");
            ExitCode::DidNotCrash
        }
        Err(err) if err.is_usage() => {
            eprintln!("error: {err}\n");
            eprint!("{}", cli::usage());
            ExitCode::Usage
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::ConfigError
        }
    };

    tracing::debug!(
        target: event_names::RUN_EXIT,
        run_id = %dispatcher.run_id(),
        exit_code = code.as_i32(),
        code = code.code_name(),
        message = "run ended without a crash"
    );
    code
}
