//! Fuzz target for argument list resolution.
//!
//! Parsing only builds a request; nothing is configured or triggered, so
//! arbitrary argument lists are safe to feed in.

#![no_main]

use arbitrary::Arbitrary;
use ck_core::dispatch::{parse_args, ParseOutcome};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
struct Input {
    args: Vec<String>,
}

fuzz_target!(|input: Input| {
    let argv = std::iter::once("crashkit".to_string()).chain(input.args);
    match parse_args(argv) {
        Ok(ParseOutcome::Run(request)) => {
            // A resolved request always names a fault.
            assert!(request.first_fault().is_some());
        }
        Ok(ParseOutcome::Help) => {}
        Err(err) => assert!(err.is_usage()),
    }
});
