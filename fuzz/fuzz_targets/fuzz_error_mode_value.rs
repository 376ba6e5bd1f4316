//! Fuzz target for error-mode value parsing.
//!
//! Any string must either parse to a value whose hex rendering parses back
//! to itself, or return an error. Never panic.

#![no_main]

use ck_common::ErrorModeValue;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    if let Ok(value) = text.parse::<ErrorModeValue>() {
        let rendered = value.to_string();
        assert_eq!(rendered.parse::<ErrorModeValue>().ok(), Some(value));
    }
});
