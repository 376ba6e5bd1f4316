//! crashkit common types and errors.
//!
//! This crate provides the vocabulary shared by the fault harness:
//! - Error-mode bitmask values and their text form
//! - The unified error type and its usage/configuration classification

pub mod error;
pub mod error_mode;

pub use error::{Error, Result};
pub use error_mode::{ErrorModeScope, ErrorModeValue, ParseErrorModeError};
