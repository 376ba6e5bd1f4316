//! crashkit core library
//!
//! This library provides the fault-injection engine:
//! - The closed fault catalog and its flag lookup
//! - The fault executor and the platform facade it runs on
//! - Error-mode configuration and pre-fault diagnostic capture
//! - The dispatcher that turns an argument list into one terminal fault
//!
//! The binary entry point is in `main.rs`.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod executor;
pub mod exit_codes;
pub mod logging;
pub mod platform;
