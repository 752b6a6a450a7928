//! imptest - Electric Imp test runner
//!
//! This library uploads unit tests to an Electric Imp model through the
//! Build API and turns the resulting device log feed into a verdict.

pub mod build_api;
pub mod cli;
pub mod commands;
pub mod common;
pub mod testing;

// Re-export commonly used types for tests
pub use common::{Error, Result};
