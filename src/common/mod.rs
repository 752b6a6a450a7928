//! Common utilities shared by the CLI and the test pipeline

pub mod config;
pub mod error;
pub mod logging;

pub use error::{Error, Result};
