//! Test run pipeline
//!
//! Finds test files, uploads each one to the model together with the
//! project sources, and turns the device log feed into a pass/fail verdict.

mod discovery;
mod monitor;
mod reporter;
mod runner;

#[cfg(test)]
mod scripted;

pub use discovery::{discover, TestFile, TestKind};
pub use monitor::{LogMonitor, RunVerdict, DEFAULT_POLL_INTERVAL};
pub use reporter::{Category, ConsoleReporter, MemoryReporter, Reporter};
pub use runner::{FileOutcome, RunSettings, RunSummary, TestRunner};
