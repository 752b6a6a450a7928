//! Error types for imptest
//!
//! Each variant maps to one way a test run can end badly. Run-level errors
//! (`NotFound`, `Service`, `MalformedLog`, `Timeout`) abort a single test
//! file; configuration errors abort the whole command.

use std::io;
use std::time::Duration;
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for imptest
#[derive(Error, Debug)]
pub enum Error {
    // === Run Errors ===
    #[error("File \"{0}\" not found")]
    NotFound(String),

    #[error("Build API request failed: {0}")]
    Service(String),

    #[error("Build API returned {status}: {message}")]
    ServiceStatus { status: u16, message: String },

    #[error("Malformed log line {line:?}: {reason}")]
    MalformedLog { line: String, reason: String },

    #[error("Timed out after {} seconds waiting for test results", .0.as_secs())]
    Timeout(Duration),

    // === Configuration Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid configuration file '{path}': {reason}")]
    ConfigParse { path: String, reason: String },

    // === IO Errors ===
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file '{path}': {error}")]
    FileRead { path: String, error: String },

    // === Serialization Errors ===
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a malformed log error for a raw payload
    pub fn malformed_log(line: &str, reason: impl ToString) -> Self {
        Self::MalformedLog {
            line: line.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Create a file read error, mapping a missing file to `NotFound`
    pub fn file_read(path: &std::path::Path, error: io::Error) -> Self {
        if error.kind() == io::ErrorKind::NotFound {
            Self::NotFound(path.display().to_string())
        } else {
            Self::FileRead {
                path: path.display().to_string(),
                error: error.to_string(),
            }
        }
    }

    /// Whether the error came from the Build API
    pub fn is_service(&self) -> bool {
        matches!(self, Self::Service(_) | Self::ServiceStatus { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_missing_file_maps_to_not_found() {
        let err = Error::file_read(
            Path::new("agent.nut"),
            io::Error::new(io::ErrorKind::NotFound, "gone"),
        );
        assert!(matches!(err, Error::NotFound(ref p) if p == "agent.nut"));
    }

    #[test]
    fn test_other_read_errors_keep_reason() {
        let err = Error::file_read(
            Path::new("agent.nut"),
            io::Error::new(io::ErrorKind::PermissionDenied, "denied"),
        );
        assert!(matches!(err, Error::FileRead { .. }));
        assert!(err.to_string().contains("denied"));
    }

    #[test]
    fn test_timeout_message() {
        let err = Error::Timeout(Duration::from_secs(30));
        assert_eq!(
            err.to_string(),
            "Timed out after 30 seconds waiting for test results"
        );
    }
}
