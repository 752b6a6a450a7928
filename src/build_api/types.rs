//! Build API message types
//!
//! Wire shapes for revisions and device logs, plus the payload format the
//! on-device unit test runner writes into each log message.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::common::{Error, Result};

// === Revisions ===

/// A deployed build of agent + device code
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Revision {
    pub version: u64,
    /// Creation time as reported by the service; used as the log watermark
    pub created_at: String,
}

/// Body of a create-revision request
#[derive(Debug, Serialize)]
pub struct CreateRevisionRequest<'a> {
    pub device_code: &'a str,
    pub agent_code: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct CreateRevisionResponse {
    pub revision: Revision,
}

// === Logs ===

/// Which side of the model produced a log entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
pub enum LogSource {
    #[serde(rename = "agent.log", alias = "agent")]
    Agent,
    #[serde(rename = "device.log", alias = "device")]
    Device,
    /// Status and server messages; never monitored
    #[serde(other)]
    Other,
}

impl fmt::Display for LogSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogSource::Agent => write!(f, "agent"),
            LogSource::Device => write!(f, "device"),
            LogSource::Other => write!(f, "other"),
        }
    }
}

/// One raw entry of the device log feed
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LogEntry {
    #[serde(rename = "type")]
    pub source: LogSource,
    /// JSON-encoded [`ParsedLine`]
    pub message: String,
    #[serde(default)]
    pub timestamp: String,
}

impl LogEntry {
    /// Content fingerprint of the entry
    ///
    /// Entries carry no server-assigned id, so two entries with the same
    /// source, timestamp and message are the same entry.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.source.to_string().as_bytes());
        hasher.update([0]);
        hasher.update(self.timestamp.as_bytes());
        hasher.update([0]);
        hasher.update(self.message.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Decode the message payload
    pub fn parse_line(&self) -> Result<ParsedLine> {
        serde_json::from_str(&self.message).map_err(|e| Error::malformed_log(&self.message, e))
    }
}

#[derive(Debug, Deserialize)]
pub struct LogsResponse {
    #[serde(default)]
    pub logs: Vec<LogEntry>,
}

// === Test runner payloads ===

/// A decoded test runner message
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "type", content = "message")]
pub enum ParsedLine {
    #[serde(rename = "STATUS")]
    Status(String),
    #[serde(rename = "FAIL")]
    Fail(String),
    #[serde(rename = "RESULT")]
    Result(ResultCounts),
}

/// Final counts reported by the test runner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ResultCounts {
    pub tests: u64,
    pub assertions: u64,
    pub failures: u64,
}

impl fmt::Display for ResultCounts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tests: {}, assertions: {}, failures: {}",
            self.tests, self.assertions, self.failures
        )
    }
}

// === Errors ===

/// Error envelope returned with non-2xx responses
#[derive(Debug, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub code: String,
    #[serde(default)]
    pub message_short: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(source: &str, message: &str) -> LogEntry {
        serde_json::from_value(serde_json::json!({
            "type": source,
            "message": message,
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap()
    }

    #[test]
    fn test_log_source_names() {
        assert_eq!(entry("agent.log", "x").source, LogSource::Agent);
        assert_eq!(entry("agent", "x").source, LogSource::Agent);
        assert_eq!(entry("device.log", "x").source, LogSource::Device);
        assert_eq!(entry("status", "x").source, LogSource::Other);
    }

    #[test]
    fn test_parse_status_and_fail() {
        let line = entry("agent.log", r#"{"type":"STATUS","message":"suite::setUp()"}"#);
        assert_eq!(
            line.parse_line().unwrap(),
            ParsedLine::Status("suite::setUp()".to_string())
        );

        let line = entry("agent.log", r#"{"type":"FAIL","message":"assert failed"}"#);
        assert_eq!(
            line.parse_line().unwrap(),
            ParsedLine::Fail("assert failed".to_string())
        );
    }

    #[test]
    fn test_parse_result_counts() {
        let line = entry(
            "device.log",
            r#"{"type":"RESULT","message":{"tests":3,"assertions":5,"failures":1}}"#,
        );
        let parsed = line.parse_line().unwrap();
        assert_eq!(
            parsed,
            ParsedLine::Result(ResultCounts {
                tests: 3,
                assertions: 5,
                failures: 1
            })
        );
    }

    #[test]
    fn test_unknown_kind_is_malformed() {
        let line = entry("agent.log", r#"{"type":"DEBUG","message":"hi"}"#);
        assert!(matches!(line.parse_line(), Err(Error::MalformedLog { .. })));
    }

    #[test]
    fn test_non_json_is_malformed() {
        let line = entry("agent.log", "plain text log");
        assert!(matches!(line.parse_line(), Err(Error::MalformedLog { .. })));
    }

    #[test]
    fn test_fingerprint_is_content_based() {
        let a = entry("agent.log", "same");
        let b = entry("agent.log", "same");
        let c = entry("device.log", "same");
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_ne!(a.fingerprint(), c.fingerprint());

        let mut later = a.clone();
        later.timestamp = "2024-01-01T00:00:01Z".to_string();
        assert_ne!(a.fingerprint(), later.fingerprint());
    }
}
