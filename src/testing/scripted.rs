//! In-memory build service that replays scripted log polls

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::build_api::{BuildService, LogEntry, LogSource, Revision};
use crate::common::{Error, Result};

/// One scripted answer to `get_logs`
pub type Poll = std::result::Result<Vec<LogEntry>, String>;

/// Replays polls in order; once exhausted every poll repeats the last
/// successful batch, the way the real feed keeps returning old entries
#[derive(Default)]
pub struct ScriptedService {
    polls: Mutex<VecDeque<Poll>>,
    last: Mutex<Vec<LogEntry>>,
    fail_revision: Option<String>,
    pub uploads: Mutex<Vec<(String, String)>>,
    pub restarts: AtomicUsize,
    pub log_calls: AtomicUsize,
}

impl ScriptedService {
    pub fn new(polls: Vec<Poll>) -> Self {
        Self {
            polls: Mutex::new(polls.into()),
            ..Self::default()
        }
    }

    /// A service whose uploads always fail
    pub fn rejecting_uploads(reason: &str) -> Self {
        Self {
            fail_revision: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn log_calls(&self) -> usize {
        self.log_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BuildService for ScriptedService {
    async fn create_revision(
        &self,
        _model_id: &str,
        device_code: &str,
        agent_code: &str,
    ) -> Result<Revision> {
        if let Some(reason) = &self.fail_revision {
            return Err(Error::Service(reason.clone()));
        }
        let mut uploads = self.uploads.lock().unwrap();
        uploads.push((device_code.to_string(), agent_code.to_string()));
        Ok(Revision {
            version: uploads.len() as u64,
            created_at: "2024-01-01T00:00:00Z".to_string(),
        })
    }

    async fn restart_model(&self, _model_id: &str) -> Result<()> {
        self.restarts.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn get_logs(&self, _device_id: &str, _since: &str) -> Result<Vec<LogEntry>> {
        self.log_calls.fetch_add(1, Ordering::SeqCst);
        let mut last = self.last.lock().unwrap();
        match self.polls.lock().unwrap().pop_front() {
            Some(Ok(entries)) => {
                *last = entries.clone();
                Ok(entries)
            }
            Some(Err(reason)) => Err(Error::Service(reason)),
            None => Ok(last.clone()),
        }
    }
}

/// Build a log entry whose payload is a test runner message
pub fn entry(source: LogSource, timestamp: &str, payload: serde_json::Value) -> LogEntry {
    LogEntry {
        source,
        message: payload.to_string(),
        timestamp: timestamp.to_string(),
    }
}

pub fn status(source: LogSource, timestamp: &str, message: &str) -> LogEntry {
    entry(
        source,
        timestamp,
        serde_json::json!({"type": "STATUS", "message": message}),
    )
}

pub fn fail(source: LogSource, timestamp: &str, message: &str) -> LogEntry {
    entry(
        source,
        timestamp,
        serde_json::json!({"type": "FAIL", "message": message}),
    )
}

pub fn result(
    source: LogSource,
    timestamp: &str,
    tests: u64,
    assertions: u64,
    failures: u64,
) -> LogEntry {
    entry(
        source,
        timestamp,
        serde_json::json!({
            "type": "RESULT",
            "message": {"tests": tests, "assertions": assertions, "failures": failures}
        }),
    )
}
