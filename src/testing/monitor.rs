//! Log monitor
//!
//! Polls the device log feed until the test runner on one side of the model
//! (agent or device) reports its RESULT line. The feed only answers
//! "everything since T", so each poll returns every entry since the revision
//! was created and entries are deduplicated by content fingerprint.

use std::collections::HashSet;
use std::time::Duration;

use crate::build_api::{BuildService, LogEntry, LogSource, ParsedLine, ResultCounts, Revision};
use crate::common::{Error, Result};

use super::reporter::{Category, Reporter};

/// Default delay between polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1000);

/// Aggregate outcome of one monitored side
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunVerdict {
    pub counts: ResultCounts,
    /// No FAIL line was seen before the RESULT line
    pub success: bool,
    /// A RESULT line has been seen; nothing changes afterwards
    pub terminal: bool,
}

/// Polling state machine for one log source
pub struct LogMonitor<'a> {
    service: &'a dyn BuildService,
    reporter: &'a dyn Reporter,
    device_id: &'a str,
    since: String,
    source: LogSource,
    poll_interval: Duration,
    seen: HashSet<String>,
    saw_failure: bool,
    verdict: RunVerdict,
}

impl<'a> LogMonitor<'a> {
    pub fn new(
        service: &'a dyn BuildService,
        reporter: &'a dyn Reporter,
        device_id: &'a str,
        revision: &Revision,
        source: LogSource,
    ) -> Self {
        Self {
            service,
            reporter,
            device_id,
            since: revision.created_at.clone(),
            source,
            poll_interval: DEFAULT_POLL_INTERVAL,
            seen: HashSet::new(),
            saw_failure: false,
            verdict: RunVerdict::default(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn verdict(&self) -> RunVerdict {
        self.verdict
    }

    /// Poll until a RESULT line arrives or `ceiling` elapses
    pub async fn run(mut self, ceiling: Duration) -> Result<RunVerdict> {
        let outcome = tokio::time::timeout(ceiling, self.poll_until_terminal()).await;
        match outcome {
            Ok(result) => result,
            Err(_) => {
                tracing::warn!(source = %self.source, "No test result after {:?}", ceiling);
                Err(Error::Timeout(ceiling))
            }
        }
    }

    async fn poll_until_terminal(&mut self) -> Result<RunVerdict> {
        let mut polls = 0u64;
        loop {
            polls += 1;
            let entries = self.service.get_logs(self.device_id, &self.since).await?;
            tracing::debug!(
                source = %self.source,
                poll = polls,
                "Fetched {} log entries",
                entries.len()
            );

            self.process(&entries)?;
            if self.verdict.terminal {
                return Ok(self.verdict);
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Apply one batch of feed entries
    ///
    /// Entries from the other side and entries already seen are skipped.
    /// Processing stops at the first RESULT line.
    pub fn process(&mut self, entries: &[LogEntry]) -> Result<()> {
        for entry in entries {
            if self.verdict.terminal {
                break;
            }
            if entry.source != self.source {
                continue;
            }

            let fingerprint = entry.fingerprint();
            if self.seen.contains(&fingerprint) {
                tracing::trace!(source = %self.source, "Skipping seen entry {}", fingerprint);
                continue;
            }

            let line = entry.parse_line()?;
            self.seen.insert(fingerprint);
            self.apply(line);
        }
        Ok(())
    }

    fn apply(&mut self, line: ParsedLine) {
        match line {
            ParsedLine::Status(message) => self.report_status(&message),
            ParsedLine::Fail(message) => {
                self.saw_failure = true;
                self.reporter
                    .report(Category::Failure, &format!("FAILED: {}", message));
            }
            ParsedLine::Result(counts) => {
                self.verdict = RunVerdict {
                    counts,
                    success: !self.saw_failure,
                    terminal: true,
                };
                if self.verdict.success {
                    self.reporter.report(
                        Category::SuccessSummary,
                        &format!("Testing succeeded ({})", counts),
                    );
                } else {
                    self.reporter.report(
                        Category::FailureSummary,
                        &format!("Testing failed ({})", counts),
                    );
                }
            }
        }
    }

    fn report_status(&self, message: &str) {
        let suite = || message.split("::").next().unwrap_or(message);
        if message.contains("::setUp()") {
            self.reporter
                .report(Category::Setup, &format!("Setting up {}", suite()));
        } else if message.contains("::tearDown()") {
            self.reporter
                .report(Category::Teardown, &format!("Tearing down {}", suite()));
        } else {
            self.reporter.report(Category::Status, message);
        }
    }
}
