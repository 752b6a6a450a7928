//! Test run orchestration
//!
//! Each test file gets one full cycle: bundle the code, upload a revision,
//! restart the model, then watch the log feed until the test runner reports
//! a result. Files run one after another; a failing file does not stop the
//! ones after it.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::future::try_join_all;

use crate::build_api::BuildService;
use crate::common::config::Config;
use crate::common::{Error, Result};

use super::discovery::{TestFile, TestKind};
use super::monitor::{LogMonitor, RunVerdict};
use super::reporter::{Category, Reporter};

/// Everything a run needs besides the test files
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub model_id: String,
    pub device_id: String,
    pub agent_file: Option<PathBuf>,
    pub device_file: Option<PathBuf>,
    pub framework_file: Option<PathBuf>,
    pub poll_interval: Duration,
    pub timeout: Duration,
}

impl RunSettings {
    /// Take settings from a validated config, resolving paths against `base_dir`
    pub fn from_config(config: &Config, base_dir: &Path) -> Result<Self> {
        let device_id = config
            .device_id()
            .ok_or_else(|| Error::Config("'devices' must list at least one device".to_string()))?;
        let resolve = |p: &Option<PathBuf>| p.as_ref().map(|p| base_dir.join(p));

        Ok(Self {
            model_id: config.model_id.clone(),
            device_id: device_id.to_string(),
            agent_file: resolve(&config.agent_file),
            device_file: resolve(&config.device_file),
            framework_file: resolve(&config.framework_file),
            poll_interval: config.poll_interval(),
            timeout: config.timeout(),
        })
    }
}

/// Outcome of one test file
#[derive(Debug)]
pub struct FileOutcome {
    pub name: String,
    pub kind: TestKind,
    pub verdicts: Vec<RunVerdict>,
    pub error: Option<String>,
}

impl FileOutcome {
    pub fn passed(&self) -> bool {
        self.error.is_none()
            && !self.verdicts.is_empty()
            && self.verdicts.iter().all(|v| v.terminal && v.success)
    }
}

/// Outcome of a whole run
#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<FileOutcome>,
}

impl RunSummary {
    pub fn passed(&self) -> usize {
        self.outcomes.iter().filter(|o| o.passed()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.passed()
    }

    /// Process exit status: 0 when every file passed, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.failed() == 0 {
            0
        } else {
            1
        }
    }
}

/// Drives test files through the build service
pub struct TestRunner<'a> {
    service: &'a dyn BuildService,
    reporter: &'a dyn Reporter,
    settings: RunSettings,
}

impl<'a> TestRunner<'a> {
    pub fn new(
        service: &'a dyn BuildService,
        reporter: &'a dyn Reporter,
        settings: RunSettings,
    ) -> Self {
        Self {
            service,
            reporter,
            settings,
        }
    }

    /// Run every file in order and collect the outcomes
    pub async fn run_all(&self, files: &[TestFile]) -> RunSummary {
        self.reporter.report(
            Category::Info,
            &format!(
                "Found {} test file{}",
                files.len(),
                if files.len() == 1 { "" } else { "s" }
            ),
        );

        let mut summary = RunSummary::default();
        for file in files {
            let outcome = match self.run_file(file).await {
                Ok(verdicts) => FileOutcome {
                    name: file.name.clone(),
                    kind: file.kind,
                    verdicts,
                    error: None,
                },
                Err(e) => {
                    tracing::warn!(file = %file.name, "Test file run aborted: {}", e);
                    self.reporter
                        .report(Category::Error, &format!("{}: {}", file.name, e));
                    FileOutcome {
                        name: file.name.clone(),
                        kind: file.kind,
                        verdicts: Vec::new(),
                        error: Some(e.to_string()),
                    }
                }
            };
            summary.outcomes.push(outcome);
        }

        if !files.is_empty() {
            let text = format!(
                "{} passed, {} failed",
                summary.passed(),
                summary.failed()
            );
            let category = if summary.failed() == 0 {
                Category::SuccessSummary
            } else {
                Category::FailureSummary
            };
            self.reporter.report(category, &text);
        }

        summary
    }

    /// Run one file, monitoring the side its tests run on
    pub async fn run_file(&self, file: &TestFile) -> Result<Vec<RunVerdict>> {
        self.run_file_watching(file, &[file.kind]).await
    }

    /// Run one file, monitoring each of `sides` concurrently
    ///
    /// The first monitor to fail cancels the others.
    pub async fn run_file_watching(
        &self,
        file: &TestFile,
        sides: &[TestKind],
    ) -> Result<Vec<RunVerdict>> {
        self.reporter.report(
            Category::Info,
            &format!("Running {} test file {}", file.kind, file.name),
        );

        let (device_code, agent_code) = self.bundle(file)?;

        let revision = self
            .service
            .create_revision(&self.settings.model_id, &device_code, &agent_code)
            .await?;
        self.reporter.report(
            Category::Info,
            &format!("Created revision: {}", revision.version),
        );

        self.service.restart_model(&self.settings.model_id).await?;
        self.reporter.report(
            Category::Debug,
            &format!("Restarted model {}", self.settings.model_id),
        );

        let monitors = sides.iter().map(|side| {
            LogMonitor::new(
                self.service,
                self.reporter,
                &self.settings.device_id,
                &revision,
                side.log_source(),
            )
            .with_poll_interval(self.settings.poll_interval)
            .run(self.settings.timeout)
        });

        try_join_all(monitors).await
    }

    /// Build `(device_code, agent_code)` for a test file
    ///
    /// The framework and the test file are appended to the source of the
    /// side the test runs on.
    fn bundle(&self, file: &TestFile) -> Result<(String, String)> {
        let mut agent_code = self.read_optional("Agent", self.settings.agent_file.as_deref())?;
        let mut device_code = self.read_optional("Device", self.settings.device_file.as_deref())?;
        let framework = self.read_optional("Framework", self.settings.framework_file.as_deref())?;
        let tests = read_source(&file.path)?;

        let target = match file.kind {
            TestKind::Agent => &mut agent_code,
            TestKind::Device => &mut device_code,
        };
        for part in [framework, tests] {
            if part.is_empty() {
                continue;
            }
            if !target.is_empty() {
                target.push('\n');
            }
            target.push_str(&part);
        }

        Ok((device_code, agent_code))
    }

    fn read_optional(&self, label: &str, path: Option<&Path>) -> Result<String> {
        match path {
            Some(path) => {
                self.reporter.report(
                    Category::Debug,
                    &format!("{} source code file: {}", label, path.display()),
                );
                read_source(path)
            }
            None => Ok(String::new()),
        }
    }
}

fn read_source(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))
}
