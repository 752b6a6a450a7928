//! Test file discovery
//!
//! Test files come either from an explicit path on the command line or from
//! the glob patterns in the config file.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::build_api::LogSource;
use crate::common::{Error, Result};

/// Which side of the model a test file runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TestKind {
    Agent,
    Device,
}

impl TestKind {
    /// Classify a test file by name: anything mentioning "agent" runs on the agent
    pub fn classify(path: &Path) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if name.contains("agent") {
            TestKind::Agent
        } else {
            TestKind::Device
        }
    }

    /// Log source carrying this side's output
    pub fn log_source(self) -> LogSource {
        match self {
            TestKind::Agent => LogSource::Agent,
            TestKind::Device => LogSource::Device,
        }
    }
}

impl fmt::Display for TestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestKind::Agent => write!(f, "agent"),
            TestKind::Device => write!(f, "device"),
        }
    }
}

/// A discovered test file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFile {
    /// Path as given or as matched, relative to the search base
    pub name: String,
    /// Absolute path
    pub path: PathBuf,
    pub kind: TestKind,
}

impl TestFile {
    fn new(name: String, path: PathBuf) -> Self {
        let kind = TestKind::classify(&path);
        Self { name, path, kind }
    }
}

/// Find the test files to run
///
/// With `explicit`, that single file is used and must exist relative to the
/// current directory. Otherwise every pattern is expanded against
/// `base_dir`; results keep pattern order, then match order, and a file
/// matched by two patterns is listed twice.
pub fn discover(
    explicit: Option<&Path>,
    patterns: &[String],
    base_dir: &Path,
) -> Result<Vec<TestFile>> {
    if let Some(path) = explicit {
        let cwd = std::env::current_dir()?;
        let absolute = cwd.join(path);
        if !absolute.exists() {
            return Err(Error::NotFound(path.display().to_string()));
        }
        return Ok(vec![TestFile::new(path.display().to_string(), absolute)]);
    }

    let base = glob::Pattern::escape(&base_dir.to_string_lossy());
    let mut files = Vec::new();

    for pattern in patterns {
        let full = format!("{}/{}", base.trim_end_matches('/'), pattern);
        let matches = glob::glob(&full).map_err(|e| {
            Error::Config(format!("Invalid test file pattern '{}': {}", pattern, e))
        })?;

        for entry in matches {
            let path = entry.map_err(|e| Error::Io(e.into_error()))?;
            if !path.is_file() {
                continue;
            }
            let name = path
                .strip_prefix(base_dir)
                .unwrap_or(&path)
                .display()
                .to_string();
            tracing::debug!("Pattern '{}' matched {}", pattern, name);
            files.push(TestFile::new(name, path));
        }
    }

    Ok(files)
}
