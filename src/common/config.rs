//! Configuration file handling
//!
//! The project file (`.imptest` by default) is JSON that may carry `//` and
//! `/* */` comments. Relative paths inside it resolve against the directory
//! that holds the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::{Error, Result};

/// Default config file name
pub const DEFAULT_CONFIG_PATH: &str = ".imptest";

/// Contents of an `.imptest` file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Build API key
    #[serde(default)]
    pub api_key: String,

    /// Model the test revisions are uploaded to
    #[serde(default)]
    pub model_id: String,

    /// Devices assigned to the model; logs are read from the first one
    #[serde(default)]
    pub devices: Vec<String>,

    /// Agent source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_file: Option<PathBuf>,

    /// Device source file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub device_file: Option<PathBuf>,

    /// Unit test framework source, bundled ahead of each test file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub framework_file: Option<PathBuf>,

    /// Glob pattern(s) locating test files
    #[serde(default)]
    pub tests: TestPatterns,

    /// Wall-clock ceiling for a single test file run, in seconds
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Delay between log polls, in milliseconds
    #[serde(default = "default_poll_interval")]
    pub poll_interval: u64,

    /// Build API base URL override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,
}

/// One pattern or an ordered list of patterns
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum TestPatterns {
    One(String),
    Many(Vec<String>),
}

impl TestPatterns {
    /// Patterns in declaration order
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            TestPatterns::One(pattern) => vec![pattern.clone()],
            TestPatterns::Many(patterns) => patterns.clone(),
        }
    }
}

impl Default for TestPatterns {
    fn default() -> Self {
        TestPatterns::Many(vec![
            "*.test.nut".to_string(),
            "tests/**/*.test.nut".to_string(),
        ])
    }
}

fn default_timeout() -> u64 {
    300
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model_id: String::new(),
            devices: Vec::new(),
            agent_file: None,
            device_file: None,
            framework_file: None,
            tests: TestPatterns::default(),
            timeout: default_timeout(),
            poll_interval: default_poll_interval(),
            api_url: None,
        }
    }
}

impl Config {
    /// Parse configuration text, ignoring comments
    pub fn parse(content: &str, path: &Path) -> Result<Self> {
        let stripped = json_comments::StripComments::new(content.as_bytes());
        serde_json::from_reader(stripped).map_err(|e| Error::ConfigParse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::Config(format!(
                "Config file '{}' not found. Run 'imptest init' to create one",
                path.display()
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| Error::file_read(path, e))?;
        Self::parse(&content, path)
    }

    /// Write configuration as pretty-printed JSON
    pub fn write(&self, path: &Path) -> Result<()> {
        let mut json = serde_json::to_string_pretty(self)?;
        json.push('\n');
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Check the settings a test run cannot do without
    pub fn validate(&self) -> Result<()> {
        if self.api_key.is_empty() {
            return Err(Error::Config("'apiKey' is not set".to_string()));
        }
        if self.model_id.is_empty() {
            return Err(Error::Config("'modelId' is not set".to_string()));
        }
        if self.devices.is_empty() {
            return Err(Error::Config("'devices' must list at least one device".to_string()));
        }
        Ok(())
    }

    /// Device whose logs are monitored
    pub fn device_id(&self) -> Option<&str> {
        self.devices.first().map(String::as_str)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval)
    }
}

/// Directory that relative paths in the config file resolve against
pub fn config_dir(config_path: &Path) -> Result<PathBuf> {
    let absolute = if config_path.is_absolute() {
        config_path.to_path_buf()
    } else {
        std::env::current_dir()?.join(config_path)
    };
    Ok(absolute
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("/")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_comments() {
        let content = r#"
        {
            // credentials
            "apiKey": "secret",
            "modelId": "m-1", /* inline */
            "devices": ["d-1", "d-2"],
            "agentFile": "src/agent.nut",
            "tests": "tests/*.test.nut"
        }
        "#;
        let config = Config::parse(content, Path::new(".imptest")).unwrap();
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.model_id, "m-1");
        assert_eq!(config.device_id(), Some("d-1"));
        assert_eq!(config.agent_file, Some(PathBuf::from("src/agent.nut")));
        assert_eq!(config.tests.to_vec(), vec!["tests/*.test.nut"]);
        assert_eq!(config.timeout, 300);
        assert_eq!(config.poll_interval(), Duration::from_millis(1000));
    }

    #[test]
    fn test_parse_pattern_list() {
        let content = r#"{"tests": ["a.test.nut", "b/*.test.nut"]}"#;
        let config = Config::parse(content, Path::new(".imptest")).unwrap();
        assert_eq!(config.tests.to_vec(), vec!["a.test.nut", "b/*.test.nut"]);
    }

    #[test]
    fn test_parse_error_names_file() {
        let err = Config::parse("{ not json", Path::new("custom.imptest")).unwrap_err();
        assert!(err.to_string().contains("custom.imptest"));
    }

    #[test]
    fn test_validate_requires_credentials() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.api_key = "key".to_string();
        config.model_id = "model".to_string();
        assert!(config.validate().is_err());

        config.devices.push("device".to_string());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_write_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(".imptest");

        let config = Config {
            api_key: "key".to_string(),
            devices: vec!["d".to_string()],
            ..Config::default()
        };
        config.write(&path).unwrap();

        assert_eq!(Config::load(&path).unwrap(), config);
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(&dir.path().join(".imptest")).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_config_dir_is_parent() {
        let dir = config_dir(Path::new("/work/project/.imptest")).unwrap();
        assert_eq!(dir, PathBuf::from("/work/project"));
    }
}
