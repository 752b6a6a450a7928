//! CLI command handling
//!
//! Turns parsed commands into test runs and config files.

use std::path::Path;

use crate::build_api::BuildApiClient;
use crate::commands::Commands;
use crate::common::config::{self, Config};
use crate::common::{Error, Result};
use crate::testing::{self, Category, ConsoleReporter, Reporter, RunSettings, TestRunner};

/// Dispatch a CLI command, returning the process exit code
pub async fn dispatch(command: Commands) -> Result<i32> {
    match command {
        Commands::Test {
            test_file,
            config,
            debug,
            timeout,
        } => {
            let reporter = ConsoleReporter::new(debug);
            run_tests(&config, test_file.as_deref(), timeout, &reporter).await
        }

        Commands::Init {
            config,
            force,
            debug: _,
        } => {
            init(&config, force)?;
            Ok(0)
        }
    }
}

/// Run the configured tests and report the outcome
pub async fn run_tests(
    config_path: &Path,
    test_file: Option<&Path>,
    timeout: Option<u64>,
    reporter: &dyn Reporter,
) -> Result<i32> {
    let mut config = Config::load(config_path)?;
    config.validate()?;
    if let Some(secs) = timeout {
        config.timeout = secs;
    }

    let base_dir = config::config_dir(config_path)?;
    reporter.report(
        Category::Debug,
        &format!("Using config file {}", config_path.display()),
    );

    let files = match testing::discover(test_file, &config.tests.to_vec(), &base_dir) {
        Ok(files) => files,
        Err(e @ Error::NotFound(_)) => {
            reporter.report(Category::Error, &e.to_string());
            return Ok(1);
        }
        Err(e) => return Err(e),
    };
    for file in &files {
        reporter.report(
            Category::Debug,
            &format!("Test file: {} ({})", file.path.display(), file.kind),
        );
    }

    let client = match &config.api_url {
        Some(url) => BuildApiClient::with_base_url(&config.api_key, url)?,
        None => BuildApiClient::new(&config.api_key)?,
    };
    let settings = RunSettings::from_config(&config, &base_dir)?;
    let runner = TestRunner::new(&client, reporter, settings);

    let summary = runner.run_all(&files).await;
    Ok(summary.exit_code())
}

/// Write a default config file
pub fn init(config_path: &Path, force: bool) -> Result<()> {
    if config_path.exists() && !force {
        return Err(Error::Config(format!(
            "Config file '{}' already exists. Use --force to overwrite",
            config_path.display()
        )));
    }

    Config::default().write(config_path)?;
    println!("Config file written to {}", config_path.display());
    Ok(())
}
