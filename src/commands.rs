//! CLI command definitions
//!
//! Defines the clap commands for the imptest CLI.

use clap::Subcommand;
use std::path::PathBuf;

use crate::common::config::DEFAULT_CONFIG_PATH;

#[derive(Subcommand)]
pub enum Commands {
    /// Run test files against the configured model
    Test {
        /// Test file to run instead of the config's search patterns
        test_file: Option<PathBuf>,

        /// Config file path
        #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Debug output
        #[arg(long, short)]
        debug: bool,

        /// Seconds to wait for a test file's result (overrides the config)
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Create a config file
    Init {
        /// Config file path
        #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,

        /// Overwrite an existing config file
        #[arg(long, short)]
        force: bool,

        /// Debug output
        #[arg(long, short)]
        debug: bool,
    },
}

impl Commands {
    pub fn debug(&self) -> bool {
        match self {
            Commands::Test { debug, .. } | Commands::Init { debug, .. } => *debug,
        }
    }
}
