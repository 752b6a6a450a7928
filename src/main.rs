//! imptest - run Electric Imp unit tests from the command line
//!
//! Uploads test code to a model through the Build API, restarts it, and
//! follows the device logs until the test runner reports its result.

use clap::Parser;
use imptest::{cli, common::logging, commands::Commands};

#[derive(Parser)]
#[command(name = "imptest", about = "Electric Imp test runner")]
#[command(version, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    logging::init_cli(cli.command.debug());

    match cli::dispatch(cli.command).await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
