//! Command-line interface for fetching GADM country maps.
#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};

mod error;
mod fetch;

pub use error::CliError;
use fetch::FetchArgs;

const ARG_COUNTRY: &str = "country";
const ARG_VERSION: &str = "dataset-version";
const ARG_FORMAT: &str = "format";
const ARG_LAYER: &str = "layer";
const ARG_OUTPUT: &str = "output";
const ARG_USER_AGENT: &str = "user-agent";
const ARG_TIMEOUT_SECS: &str = "timeout-secs";
const ARG_SCRATCH_DIR: &str = "scratch-dir";
const ENV_COUNTRY: &str = "GADM_CMDS_FETCH_COUNTRY";

/// Run the `gadm` CLI with the current process arguments and environment.
pub fn run() -> Result<(), CliError> {
    let cli = Cli::try_parse().map_err(CliError::ArgumentParsing)?;
    match cli.command {
        Command::Fetch(args) => fetch::run_fetch(args),
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "gadm",
    about = "Download administrative boundary maps from the GADM archive",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch one administrative level of a country and summarise it.
    Fetch(FetchArgs),
}

#[cfg(test)]
mod tests;
