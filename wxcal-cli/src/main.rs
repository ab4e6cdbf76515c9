//! Binary crate for the `wxcal` command-line tool.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Merging them with the optional config file
//! - Logging setup and process exit status

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
