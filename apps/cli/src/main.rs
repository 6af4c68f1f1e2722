//! noderank CLI — enrich a ranked node list with per-node lookup data.
//!
//! Fetches the ranked base list, looks every node up on a pool of workers,
//! and writes the merged records to a single JSON file.

mod commands;

use clap::Parser;
use color_eyre::eyre::Result;

use commands::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = Cli::parse();
    commands::init_tracing(&cli);
    commands::run(cli).await
}
