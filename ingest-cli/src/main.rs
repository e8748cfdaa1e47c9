//! Binary crate for the `weather-ingest` daemon.
//!
//! This crate focuses on:
//! - Parsing CLI arguments
//! - Logging setup
//! - Wiring configuration into the ingestion core and handling stop signals

use clap::Parser;

mod cli;
mod logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env is fine; real deployments export variables directly.
    let _ = dotenvy::dotenv();

    let cmd = cli::Cli::parse();
    logging::init(cmd.json_logs);
    cmd.run().await
}
