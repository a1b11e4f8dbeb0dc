//! depscan - beacon chain deposit scanner
//!
//! Scans a block range for calls to the deposit contract and writes the
//! decoded deposits to `deposit_data.json`.

use clap::Parser;
use deposit_scan::cli::{self, Cli};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();

    // Ctrl+C aborts the scan before any output is written
    let result = tokio::select! {
        result = cli::run(cli) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, aborting scan without writing output");
            std::process::exit(130)
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}
