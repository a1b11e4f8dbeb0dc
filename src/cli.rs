//! CLI implementation for depscan
//!
//! Parses arguments into a [`ScanConfig`], runs the scan against a JSON-RPC
//! endpoint, decodes the deposits and writes them to a JSON file.

use crate::config::{parse_address, BlockRange, ScanConfig, DEPOSIT_CONTRACT, DEFAULT_CONCURRENCY};
use crate::decoder::{decode_block_results, DecodePolicy};
use crate::output::{write_deposits, DEFAULT_OUTPUT};
use crate::progress::{LogObserver, ProgressObserver};
use crate::retry::{fetch_with_retry, RetryConfig};
use crate::rpc::{LedgerClient, RpcClient};
use crate::scheduler::{scan_range, ScanObserver};
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::info;

/// Beacon chain deposit scanner
#[derive(Parser, Debug)]
#[command(name = "depscan")]
#[command(about = "Rebuild deposit data from deposit contract transactions in a block range")]
pub struct Cli {
    /// RPC endpoint URL (e.g., https://eth.llamarpc.com)
    #[arg(short, long, default_value = "http://127.0.0.1:8545")]
    pub rpc_url: String,

    /// Deposit contract address (hex, with or without 0x prefix)
    #[arg(short, long, default_value = DEPOSIT_CONTRACT)]
    pub contract: String,

    /// First block to scan (inclusive)
    #[arg(long, default_value_t = 12775113)]
    pub from: u64,

    /// Block to stop at (exclusive)
    #[arg(long, default_value_t = 12975113, conflicts_with = "to_latest")]
    pub to: u64,

    /// Scan up to and including the latest block instead of --to
    #[arg(long)]
    pub to_latest: bool,

    /// Maximum number of blocks fetched concurrently
    #[arg(short = 'j', long, default_value_t = DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// Retries per block or receipt fetch before giving up
    #[arg(long, default_value_t = 10)]
    pub max_retries: usize,

    /// Delay before the first retry, in milliseconds
    #[arg(long, default_value_t = 100)]
    pub retry_min_delay_ms: u64,

    /// Upper bound on the delay between retries, in milliseconds
    #[arg(long, default_value_t = 10_000)]
    pub retry_max_delay_ms: u64,

    /// Per-request timeout, in seconds
    #[arg(long, default_value_t = 30)]
    pub rpc_timeout_secs: u64,

    /// Skip transactions that cannot be decoded instead of aborting
    #[arg(long)]
    pub skip_undecodable: bool,

    /// Output file for the deposit data
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: PathBuf,

    /// Log progress lines instead of drawing a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

impl Cli {
    fn retry_config(&self) -> RetryConfig {
        RetryConfig {
            max_retries: self.max_retries,
            min_delay: Duration::from_millis(self.retry_min_delay_ms),
            max_delay: Duration::from_millis(self.retry_max_delay_ms),
        }
    }

    fn decode_policy(&self) -> DecodePolicy {
        if self.skip_undecodable {
            DecodePolicy::Skip
        } else {
            DecodePolicy::Strict
        }
    }
}

/// Resolve the exclusive end block, asking the node for its head if requested.
async fn resolve_end_block<C: LedgerClient + ?Sized>(
    client: &C,
    cli: &Cli,
    retry: &RetryConfig,
) -> Result<u64> {
    if !cli.to_latest {
        return Ok(cli.to);
    }
    let latest = fetch_with_retry("latest block number", retry, || client.get_block_number())
        .await
        .context("Failed to get latest block number")?;
    info!("Latest block is {}", latest);
    Ok(latest.saturating_add(1))
}

/// Run the full scan: fetch, decode, write.
pub async fn run(cli: Cli) -> Result<()> {
    let contract = parse_address(&cli.contract).context("Invalid --contract")?;
    let retry = cli.retry_config();

    info!("RPC URL: {}", cli.rpc_url);
    let rpc = RpcClient::with_timeout(cli.rpc_url.clone(), Duration::from_secs(cli.rpc_timeout_secs))
        .context("Failed to build RPC client")?;

    let to = resolve_end_block(&rpc, &cli, &retry).await?;
    let config = ScanConfig {
        contract,
        range: BlockRange::new(cli.from, to)?,
        concurrency: cli.concurrency,
        retry,
    };
    config.validate()?;

    let total = config.range.len();
    let observer: Box<dyn ScanObserver> = if cli.no_progress {
        Box::new(LogObserver::new(total, (total / 100).max(1)))
    } else {
        Box::new(ProgressObserver::new(total))
    };

    let blocks = scan_range(&rpc, &config, observer.as_ref())
        .await
        .context("Block scan failed")?;

    let outcome = decode_block_results(&blocks, cli.decode_policy())
        .context("Failed to decode deposit data")?;

    write_deposits(&cli.output, &outcome.records)?;

    println!("Scan done!");
    println!(" Deposit data written OK to {}", cli.output.display());
    if outcome.skipped.is_empty() {
        println!(" Found {} deposits", outcome.records.len());
    } else {
        println!(
            " Found {} deposits ({} undecodable transactions skipped)",
            outcome.records.len(),
            outcome.skipped.len()
        );
    }
    Ok(())
}
