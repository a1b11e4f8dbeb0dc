//! Scan configuration
//!
//! Holds the parameters a scan is started with: target contract, block range,
//! concurrency ceiling and retry budget. Nothing here is global; the
//! configuration is passed explicitly into the scheduler.

use crate::retry::RetryConfig;
use crate::types::pad_hex_string;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::ops::Range;

/// Mainnet beacon chain deposit contract.
pub const DEPOSIT_CONTRACT: &str = "0x00000000219ab540356cbb839cbe05303d7705fa";

/// Default number of blocks scanned concurrently.
pub const DEFAULT_CONCURRENCY: usize = 80;

/// Half-open block range `[from, to)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockRange {
    pub from: u64,
    pub to: u64,
}

impl BlockRange {
    /// Create a range, rejecting `from > to`.
    pub fn new(from: u64, to: u64) -> Result<Self> {
        if from > to {
            anyhow::bail!("Invalid block range: start {} is after end {}", from, to);
        }
        Ok(Self { from, to })
    }

    /// Number of blocks in the range.
    pub fn len(&self) -> u64 {
        self.to.saturating_sub(self.from)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Block numbers in ascending order.
    pub fn iter(&self) -> Range<u64> {
        self.from..self.to
    }
}

/// Everything the range scheduler needs to run a scan.
#[derive(Debug, Clone)]
pub struct ScanConfig {
    /// Contract whose incoming transactions are collected
    pub contract: Address,
    /// Blocks to scan
    pub range: BlockRange,
    /// Maximum number of blocks in flight at once
    pub concurrency: usize,
    /// Retry budget for each block and receipt fetch
    pub retry: RetryConfig,
}

impl ScanConfig {
    /// Build a config with the default concurrency and retry budget.
    pub fn new(contract: Address, range: BlockRange) -> Self {
        Self {
            contract,
            range,
            concurrency: DEFAULT_CONCURRENCY,
            retry: RetryConfig::default(),
        }
    }

    /// Check the config before a scan starts.
    pub fn validate(&self) -> Result<()> {
        if self.range.from > self.range.to {
            anyhow::bail!(
                "Invalid block range: start {} is after end {}",
                self.range.from,
                self.range.to
            );
        }
        if self.concurrency == 0 {
            anyhow::bail!("Concurrency must be at least 1");
        }
        if self.retry.min_delay > self.retry.max_delay {
            anyhow::bail!(
                "Retry min delay {:?} exceeds max delay {:?}",
                self.retry.min_delay,
                self.retry.max_delay
            );
        }
        usize::try_from(self.range.len())
            .with_context(|| format!("Block range of {} blocks is too large", self.range.len()))?;
        Ok(())
    }
}

/// Parse an address from a hex string.
///
/// Accepts addresses with or without 0x prefix.
pub fn parse_address(s: &str) -> Result<Address> {
    let s = s.trim();
    let s = s.strip_prefix("0x").unwrap_or(s);
    let s = pad_hex_string(s);
    let bytes = hex::decode(&s).with_context(|| format!("Invalid hex address: {}", s))?;

    if bytes.len() != 20 {
        anyhow::bail!("Address must be 20 bytes (40 hex chars), got {} bytes", bytes.len());
    }

    Ok(Address::from_slice(&bytes))
}
