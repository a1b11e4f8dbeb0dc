//! Deposit scan - beacon chain deposit data reconstruction
//!
//! This library scans a range of Ethereum blocks for transactions sent to the
//! deposit contract, fetches their receipts concurrently with bounded retry,
//! and decodes each call and its `DepositEvent` log into a deposit record.

pub mod cli;
pub mod config;
pub mod decoder;
pub mod output;
pub mod progress;
pub mod records;
pub mod retry;
pub mod rpc;
pub mod scanner;
pub mod scheduler;
pub mod types;

#[cfg(test)]
mod mock;

// Re-export the main types for convenience
pub use config::{BlockRange, ScanConfig};
pub use decoder::{decode_block_results, decode_deposit, DecodePolicy};
pub use records::{BlockResult, CandidateTransaction, DepositRecord};
pub use rpc::{LedgerClient, RpcClient, RpcError};
pub use scheduler::{scan_range, ScanObserver};
