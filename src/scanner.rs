//! Block scanner
//!
//! Fetches one block, keeps the transactions sent to the target contract,
//! and pairs each successful one with its receipt logs.

use crate::records::{BlockResult, CandidateTransaction};
use crate::retry::{fetch_with_retry, FetchError, RetryConfig};
use crate::rpc::LedgerClient;
use alloy_primitives::Address;
use thiserror::Error;
use tracing::debug;

/// Errors that abort a range scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// A block or receipt fetch failed after retries.
    #[error("failed to scan block {block}: {source}")]
    Fetch {
        block: u64,
        #[source]
        source: FetchError,
    },

    /// The range has more blocks than can be indexed in memory.
    #[error("block range of {0} blocks is too large")]
    RangeTooLarge(u64),

    /// A block finished the scan without producing a result.
    #[error("no result recorded for block {0}")]
    MissingBlock(u64),
}

/// Scans single blocks for transactions to one contract.
pub struct BlockScanner<'a, C: ?Sized> {
    client: &'a C,
    target: Address,
    retry: RetryConfig,
}

impl<'a, C: LedgerClient + ?Sized> BlockScanner<'a, C> {
    pub fn new(client: &'a C, target: Address, retry: RetryConfig) -> Self {
        Self {
            client,
            target,
            retry,
        }
    }

    /// Scan one block.
    ///
    /// Transactions to other addresses, contract creations and reverted calls
    /// are dropped. The returned list keeps block order.
    pub async fn scan(&self, block_number: u64) -> Result<BlockResult, ScanError> {
        let fetch_err = |source: FetchError| ScanError::Fetch {
            block: block_number,
            source,
        };

        let block = fetch_with_retry(&format!("block {}", block_number), &self.retry, || {
            self.client.get_block_by_number(block_number)
        })
        .await
        .map_err(fetch_err)?;

        let mut transactions = Vec::new();
        for tx in block
            .transactions
            .into_iter()
            .filter(|tx| tx.is_addressed_to(self.target))
        {
            let receipt = fetch_with_retry(&format!("receipt {:?}", tx.hash), &self.retry, || {
                self.client.get_transaction_receipt(tx.hash)
            })
            .await
            .map_err(fetch_err)?;

            if !receipt.is_success() {
                debug!("Skipping reverted TX {:?} in block {}", tx.hash, block_number);
                continue;
            }

            transactions.push(CandidateTransaction {
                hash: tx.hash,
                input: tx.input,
                logs: receipt.logs,
            });
        }

        Ok(BlockResult {
            block_number,
            transactions,
        })
    }
}
