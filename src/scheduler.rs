//! Range scheduler
//!
//! Fans block scans out over a range with a fixed concurrency ceiling and
//! collects the results in block order.
//!
//! Scans are dispatched in ascending block order and complete in any order.
//! Each result is written into the slot at `block_number - from` of a
//! pre-sized vector, so the returned sequence is ordered by construction
//! and a gap is detectable rather than silently dropped.

use crate::config::ScanConfig;
use crate::records::BlockResult;
use crate::rpc::LedgerClient;
use crate::scanner::{BlockScanner, ScanError};
use futures::stream::{self, StreamExt};
use tracing::info;

/// Receives a notification for every block the scheduler finishes.
///
/// Observers cannot fail the scan; implementations handle their own errors.
pub trait ScanObserver: Send + Sync {
    /// Called once per completed block, in completion order.
    fn on_block_scanned(&self, result: &BlockResult);

    /// Called once after the last block completes.
    fn on_scan_finished(&self) {}
}

/// Observer that ignores all notifications.
pub struct NoopObserver;

impl ScanObserver for NoopObserver {
    fn on_block_scanned(&self, _result: &BlockResult) {}
}

/// Scan every block in `config.range`.
///
/// Returns one [`BlockResult`] per block, with `result[i]` describing block
/// `config.range.from + i`. The first failed block aborts the scan.
pub async fn scan_range<C>(
    client: &C,
    config: &ScanConfig,
    observer: &dyn ScanObserver,
) -> Result<Vec<BlockResult>, ScanError>
where
    C: LedgerClient + ?Sized,
{
    let range = config.range;
    let len = usize::try_from(range.len()).map_err(|_| ScanError::RangeTooLarge(range.len()))?;
    if len == 0 {
        return Ok(Vec::new());
    }

    info!(
        "Scanning blocks {}..{} ({} blocks) for contract {:?} with concurrency {}",
        range.from, range.to, len, config.contract, config.concurrency
    );

    let scanner = BlockScanner::new(client, config.contract, config.retry);
    let mut slots: Vec<Option<BlockResult>> = vec![None; len];
    let mut candidates = 0usize;

    let mut scans = stream::iter(range.iter())
        .map(|block_number| scanner.scan(block_number))
        .buffer_unordered(config.concurrency.max(1));

    while let Some(result) = scans.next().await {
        let result = result?;
        let index = (result.block_number - range.from) as usize;
        candidates += result.transactions.len();
        observer.on_block_scanned(&result);
        slots[index] = Some(result);
    }
    observer.on_scan_finished();

    let results = slots
        .into_iter()
        .zip(range.iter())
        .map(|(slot, block_number)| slot.ok_or(ScanError::MissingBlock(block_number)))
        .collect::<Result<Vec<_>, _>>()?;

    info!(
        "Scan complete: {} blocks, {} candidate transactions",
        results.len(),
        candidates
    );
    Ok(results)
}
