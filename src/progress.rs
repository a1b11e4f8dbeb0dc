//! Scan progress reporting
//!
//! Two [`ScanObserver`] implementations: an interactive progress bar and a
//! periodic log line for non-interactive runs.

use crate::records::BlockResult;
use crate::scheduler::ScanObserver;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::info;

const BAR_TEMPLATE: &str =
    "{msg} [{elapsed_precise}] {wide_bar} {pos}/{len} blocks ({per_sec}, eta {eta})";

/// Terminal progress bar advanced once per scanned block.
pub struct ProgressObserver {
    bar: ProgressBar,
}

impl ProgressObserver {
    pub fn new(total_blocks: u64) -> Self {
        let bar = ProgressBar::new(total_blocks);
        // Falls back to the default style if the template is rejected.
        if let Ok(style) = ProgressStyle::with_template(BAR_TEMPLATE) {
            bar.set_style(style);
        }
        bar.set_message("scanning blocks...");
        Self { bar }
    }
}

impl ScanObserver for ProgressObserver {
    fn on_block_scanned(&self, _result: &BlockResult) {
        self.bar.inc(1);
    }

    fn on_scan_finished(&self) {
        self.bar.finish();
    }
}

/// Logs a progress line every `interval` blocks.
pub struct LogObserver {
    total: u64,
    interval: u64,
    done: AtomicU64,
    candidates: AtomicU64,
}

impl LogObserver {
    pub fn new(total_blocks: u64, interval: u64) -> Self {
        Self {
            total: total_blocks,
            interval: interval.max(1),
            done: AtomicU64::new(0),
            candidates: AtomicU64::new(0),
        }
    }

    /// Blocks reported so far.
    pub fn blocks_done(&self) -> u64 {
        self.done.load(Ordering::Relaxed)
    }
}

impl ScanObserver for LogObserver {
    fn on_block_scanned(&self, result: &BlockResult) {
        let candidates = self
            .candidates
            .fetch_add(result.transactions.len() as u64, Ordering::Relaxed)
            + result.transactions.len() as u64;
        let done = self.done.fetch_add(1, Ordering::Relaxed) + 1;
        if done % self.interval == 0 || done == self.total {
            info!(
                "Scanned {}/{} blocks ({} candidate transactions so far)",
                done, self.total, candidates
            );
        }
    }
}
