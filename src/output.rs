//! Deposit data output
//!
//! Writes decoded deposits as a single compact JSON array.

use crate::records::DepositRecord;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Default output file name.
pub const DEFAULT_OUTPUT: &str = "deposit_data.json";

/// Serialize `records` and write them to `path`, replacing any existing file.
///
/// The file is created owner-readable only on Unix.
pub fn write_deposits(path: &Path, records: &[DepositRecord]) -> Result<()> {
    let data = match serde_json::to_vec(records) {
        Ok(data) => data,
        Err(e) => {
            debug!("Unserializable deposit data: {:?}", records);
            return Err(e).context("Failed to serialize deposit data");
        }
    };

    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options
        .open(path)
        .with_context(|| format!("Failed to create output file {:?}", path))?;
    file.write_all(&data)
        .and_then(|_| file.sync_all())
        .with_context(|| format!("Failed to write deposit data to {:?}", path))?;

    info!("Wrote {} deposits ({} bytes) to {:?}", records.len(), data.len(), path);
    Ok(())
}
