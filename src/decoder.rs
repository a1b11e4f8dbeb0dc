//! Deposit decoder
//!
//! Combines the two encodings of a deposit: the `deposit(...)` call input,
//! which carries the data root, and the `DepositEvent` log, which carries the
//! amount the contract actually accepted.

use crate::records::{BlockResult, CandidateTransaction, DepositRecord};
use alloy_primitives::B256;
use alloy_sol_types::{sol, SolCall, SolEvent};
use thiserror::Error;
use tracing::{info, warn};

sol! {
    /// Entry point of the beacon chain deposit contract.
    function deposit(
        bytes pubkey,
        bytes withdrawal_credentials,
        bytes signature,
        bytes32 deposit_data_root
    );

    /// Emitted by the deposit contract for every accepted deposit.
    event DepositEvent(
        bytes pubkey,
        bytes withdrawal_credentials,
        bytes amount,
        bytes signature,
        bytes index
    );
}

/// Length of the method selector prefixing call input.
const SELECTOR_LEN: usize = 4;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("call input too short for a method selector: {0} bytes")]
    InputTooShort(usize),
    #[error("failed to decode deposit call: {0}")]
    Call(#[from] alloy_sol_types::Error),
    #[error("no DepositEvent log in receipt")]
    MissingEvent,
    #[error("deposit amount must be 8 bytes, got {0}")]
    InvalidAmountLength(usize),
}

/// A decode failure tied to the transaction that caused it.
#[derive(Debug, Error)]
#[error("failed to decode deposit tx {hash:?} in block {block_number}: {source}")]
pub struct TransactionDecodeError {
    pub block_number: u64,
    pub hash: B256,
    #[source]
    pub source: DecodeError,
}

/// What to do with a transaction that cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodePolicy {
    /// Abort on the first failure.
    #[default]
    Strict,
    /// Log the failure, record it as skipped, and keep going.
    Skip,
}

/// Output of decoding a whole scan.
#[derive(Debug, Default)]
pub struct DecodeOutcome {
    /// Decoded deposits in block order
    pub records: Vec<DepositRecord>,
    /// Transactions dropped under [`DecodePolicy::Skip`]
    pub skipped: Vec<TransactionDecodeError>,
}

/// Decode one candidate transaction into a deposit record.
///
/// The first log that decodes as `DepositEvent` is used.
pub fn decode_deposit(tx: &CandidateTransaction) -> Result<DepositRecord, DecodeError> {
    let params = tx
        .input
        .get(SELECTOR_LEN..)
        .ok_or(DecodeError::InputTooShort(tx.input.len()))?;
    let call = depositCall::abi_decode_raw(params, false)?;

    let mut events = tx
        .logs
        .iter()
        .filter(|log| log.topics.first() == Some(&DepositEvent::SIGNATURE_HASH))
        .filter_map(|log| {
            DepositEvent::decode_raw_log(log.topics.iter().copied(), &log.data, false).ok()
        });
    let event = events.next().ok_or(DecodeError::MissingEvent)?;

    let extra = events.count();
    if extra > 0 {
        warn!(
            "TX {:?} emitted {} additional DepositEvent logs; only the first is recorded",
            tx.hash, extra
        );
    }

    Ok(DepositRecord {
        pubkey: event.pubkey.to_vec(),
        withdrawal_credentials: event.withdrawal_credentials.to_vec(),
        amount: decode_amount(&event.amount)?,
        signature: event.signature.to_vec(),
        deposit_data_root: call.deposit_data_root,
    })
}

/// Decode the contract's `to_little_endian_64` amount encoding.
pub fn decode_amount(bytes: &[u8]) -> Result<u64, DecodeError> {
    let bytes: [u8; 8] = bytes
        .try_into()
        .map_err(|_| DecodeError::InvalidAmountLength(bytes.len()))?;
    Ok(u64::from_le_bytes(bytes))
}

/// Decode every candidate transaction of an ordered scan.
pub fn decode_block_results(
    blocks: &[BlockResult],
    policy: DecodePolicy,
) -> Result<DecodeOutcome, TransactionDecodeError> {
    let mut outcome = DecodeOutcome::default();

    for block in blocks {
        for tx in &block.transactions {
            match decode_deposit(tx) {
                Ok(record) => outcome.records.push(record),
                Err(source) => {
                    let err = TransactionDecodeError {
                        block_number: block.block_number,
                        hash: tx.hash,
                        source,
                    };
                    match policy {
                        DecodePolicy::Strict => return Err(err),
                        DecodePolicy::Skip => {
                            warn!("Skipping undecodable deposit: {}", err);
                            outcome.skipped.push(err);
                        }
                    }
                }
            }
        }
    }

    info!(
        "Decoded {} deposits ({} skipped)",
        outcome.records.len(),
        outcome.skipped.len()
    );
    Ok(outcome)
}
