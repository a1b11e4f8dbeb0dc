//! In-memory ledger for tests.
//!
//! Serves scripted blocks and receipts, injects transient failures and
//! per-block latency, and records call counts and peak concurrency.

use crate::decoder::{depositCall, DepositEvent};
use crate::retry::RetryConfig;
use crate::rpc::{LedgerClient, RpcError};
use crate::types::{Block, Log, Receipt, Transaction};
use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{SolCall, SolEvent};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

#[derive(Default)]
pub(crate) struct MockLedger {
    blocks: HashMap<u64, Vec<Transaction>>,
    receipts: HashMap<B256, Receipt>,
    delays: HashMap<u64, Duration>,
    pending_failures: Mutex<HashMap<u64, usize>>,
    head: u64,
    block_calls: AtomicUsize,
    receipt_calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `transactions` for block `number`. Unregistered blocks are empty.
    pub fn with_block(mut self, number: u64, transactions: Vec<Transaction>) -> Self {
        self.blocks.insert(number, transactions);
        self.head = self.head.max(number);
        self
    }

    /// Serve a receipt for the transaction whose hash ends in `hash_byte`.
    pub fn with_receipt(mut self, hash_byte: u8, status: u64, logs: Vec<Log>) -> Self {
        self.receipts.insert(
            B256::with_last_byte(hash_byte),
            Receipt {
                status: Some(status),
                logs,
            },
        );
        self
    }

    /// Delay the block fetch for `number` by `delay`.
    pub fn with_delay(mut self, number: u64, delay: Duration) -> Self {
        self.delays.insert(number, delay);
        self
    }

    /// Fail the next `times` fetches of block `number` transiently.
    pub fn fail_block(self, number: u64, times: usize) -> Self {
        self.pending_failures
            .lock()
            .unwrap()
            .insert(number, times);
        self
    }

    pub fn block_calls(&self) -> usize {
        self.block_calls.load(Ordering::SeqCst)
    }

    pub fn receipt_calls(&self) -> usize {
        self.receipt_calls.load(Ordering::SeqCst)
    }

    /// Peak number of block fetches observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn take_failure(&self, number: u64) -> bool {
        let mut failures = self.pending_failures.lock().unwrap();
        match failures.get_mut(&number) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl LedgerClient for MockLedger {
    async fn get_block_by_number(&self, number: u64) -> Result<Block, RpcError> {
        self.block_calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        match self.delays.get(&number) {
            Some(delay) => tokio::time::sleep(*delay).await,
            None => tokio::task::yield_now().await,
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.take_failure(number) {
            return Err(RpcError::Rpc {
                code: -32000,
                message: "header not found".to_string(),
            });
        }

        Ok(Block {
            number,
            hash: B256::left_padding_from(&number.to_be_bytes()),
            transactions: self.blocks.get(&number).cloned().unwrap_or_default(),
        })
    }

    async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Receipt, RpcError> {
        self.receipt_calls.fetch_add(1, Ordering::SeqCst);
        self.receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| RpcError::Malformed(format!("unknown receipt {:?}", tx_hash)))
    }

    async fn get_block_number(&self) -> Result<u64, RpcError> {
        Ok(self.head)
    }
}

/// Retry budget with millisecond delays.
pub(crate) fn fast_retry() -> RetryConfig {
    RetryConfig {
        max_retries: 5,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(4),
    }
}

/// A transaction whose hash ends in `hash_byte`.
pub(crate) fn transaction(hash_byte: u8, to: Option<Address>, input: Vec<u8>) -> Transaction {
    Transaction {
        hash: B256::with_last_byte(hash_byte),
        from: Address::repeat_byte(0xee),
        to,
        input,
    }
}

/// Call input for `deposit(pubkey, withdrawal_credentials, signature, deposit_data_root)`.
pub(crate) fn deposit_input(
    pubkey: &[u8],
    withdrawal_credentials: &[u8],
    signature: &[u8],
    deposit_data_root: B256,
) -> Vec<u8> {
    depositCall {
        pubkey: Bytes::copy_from_slice(pubkey),
        withdrawal_credentials: Bytes::copy_from_slice(withdrawal_credentials),
        signature: Bytes::copy_from_slice(signature),
        deposit_data_root,
    }
    .abi_encode()
}

/// A `DepositEvent` log emitted by `contract`.
pub(crate) fn deposit_log(
    contract: Address,
    pubkey: &[u8],
    withdrawal_credentials: &[u8],
    amount: u64,
    signature: &[u8],
    index: u64,
) -> Log {
    let event = DepositEvent {
        pubkey: Bytes::copy_from_slice(pubkey),
        withdrawal_credentials: Bytes::copy_from_slice(withdrawal_credentials),
        amount: Bytes::copy_from_slice(&amount.to_le_bytes()),
        signature: Bytes::copy_from_slice(signature),
        index: Bytes::copy_from_slice(&index.to_le_bytes()),
    };
    Log {
        address: contract,
        topics: vec![DepositEvent::SIGNATURE_HASH],
        data: event.encode_data(),
    }
}
