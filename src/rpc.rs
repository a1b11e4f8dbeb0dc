//! JSON-RPC client for Ethereum nodes
//!
//! Provides a typed interface to Ethereum JSON-RPC endpoints.
//! Handles hex string parsing and classifies failures as transient
//! (worth retrying) or permanent.

use crate::types::{parse_hex_u64, Block, Receipt};
use alloy_primitives::B256;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors returned by a ledger client.
#[derive(Debug, Error)]
pub enum RpcError {
    /// Network failure, timeout, or unreadable response body.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-success HTTP status from the endpoint.
    #[error("HTTP status {0}")]
    Http(u16),

    /// JSON-RPC error object returned by the node.
    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    /// The node returned `null` for the requested object.
    #[error("{0} not found")]
    NotFound(String),

    /// The response was well-formed JSON but did not match the expected shape.
    #[error("failed to deserialize {what}: {source}")]
    Deserialize {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The response is missing a field or has a field of the wrong type.
    #[error("malformed RPC response: {0}")]
    Malformed(String),
}

impl RpcError {
    /// Whether retrying the same request could succeed.
    ///
    /// Request-shape errors (`-32700`..`-32600` plus invalid method/params) and
    /// undecodable payloads are permanent. Everything else, including a
    /// `null` result from a node that has not caught up yet, is transient.
    pub fn is_transient(&self) -> bool {
        match self {
            RpcError::Transport(e) => !e.is_builder(),
            RpcError::Http(status) => *status == 408 || *status == 429 || *status >= 500,
            RpcError::Rpc { code, .. } => !matches!(code, -32700 | -32600 | -32601 | -32602),
            RpcError::NotFound(_) => true,
            RpcError::Deserialize { .. } | RpcError::Malformed(_) => false,
        }
    }
}

/// Read access to the ledger needed by the scanner.
///
/// Implementations must be safe to share between concurrently running
/// block scans.
#[async_trait]
pub trait LedgerClient: Send + Sync {
    /// Get a block by number with full transaction objects.
    async fn get_block_by_number(&self, number: u64) -> Result<Block, RpcError>;

    /// Get a transaction receipt by hash.
    async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Receipt, RpcError>;

    /// Get the number of the most recent block.
    async fn get_block_number(&self) -> Result<u64, RpcError>;
}

/// JSON-RPC client for Ethereum nodes.
pub struct RpcClient {
    client: reqwest::Client,
    url: String,
}

impl RpcClient {
    /// Create a new RPC client.
    pub fn new(url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            url,
        }
    }

    /// Create a new RPC client whose requests fail after `timeout`.
    ///
    /// A timed-out request surfaces as a transient [`RpcError::Transport`].
    pub fn with_timeout(url: String, timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client, url })
    }

    /// Make a JSON-RPC call.
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });

        let response = self.client.post(&self.url).json(&request).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Http(status.as_u16()));
        }

        let json: Value = response.json().await?;
        parse_response(json)
    }
}

/// Split a JSON-RPC response envelope into its result or error.
fn parse_response(mut json: Value) -> Result<Value, RpcError> {
    if let Some(error) = json.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or(0);
        let message = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        return Err(RpcError::Rpc { code, message });
    }

    json.get_mut("result")
        .map(Value::take)
        .ok_or_else(|| RpcError::Malformed("missing 'result' field".to_string()))
}

#[async_trait]
impl LedgerClient for RpcClient {
    async fn get_block_by_number(&self, number: u64) -> Result<Block, RpcError> {
        let params = json!([format!("0x{:x}", number), true]);
        let result = self.call("eth_getBlockByNumber", params).await?;
        if result.is_null() {
            return Err(RpcError::NotFound(format!("block {}", number)));
        }
        serde_json::from_value(result).map_err(|source| RpcError::Deserialize {
            what: "block",
            source,
        })
    }

    async fn get_transaction_receipt(&self, tx_hash: B256) -> Result<Receipt, RpcError> {
        let params = json!([format!("0x{:x}", tx_hash)]);
        let result = self.call("eth_getTransactionReceipt", params).await?;
        if result.is_null() {
            return Err(RpcError::NotFound(format!("receipt for {:?}", tx_hash)));
        }
        serde_json::from_value(result).map_err(|source| RpcError::Deserialize {
            what: "receipt",
            source,
        })
    }

    async fn get_block_number(&self) -> Result<u64, RpcError> {
        let result = self.call("eth_blockNumber", json!([])).await?;
        let number_str = result
            .as_str()
            .ok_or_else(|| RpcError::Malformed("block number is not a string".to_string()))?;
        parse_hex_u64(number_str)
            .map_err(|e| RpcError::Malformed(format!("invalid block number {}: {}", number_str, e)))
    }
}
