//! Record types produced by a deposit scan
//!
//! [`CandidateTransaction`] and [`BlockResult`] carry raw scan output from
//! the block scanner to the decoder. [`DepositRecord`] is the decoded result,
//! serialized in the layout consumers of `deposit_data.json` expect.

use crate::types::Log;
use alloy_primitives::B256;
use serde::{Serialize, Serializer};

/// A successful transaction sent to the target contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateTransaction {
    /// Transaction hash
    pub hash: B256,
    /// Raw call input, including the 4-byte selector
    pub input: Vec<u8>,
    /// Logs from the transaction's receipt, in emission order
    pub logs: Vec<Log>,
}

/// Scan output for one block.
///
/// Produced for every block in the range, with an empty `transactions` list
/// when nothing matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockResult {
    pub block_number: u64,
    pub transactions: Vec<CandidateTransaction>,
}

/// A decoded deposit.
///
/// Field order is the JSON output order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DepositRecord {
    /// Validator BLS public key
    #[serde(serialize_with = "serialize_hex")]
    pub pubkey: Vec<u8>,
    #[serde(serialize_with = "serialize_hex")]
    pub withdrawal_credentials: Vec<u8>,
    /// Deposit amount in gwei
    pub amount: u64,
    /// BLS signature over the deposit message
    #[serde(serialize_with = "serialize_hex")]
    pub signature: Vec<u8>,
    /// Data root submitted with the `deposit` call
    #[serde(serialize_with = "serialize_hex")]
    pub deposit_data_root: B256,
}

/// Serialize bytes as a lowercase `0x`-prefixed hex string.
fn serialize_hex<S, T>(bytes: &T, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
    T: AsRef<[u8]>,
{
    serializer.serialize_str(&format!("0x{}", hex::encode(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_record_json_layout() {
        let record = DepositRecord {
            pubkey: vec![0xAB, 0xCD],
            withdrawal_credentials: vec![0x00, 0x01],
            amount: 32_000_000_000,
            signature: vec![0xFF],
            deposit_data_root: B256::repeat_byte(0x11),
        };

        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(
            json,
            format!(
                "{{\"pubkey\":\"0xabcd\",\"withdrawal_credentials\":\"0x0001\",\"amount\":32000000000,\
                 \"signature\":\"0xff\",\"deposit_data_root\":\"0x{}\"}}",
                "11".repeat(32)
            )
        );
    }
}
