use serde::{Deserialize, Serialize};

use crate::error::RpcError;

/// A block as returned by eth_getBlockByNumber with full transaction objects.
/// Immutable once fetched; held only for the current scan pass.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Block {
    pub number: String,
    pub hash: String,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

impl Block {
    /// Block height decoded from the hex-encoded `number` field.
    pub fn height(&self) -> Result<u64, RpcError> {
        parse_hex_u64(&self.number)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct Transaction {
    pub hash: String,
    pub from: String,
    /// Absent for contract-creation transactions.
    pub to: Option<String>,
}

/// Decode a hex-encoded quantity ("0x1b4" or "1b4") into a u64.
pub fn parse_hex_u64(hex_str: &str) -> Result<u64, RpcError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u64::from_str_radix(hex_without_prefix, 16)
        .map_err(|e| RpcError::Decode(format!("failed to parse hex '{}' as u64: {}", hex_str, e)))
}

/// Decode a hex-encoded quantity into a u128 (balances in wei).
pub fn parse_hex_u128(hex_str: &str) -> Result<u128, RpcError> {
    let hex_without_prefix = hex_str.strip_prefix("0x").unwrap_or(hex_str);
    u128::from_str_radix(hex_without_prefix, 16)
        .map_err(|e| RpcError::Decode(format!("failed to parse hex '{}' as u128: {}", hex_str, e)))
}
