use async_trait::async_trait;
use serde_json::{json, Value};

use crate::blockchain::rpc_client::RpcClient;
use crate::error::RpcError;
use crate::models::{parse_hex_u128, parse_hex_u64, Block};

/// The chain operations the poll loop depends on. Kept behind a trait
/// so the watcher can be exercised against a fake chain in tests.
#[async_trait]
pub trait ChainSource: Send + Sync {
    /// Latest block height known to the node.
    async fn current_height(&self) -> Result<u64, RpcError>;

    /// Full block at `height` with inline transaction objects.
    /// `None` means the node does not have that block yet; the caller
    /// must treat it as "not yet available", not as an error.
    async fn block_with_transactions(&self, height: u64) -> Result<Option<Block>, RpcError>;
}

#[async_trait]
impl<T: ChainSource + ?Sized> ChainSource for std::sync::Arc<T> {
    async fn current_height(&self) -> Result<u64, RpcError> {
        (**self).current_height().await
    }

    async fn block_with_transactions(&self, height: u64) -> Result<Option<Block>, RpcError> {
        (**self).block_with_transactions(height).await
    }
}

/// Typed read operations over the raw RPC client. All operations are
/// idempotent reads and go through the retry policy.
#[derive(Clone)]
pub struct ChainReader {
    rpc: RpcClient,
}

impl ChainReader {
    pub fn new(rpc: RpcClient) -> Self {
        Self { rpc }
    }

    /// Account balance in wei at the latest observed state.
    pub async fn balance(&self, address: &str) -> Result<u128, RpcError> {
        let params = vec![json!(address), json!("latest")];
        let result = self.rpc.call_with_retry("eth_getBalance", params).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::Decode("balance is not a string".to_string()))?;
        parse_hex_u128(hex)
    }
}

#[async_trait]
impl ChainSource for ChainReader {
    async fn current_height(&self) -> Result<u64, RpcError> {
        let result = self.rpc.call_with_retry("eth_blockNumber", vec![]).await?;
        let hex = result
            .as_str()
            .ok_or_else(|| RpcError::Decode("block number is not a string".to_string()))?;
        parse_hex_u64(hex)
    }

    async fn block_with_transactions(&self, height: u64) -> Result<Option<Block>, RpcError> {
        let params = vec![Value::String(format!("0x{:x}", height)), Value::Bool(true)];
        let result = self
            .rpc
            .call_with_retry("eth_getBlockByNumber", params)
            .await?;

        // Requested ahead of the chain head; not an error.
        if result.is_null() {
            return Ok(None);
        }

        let block: Block = serde_json::from_value(result)
            .map_err(|e| RpcError::Decode(format!("failed to parse block {}: {}", height, e)))?;
        Ok(Some(block))
    }
}
