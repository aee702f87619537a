use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::RpcError;
use crate::retry::{RetryConfig, RetryManager};

const DEFAULT_TIMEOUT_SECONDS: u64 = 20;

#[derive(Debug, Serialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    method: String,
    params: Vec<Value>,
    id: u64,
}

#[derive(Debug, Deserialize)]
struct JsonRpcResponse {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    result: Option<Value>,
    error: Option<JsonRpcError>,
    #[allow(dead_code)]
    id: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct JsonRpcError {
    code: i64,
    message: String,
}

/// Low-level JSON-RPC 2.0 transport to the configured node endpoint.
/// Connections are pooled and reused across calls; the pool is shared
/// wherever the client is cloned.
#[derive(Clone)]
pub struct RpcClient {
    client: Client,
    endpoint: String,
    timeout_seconds: u64,
    retry: RetryConfig,
}

impl RpcClient {
    pub fn new(endpoint: String) -> Self {
        Self::with_config(endpoint, DEFAULT_TIMEOUT_SECONDS, RetryConfig::default())
    }

    pub fn with_config(endpoint: String, timeout_seconds: u64, retry: RetryConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(std::time::Duration::from_secs(timeout_seconds))
                .pool_max_idle_per_host(10)
                .pool_idle_timeout(std::time::Duration::from_secs(30))
                .build()
                .expect("Failed to create HTTP client"),
            endpoint,
            timeout_seconds,
            retry,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Perform a single JSON-RPC exchange and return the decoded result
    /// payload. One network round trip, no retries.
    pub async fn call(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let request = JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            method: method.to_string(),
            params,
            id: 1,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    RpcError::Timeout {
                        seconds: self.timeout_seconds,
                    }
                } else {
                    RpcError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Status(status.as_u16()));
        }

        let rpc_response: JsonRpcResponse = response
            .json()
            .await
            .map_err(|e| RpcError::Decode(e.to_string()))?;

        if let Some(error) = rpc_response.error {
            return Err(RpcError::Protocol {
                code: error.code,
                message: error.message,
            });
        }

        rpc_response
            .result
            .ok_or_else(|| RpcError::Decode("no result field in response".to_string()))
    }

    /// `call` wrapped in the retry policy. Only for idempotent
    /// (read-only) methods; every method the watcher uses is a read.
    pub async fn call_with_retry(&self, method: &str, params: Vec<Value>) -> Result<Value, RpcError> {
        let manager = RetryManager::new(method, self.retry.clone());
        manager.execute(|| self.call(method, params.clone())).await
    }
}
