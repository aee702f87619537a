use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Serialize;
use thiserror::Error;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;

use crate::blockchain::ChainReader;
use crate::database::WatchStore;
use crate::models::{from_wei, to_checksum};

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Server error: {0}")]
    Server(String),
}

/// Response structure for the status endpoint
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub cursor: u64,
    pub watched_chats: usize,
    pub watched_addresses: usize,
}

/// Response structure for the balance endpoint
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub address: String,
    pub wei: String,
    pub eth: String,
}

/// Error response structure
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<WatchStore>,
    pub reader: ChainReader,
    pub cursor: Arc<AtomicU64>,
}

/// HTTP status server
pub struct ApiServer {
    state: AppState,
    host: String,
    pub port: u16,
}

impl ApiServer {
    pub fn new(
        store: Arc<WatchStore>,
        reader: ChainReader,
        cursor: Arc<AtomicU64>,
        host: String,
        port: u16,
    ) -> Self {
        Self {
            state: AppState { store, reader, cursor },
            host,
            port,
        }
    }

    /// Start the HTTP server
    pub async fn start(&self) -> Result<(), ApiError> {
        let app = Router::new()
            .route("/health", get(get_health))
            .route("/status", get(get_status))
            .route("/balance/:address", get(get_balance))
            .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
            .with_state(self.state.clone());

        let addr = format!("{}:{}", self.host, self.port);
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| ApiError::Server(format!("failed to bind to {}: {}", addr, e)))?;

        log::info!("HTTP status server starting on {}", addr);

        axum::serve(listener, app)
            .await
            .map_err(|e| ApiError::Server(format!("server error: {}", e)))?;

        Ok(())
    }
}

/// GET /health - liveness probe
pub async fn get_health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

/// GET /status - watcher progress and watch-list size
pub async fn get_status(
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, (StatusCode, Json<ErrorResponse>)> {
    match state.store.all_watches() {
        Ok(watches) => {
            let watched_addresses = watches.values().map(|set| set.len()).sum();
            Ok(Json(StatusResponse {
                status: "healthy".to_string(),
                cursor: state.cursor.load(Ordering::SeqCst),
                watched_chats: watches.len(),
                watched_addresses,
            }))
        }
        Err(e) => {
            log::error!("failed to read watch store: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse {
                    error: "store_error".to_string(),
                    message: format!("failed to read watch store: {}", e),
                }),
            ))
        }
    }
}

/// GET /balance/{address} - account balance at the latest state
pub async fn get_balance(
    Path(address): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<BalanceResponse>, (StatusCode, Json<ErrorResponse>)> {
    let checksummed = to_checksum(&address).map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "invalid_address".to_string(),
                message: e.to_string(),
            }),
        )
    })?;

    match state.reader.balance(&checksummed).await {
        Ok(wei) => Ok(Json(BalanceResponse {
            address: checksummed,
            wei: wei.to_string(),
            eth: from_wei(wei),
        })),
        Err(e) => {
            log::error!("balance query for {} failed: {}", checksummed, e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: "rpc_error".to_string(),
                    message: format!("balance query failed: {}", e),
                }),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use crate::blockchain::RpcClient;
    use crate::retry::RetryConfig;

    fn test_state(endpoint: &str) -> AppState {
        let retry = RetryConfig {
            max_attempts: 1,
            initial_delay: Duration::from_millis(1),
            max_delay: Duration::from_millis(10),
            backoff_multiplier: 2.0,
            jitter: false,
        };
        AppState {
            store: Arc::new(WatchStore::open_in_memory().unwrap()),
            reader: ChainReader::new(RpcClient::with_config(endpoint.to_string(), 5, retry)),
            cursor: Arc::new(AtomicU64::new(0)),
        }
    }

    #[tokio::test]
    async fn test_health() {
        let response = get_health().await;
        assert_eq!(response.0["status"], "ok");
    }

    #[tokio::test]
    async fn test_status_reports_cursor_and_watch_counts() {
        let state = test_state("http://localhost:1");
        state.store.add_watch("chatA", "0x1111").unwrap();
        state.store.add_watch("chatA", "0x2222").unwrap();
        state.store.add_watch("chatB", "0x1111").unwrap();
        state.cursor.store(12345, Ordering::SeqCst);

        let response = get_status(State(state)).await.unwrap();
        assert_eq!(response.0.cursor, 12345);
        assert_eq!(response.0.watched_chats, 2);
        assert_eq!(response.0.watched_addresses, 3);
    }

    #[tokio::test]
    async fn test_balance_rejects_invalid_address() {
        let state = test_state("http://localhost:1");
        let result = get_balance(Path("0xINVALID".to_string()), State(state)).await;

        let (status, body) = result.err().unwrap();
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.error, "invalid_address");
    }

    #[tokio::test]
    async fn test_balance_returns_checksummed_address_and_units() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(200)
            .with_header("content-type", "application/json")
            // 1.5 ETH in wei
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":"0x14d1120d7b160000"}"#)
            .create_async()
            .await;

        let state = test_state(&server.url());
        let result = get_balance(
            Path("0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed".to_string()),
            State(state),
        )
        .await
        .unwrap();

        assert_eq!(result.0.address, "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed");
        assert_eq!(result.0.wei, "1500000000000000000");
        assert_eq!(result.0.eth, "1.5");
    }
}
