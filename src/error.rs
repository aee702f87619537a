use thiserror::Error;

/// Top-level error type for the wallet watcher
#[derive(Error, Debug)]
pub enum WatcherError {
    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Address error: {0}")]
    Address(#[from] AddressError),

    #[error("Registry error: {0}")]
    Registry(#[from] crate::registry::RegistryError),

    #[error("Watch store error: {0}")]
    Store(#[from] crate::database::StoreError),

    #[error("Notification error: {0}")]
    Notify(#[from] crate::notifier::NotifyError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Failures of a single JSON-RPC exchange with the node.
///
/// `Transport` and the 502/503/504 statuses are transient and eligible for
/// retry; everything else aborts immediately.
#[derive(Error, Debug)]
pub enum RpcError {
    #[error("transport failure: {0}")]
    Transport(String),

    #[error("request timed out after {seconds}s")]
    Timeout { seconds: u64 },

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("node returned error: code={code}, message={message}")]
    Protocol { code: i64, message: String },

    #[error("failed to decode response: {0}")]
    Decode(String),
}

impl RpcError {
    /// Whether a retry of the same idempotent call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            RpcError::Transport(_) | RpcError::Timeout { .. } | RpcError::Status(502 | 503 | 504)
        )
    }
}

/// Rejections of syntactically invalid address input
#[derive(Error, Debug)]
pub enum AddressError {
    #[error("address must be 40 hex characters after the 0x prefix, got {0}")]
    Length(usize),

    #[error("address contains non-hexadecimal characters: {0}")]
    NonHex(String),
}

/// Configuration load/validation errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Missing required configuration value: {0}")]
    MissingValue(String),

    #[error("Invalid configuration value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    #[error("Configuration parsing failed: {0}")]
    Parsing(String),

    #[error("Invalid URL format: {0}")]
    InvalidUrl(String),
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, WatcherError>;
