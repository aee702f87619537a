use std::env;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub rpc: RpcConfig,
    pub watcher: WatcherSettings,
    pub database: DatabaseConfig,
    pub telegram: TelegramConfig,
    pub api: ApiConfig,
    pub logging: LoggingConfig,
}

/// RPC client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcConfig {
    /// Ethereum JSON-RPC endpoint URL
    pub endpoint: String,
    /// Per-call request timeout in seconds
    pub timeout_seconds: u64,
    /// Total attempt budget for idempotent calls
    pub max_retries: u32,
    /// Initial backoff delay in seconds, doubling per attempt
    pub retry_delay_seconds: u64,
    /// Cap on the backoff delay in seconds
    pub max_retry_delay_seconds: u64,
}

/// Poll loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatcherSettings {
    /// Block polling interval in seconds
    pub poll_interval_seconds: u64,
    /// Maximum blocks scanned in a single tick
    pub max_blocks_per_tick: u64,
}

/// Watch store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite database file path
    pub path: String,
}

/// Telegram delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// Bot API token; required to send notifications
    pub bot_token: String,
}

/// Status API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Enable the HTTP status server
    pub enabled: bool,
    /// Server bind address
    pub host: String,
    /// Server port
    pub port: u16,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rpc: RpcConfig::default(),
            watcher: WatcherSettings::default(),
            database: DatabaseConfig::default(),
            telegram: TelegramConfig::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://cloudflare-eth.com/".to_string(),
            timeout_seconds: 20,
            max_retries: 5,
            retry_delay_seconds: 1,
            max_retry_delay_seconds: 60,
        }
    }
}

impl Default for WatcherSettings {
    fn default() -> Self {
        Self {
            poll_interval_seconds: 30,
            max_blocks_per_tick: 10,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "./watches.db".to_string(),
        }
    }
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
        }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file and environment variables.
    /// Environment variables take precedence over file values.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from_file().unwrap_or_default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a TOML file (`config.toml`, or the path
    /// in `CONFIG_FILE`). A missing file yields the defaults.
    pub fn load_from_file() -> Result<Self, ConfigError> {
        let config_path = env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".to_string());

        if !Path::new(&config_path).exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| ConfigError::FileNotFound(config_path.clone()))?;
        let config: AppConfig =
            toml::from_str(&content).map_err(|e| ConfigError::Parsing(e.to_string()))?;
        Ok(config)
    }

    /// Apply environment variable overrides
    pub fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Ok(endpoint) = env::var("ETH_RPC_URL") {
            self.rpc.endpoint = endpoint;
        }
        if let Ok(timeout) = env::var("RPC_TIMEOUT_SECONDS") {
            self.rpc.timeout_seconds = parse_env("RPC_TIMEOUT_SECONDS", &timeout)?;
        }
        if let Ok(retries) = env::var("RPC_MAX_RETRIES") {
            self.rpc.max_retries = parse_env("RPC_MAX_RETRIES", &retries)?;
        }

        if let Ok(interval) = env::var("POLL_INTERVAL") {
            self.watcher.poll_interval_seconds = parse_env("POLL_INTERVAL", &interval)?;
        }
        if let Ok(max_blocks) = env::var("MAX_BLOCKS_PER_TICK") {
            self.watcher.max_blocks_per_tick = parse_env("MAX_BLOCKS_PER_TICK", &max_blocks)?;
        }

        if let Ok(path) = env::var("DATABASE_PATH") {
            self.database.path = path;
        }
        if let Ok(token) = env::var("BOT_TOKEN") {
            self.telegram.bot_token = token;
        }

        if let Ok(enabled) = env::var("API_ENABLED") {
            self.api.enabled = parse_env("API_ENABLED", &enabled)?;
        }
        if let Ok(host) = env::var("API_HOST") {
            self.api.host = host;
        }
        if let Ok(port) = env::var("API_PORT") {
            self.api.port = parse_env("API_PORT", &port)?;
        }

        if let Ok(level) = env::var("LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = env::var("LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.rpc.endpoint.starts_with("http://") && !self.rpc.endpoint.starts_with("https://") {
            return Err(ConfigError::InvalidUrl(self.rpc.endpoint.clone()));
        }

        if self.rpc.timeout_seconds == 0 || self.rpc.timeout_seconds > 300 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.timeout_seconds".to_string(),
                value: self.rpc.timeout_seconds.to_string(),
            });
        }

        if self.rpc.max_retries == 0 || self.rpc.max_retries > 20 {
            return Err(ConfigError::InvalidValue {
                key: "rpc.max_retries".to_string(),
                value: self.rpc.max_retries.to_string(),
            });
        }

        if self.watcher.poll_interval_seconds == 0 || self.watcher.poll_interval_seconds > 3600 {
            return Err(ConfigError::InvalidValue {
                key: "watcher.poll_interval_seconds".to_string(),
                value: self.watcher.poll_interval_seconds.to_string(),
            });
        }

        if self.watcher.max_blocks_per_tick == 0 || self.watcher.max_blocks_per_tick > 1000 {
            return Err(ConfigError::InvalidValue {
                key: "watcher.max_blocks_per_tick".to_string(),
                value: self.watcher.max_blocks_per_tick.to_string(),
            });
        }

        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "database.path".to_string(),
                value: self.database.path.clone(),
            });
        }

        if self.api.enabled && self.api.port == 0 {
            return Err(ConfigError::InvalidValue {
                key: "api.port".to_string(),
                value: self.api.port.to_string(),
            });
        }

        let valid_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.level".to_string(),
                value: self.logging.level.clone(),
            });
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            return Err(ConfigError::InvalidValue {
                key: "logging.format".to_string(),
                value: self.logging.format.clone(),
            });
        }

        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}
