pub mod api;
pub mod blockchain;
pub mod config;
pub mod database;
pub mod error;
pub mod logging;
pub mod models;
pub mod notifier;
pub mod registry;
pub mod retry;

pub use blockchain::{AddressWatcher, ChainReader, ChainSource, RpcClient, WatcherConfig};
pub use config::AppConfig;
pub use database::WatchStore;
pub use error::{Result, RpcError, WatcherError};
pub use notifier::{NotifierSink, TelegramNotifier};
pub use registry::{InMemoryWatchRegistry, WatchRegistry};
pub use retry::{RetryConfig, RetryManager};
