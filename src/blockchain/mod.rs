pub mod chain_reader;
pub mod rpc_client;
pub mod watcher;

pub use chain_reader::{ChainReader, ChainSource};
pub use rpc_client::RpcClient;
pub use watcher::{match_transactions, AddressWatcher, WatcherConfig};
