use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use log::{error, info};

use eth_wallet_watcher::api::ApiServer;
use eth_wallet_watcher::blockchain::{AddressWatcher, ChainReader, RpcClient, WatcherConfig};
use eth_wallet_watcher::config::AppConfig;
use eth_wallet_watcher::database::WatchStore;
use eth_wallet_watcher::error::ConfigError;
use eth_wallet_watcher::logging::init_logging;
use eth_wallet_watcher::notifier::TelegramNotifier;
use eth_wallet_watcher::retry::RetryConfig;

#[derive(Parser)]
#[command(name = "watcher")]
#[command(about = "Watches an Ethereum chain for transactions touching registered addresses")]
#[command(version)]
struct Args {
    /// Configuration file path (defaults to ./config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Watch database path override
    #[arg(long)]
    database: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    if let Some(path) = args.config {
        std::env::set_var("CONFIG_FILE", path);
    }

    let config = AppConfig::load()?;
    init_logging(&config.logging);

    info!("Starting Ethereum wallet watcher");

    if config.telegram.bot_token.is_empty() {
        return Err(ConfigError::MissingValue("telegram.bot_token".to_string()).into());
    }

    let db_path = args.database.unwrap_or_else(|| config.database.path.clone());
    let store = Arc::new(WatchStore::open(&db_path)?);

    let retry = RetryConfig {
        max_attempts: config.rpc.max_retries,
        initial_delay: Duration::from_secs(config.rpc.retry_delay_seconds),
        max_delay: Duration::from_secs(config.rpc.max_retry_delay_seconds),
        backoff_multiplier: 2.0,
        jitter: false,
    };
    let rpc = RpcClient::with_config(
        config.rpc.endpoint.clone(),
        config.rpc.timeout_seconds,
        retry,
    );
    let reader = ChainReader::new(rpc);
    let notifier = TelegramNotifier::new(config.telegram.bot_token.clone());

    let watcher = Arc::new(AddressWatcher::new(
        reader.clone(),
        Arc::clone(&store),
        notifier,
        WatcherConfig {
            poll_interval: Duration::from_secs(config.watcher.poll_interval_seconds),
            max_blocks_per_tick: config.watcher.max_blocks_per_tick,
        },
    ));
    watcher.init().await?;

    // Ctrl-C requests shutdown; the loop exits at its next sleep boundary.
    let shutdown = watcher.shutdown_handle();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("received shutdown signal");
                shutdown.store(true, Ordering::Relaxed);
            }
            Err(err) => error!("unable to listen for shutdown signal: {}", err),
        }
    });

    let cursor = watcher.cursor_handle();
    let watcher_task = {
        let watcher = Arc::clone(&watcher);
        tokio::spawn(async move { watcher.run().await })
    };

    if config.api.enabled {
        let server = ApiServer::new(
            store,
            reader,
            cursor,
            config.api.host.clone(),
            config.api.port,
        );
        tokio::select! {
            result = server.start() => {
                if let Err(e) = result {
                    error!("API server failed: {}", e);
                }
            }
            _ = watcher_task => {}
        }
    } else {
        let _ = watcher_task.await;
    }

    info!("watcher stopped");
    Ok(())
}
