use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use log::{debug, info, warn};

use crate::blockchain::chain_reader::ChainSource;
use crate::error::{RpcError, WatcherError};
use crate::models::{normalize_address, NotificationEvent, Transaction};
use crate::notifier::NotifierSink;
use crate::registry::{WatchRegistry, WatchSnapshot};

#[derive(Debug, Clone)]
pub struct WatcherConfig {
    /// Sleep between poll ticks
    pub poll_interval: Duration,
    /// Upper bound on blocks scanned in one tick; bounds catch-up work
    /// after downtime
    pub max_blocks_per_tick: u64,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(30),
            max_blocks_per_tick: 10,
        }
    }
}

/// The poll loop: owns the block cursor and drives the scan cycle
/// against injected collaborators. The cursor means "every block up to
/// and including this height has been scanned"; it only moves forward,
/// and only after a block's notifications have been dispatched.
pub struct AddressWatcher<C, R, N> {
    chain: C,
    registry: R,
    notifier: N,
    config: WatcherConfig,
    cursor: Arc<AtomicU64>,
    shutdown: Arc<AtomicBool>,
}

impl<C, R, N> AddressWatcher<C, R, N>
where
    C: ChainSource,
    R: WatchRegistry,
    N: NotifierSink,
{
    pub fn new(chain: C, registry: R, notifier: N, config: WatcherConfig) -> Self {
        Self {
            chain,
            registry,
            notifier,
            config,
            cursor: Arc::new(AtomicU64::new(0)),
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Seed the cursor at the current chain head. Transactions in
    /// blocks before this point are never scanned.
    pub async fn init(&self) -> Result<(), RpcError> {
        let head = self.chain.current_height().await?;
        self.cursor.store(head, Ordering::SeqCst);
        info!("watcher cursor seeded at block {}", head);
        Ok(())
    }

    /// Highest block height already scanned.
    pub fn cursor(&self) -> u64 {
        self.cursor.load(Ordering::SeqCst)
    }

    /// Shared handle for status reporting.
    pub fn cursor_handle(&self) -> Arc<AtomicU64> {
        Arc::clone(&self.cursor)
    }

    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Request the run loop to stop at the next sleep boundary.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::Relaxed);
    }

    /// Run ticks until shutdown is requested. A failed tick is logged
    /// and retried on the next interval; the loop itself never fails.
    pub async fn run(&self) {
        info!(
            "starting watcher: poll interval {:?}, cursor {}",
            self.config.poll_interval,
            self.cursor()
        );
        loop {
            tokio::time::sleep(self.config.poll_interval).await;
            if self.shutdown.load(Ordering::Relaxed) {
                info!("shutdown requested, stopping watcher");
                return;
            }
            match self.tick().await {
                Ok(0) => {}
                Ok(dispatched) => {
                    debug!("dispatched {} notification(s), cursor {}", dispatched, self.cursor())
                }
                Err(e) => warn!("poll tick failed, retrying next interval: {}", e),
            }
        }
    }

    /// One poll pass. Returns the number of events dispatched.
    ///
    /// Any failure before a block is fully handled leaves the cursor
    /// where it was; the next tick picks up from there.
    pub async fn tick(&self) -> Result<usize, WatcherError> {
        let cursor = self.cursor.load(Ordering::SeqCst);
        let head = self.chain.current_height().await?;
        if head <= cursor {
            return Ok(0);
        }

        let snapshot = self.registry.snapshot()?;
        let watches = normalize_snapshot(&snapshot);

        let target = head.min(cursor + self.config.max_blocks_per_tick);
        if target < head {
            debug!("scanning up to block {} of head {}", target, head);
        }

        let mut dispatched = 0;
        for height in (cursor + 1)..=target {
            let block = match self.chain.block_with_transactions(height).await? {
                Some(block) => block,
                None => {
                    debug!("block {} not yet available", height);
                    break;
                }
            };

            let events = match_transactions(height, &block.transactions, &watches);
            for event in &events {
                // One call per event; a failure never blocks the rest.
                if let Err(e) = self.notifier.notify(&event.chat_id, &event.message).await {
                    warn!(
                        "failed to notify chat {} about {}: {}",
                        event.chat_id, event.tx_hash, e
                    );
                }
            }
            dispatched += events.len();

            self.cursor.store(height, Ordering::SeqCst);
        }

        Ok(dispatched)
    }
}

/// Lower-case every watched address once per tick, sorted by chat id
/// for deterministic dispatch order.
pub fn normalize_snapshot(snapshot: &WatchSnapshot) -> Vec<(String, HashSet<String>)> {
    let mut watches: Vec<(String, HashSet<String>)> = snapshot
        .iter()
        .map(|(chat_id, addrs)| {
            let lowered = addrs.iter().map(|a| normalize_address(a)).collect();
            (chat_id.clone(), lowered)
        })
        .collect();
    watches.sort_by(|a, b| a.0.cmp(&b.0));
    watches
}

/// Match a block's transactions against the normalized watch sets.
/// Produces exactly one event per (chat, transaction) pair, even when
/// both endpoints of the transaction are watched by the same chat.
pub fn match_transactions(
    height: u64,
    transactions: &[Transaction],
    watches: &[(String, HashSet<String>)],
) -> Vec<NotificationEvent> {
    let mut events = Vec::new();
    for tx in transactions {
        let from = normalize_address(&tx.from);
        let to = tx.to.as_deref().map(normalize_address);

        for (chat_id, addrs) in watches {
            let hit = addrs.contains(&from)
                || to.as_ref().map_or(false, |to| addrs.contains(to));
            if hit {
                events.push(NotificationEvent::new(chat_id, &tx.hash, height));
            }
        }
    }
    events
}
