use std::collections::{HashMap, HashSet};
use std::sync::{Arc, RwLock};

use thiserror::Error;

use crate::database::StoreError;

/// Point-in-time view of every watch: chat id -> watched addresses.
pub type WatchSnapshot = HashMap<String, HashSet<String>>;

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("watch store error: {0}")]
    Store(#[from] StoreError),
    #[error("snapshot failed: {0}")]
    Snapshot(String),
}

/// Source of watched addresses, read by the poll loop once per tick.
/// The snapshot only needs to be consistent for a single scan pass;
/// a mutation landing mid-tick is observed by the next tick.
pub trait WatchRegistry: Send + Sync {
    fn snapshot(&self) -> Result<WatchSnapshot, RegistryError>;
}

impl<T: WatchRegistry + ?Sized> WatchRegistry for Arc<T> {
    fn snapshot(&self) -> Result<WatchSnapshot, RegistryError> {
        (**self).snapshot()
    }
}

/// Thread-safe in-memory registry. A coarse lock is enough: the poll
/// loop reads once per tick and mutations are rare.
#[derive(Default)]
pub struct InMemoryWatchRegistry {
    inner: RwLock<WatchSnapshot>,
}

impl InMemoryWatchRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an address for a chat. Duplicate entries are ignored.
    pub fn add(&self, chat_id: &str, address: &str) {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        inner
            .entry(chat_id.to_string())
            .or_default()
            .insert(address.to_string());
    }

    /// Remove an address from a chat's watch set. Returns whether the
    /// entry existed.
    pub fn remove(&self, chat_id: &str, address: &str) -> bool {
        let mut inner = self.inner.write().expect("registry lock poisoned");
        let removed = inner
            .get_mut(chat_id)
            .map(|set| set.remove(address))
            .unwrap_or(false);
        let now_empty = inner.get(chat_id).map(|set| set.is_empty()).unwrap_or(false);
        if now_empty {
            inner.remove(chat_id);
        }
        removed
    }

    pub fn list(&self, chat_id: &str) -> Vec<String> {
        let inner = self.inner.read().expect("registry lock poisoned");
        inner
            .get(chat_id)
            .map(|set| {
                let mut addrs: Vec<String> = set.iter().cloned().collect();
                addrs.sort();
                addrs
            })
            .unwrap_or_default()
    }
}

impl WatchRegistry for InMemoryWatchRegistry {
    fn snapshot(&self) -> Result<WatchSnapshot, RegistryError> {
        let inner = self
            .inner
            .read()
            .map_err(|_| RegistryError::Snapshot("registry lock poisoned".to_string()))?;
        Ok(inner.clone())
    }
}
