use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use rusqlite::{params, Connection};
use thiserror::Error;

use crate::database::schema::initialize_schema;
use crate::registry::{RegistryError, WatchRegistry, WatchSnapshot};

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database connection failed: {0}")]
    Connection(#[from] rusqlite::Error),
    #[error("database operation failed: {0}")]
    Operation(String),
}

/// SQLite-backed store of chat -> watched-address associations.
/// Shared between the command path (writes) and the poll loop (reads)
/// behind a coarse lock; mutation frequency is low.
pub struct WatchStore {
    conn: Arc<Mutex<Connection>>,
}

impl WatchStore {
    /// Open (or create) the store at the given path and initialize the
    /// schema.
    pub fn open(db_path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(db_path)?;
        initialize_schema(&conn)?;
        Ok(WatchStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// In-memory store for tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(WatchStore {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Register an address for a chat. Duplicate pairs are ignored.
    pub fn add_watch(&self, chat_id: &str, address: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR IGNORE INTO watches (chat_id, address) VALUES (?1, ?2)",
            params![chat_id, address],
        )?;
        Ok(())
    }

    /// Remove an address from a chat's watch set. Returns whether a
    /// row was deleted.
    pub fn remove_watch(&self, chat_id: &str, address: &str) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let rows = conn.execute(
            "DELETE FROM watches WHERE chat_id = ?1 AND address = ?2",
            params![chat_id, address],
        )?;
        Ok(rows > 0)
    }

    /// All addresses watched by one chat, sorted for stable output.
    pub fn list_watch(&self, chat_id: &str) -> Result<Vec<String>, StoreError> {
        let conn = self.lock()?;
        let mut stmt =
            conn.prepare("SELECT address FROM watches WHERE chat_id = ?1 ORDER BY address")?;
        let rows = stmt.query_map(params![chat_id], |row| row.get::<_, String>(0))?;

        let mut addresses = Vec::new();
        for row in rows {
            addresses.push(row?);
        }
        Ok(addresses)
    }

    /// Every watch in the store, grouped by chat id.
    pub fn all_watches(&self) -> Result<HashMap<String, HashSet<String>>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare("SELECT chat_id, address FROM watches")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut watches: HashMap<String, HashSet<String>> = HashMap::new();
        for row in rows {
            let (chat_id, address) = row?;
            watches.entry(chat_id).or_default().insert(address);
        }
        Ok(watches)
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::Operation("failed to acquire lock".to_string()))
    }
}

impl WatchRegistry for WatchStore {
    fn snapshot(&self) -> Result<WatchSnapshot, RegistryError> {
        Ok(self.all_watches()?)
    }
}
