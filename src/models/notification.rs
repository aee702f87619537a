use serde::{Deserialize, Serialize};

/// A single pending notification: which chat to tell about which
/// transaction. Created and dispatched within the same poll tick,
/// never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NotificationEvent {
    pub chat_id: String,
    pub tx_hash: String,
    pub message: String,
}

impl NotificationEvent {
    pub fn new(chat_id: &str, tx_hash: &str, block_height: u64) -> Self {
        Self {
            chat_id: chat_id.to_string(),
            tx_hash: tx_hash.to_string(),
            message: format!("Transaction detected: {} (block {})", tx_hash, block_height),
        }
    }
}
