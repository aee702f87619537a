use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use thiserror::Error;

const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

#[derive(Error, Debug)]
pub enum NotifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// Destination for notification events. The poll loop calls this once
/// per event; a failure is logged by the caller and never aborts the
/// remaining dispatches.
#[async_trait]
pub trait NotifierSink: Send + Sync {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), NotifyError>;
}

#[async_trait]
impl<T: NotifierSink + ?Sized> NotifierSink for std::sync::Arc<T> {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        (**self).notify(chat_id, text).await
    }
}

/// Telegram Bot API sink sending plain-text messages via sendMessage.
pub struct TelegramNotifier {
    client: Client,
    api_base: String,
    token: String,
}

impl TelegramNotifier {
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, TELEGRAM_API_BASE.to_string())
    }

    /// Custom API base, used to point at a mock server in tests.
    pub fn with_api_base(token: String, api_base: String) -> Self {
        Self {
            client: Client::new(),
            api_base,
            token,
        }
    }
}

#[async_trait]
impl NotifierSink for TelegramNotifier {
    async fn notify(&self, chat_id: &str, text: &str) -> Result<(), NotifyError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let payload = json!({ "chat_id": chat_id, "text": text });

        let response = self.client.post(&url).json(&payload).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(NotifyError::Api(format!("HTTP status {}", status.as_u16())));
        }

        let body: Value = response.json().await?;
        if !body.get("ok").and_then(Value::as_bool).unwrap_or(false) {
            let description = body
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error");
            return Err(NotifyError::Api(description.to_string()));
        }

        Ok(())
    }
}
