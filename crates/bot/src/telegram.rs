//! Telegram Bot API client: long-poll updates, text and photo sends.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use adsmith_delivery::{Messenger, SendError};

/// Telegram Bot API host.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Long-poll wait passed to `getUpdates`.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 30;

/// Client-side request timeout; generous enough for a long poll plus a
/// photo upload.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Errors from the Telegram transport.
#[derive(Debug, thiserror::Error)]
pub enum TelegramError {
    /// The HTTP request itself failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Telegram answered with `ok: false`.
    #[error("Telegram API error: {0}")]
    Api(String),
}

/// One inbound update, reduced to the fields the bot consumes.
#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

/// An inbound chat message.
#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

/// HTTP client for one bot token.
pub struct TelegramApi {
    client: reqwest::Client,
    base_url: String,
}

impl TelegramApi {
    pub fn new(bot_token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build reqwest HTTP client");
        Self {
            client,
            base_url: format!("{TELEGRAM_API_BASE}/bot{bot_token}"),
        }
    }

    /// Unwrap the `{"ok": ..., "result": ...}` envelope.
    fn unwrap_envelope(data: Value) -> Result<Value, TelegramError> {
        if data.get("ok").and_then(Value::as_bool) != Some(true) {
            let description = data
                .get("description")
                .and_then(Value::as_str)
                .unwrap_or("unknown error")
                .to_string();
            return Err(TelegramError::Api(description));
        }
        Ok(data.get("result").cloned().unwrap_or(Value::Null))
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TelegramError> {
        let data: Value = self
            .client
            .get(format!("{}/getUpdates", self.base_url))
            .query(&[
                ("offset", offset.to_string()),
                ("timeout", LONG_POLL_TIMEOUT_SECS.to_string()),
                ("allowed_updates", r#"["message"]"#.to_string()),
            ])
            .send()
            .await?
            .json()
            .await?;
        let result = Self::unwrap_envelope(data)?;
        let updates = serde_json::from_value(result)
            .map_err(|e| TelegramError::Api(format!("malformed getUpdates result: {e}")))?;
        Ok(updates)
    }

    /// Send one plain text message. The caller is responsible for staying
    /// within the message limit.
    pub async fn send_message(&self, chat_id: i64, text: &str) -> Result<(), TelegramError> {
        let data: Value = self
            .client
            .post(format!("{}/sendMessage", self.base_url))
            .json(&serde_json::json!({"chat_id": chat_id, "text": text}))
            .send()
            .await?
            .json()
            .await?;
        Self::unwrap_envelope(data)?;
        Ok(())
    }

    /// Upload one photo with a caption via multipart form data.
    pub async fn send_photo_bytes(
        &self,
        chat_id: i64,
        photo: Vec<u8>,
        caption: &str,
    ) -> Result<(), TelegramError> {
        let part = reqwest::multipart::Part::bytes(photo)
            .file_name("ad.jpg")
            .mime_str("image/jpeg")
            .map_err(|e| TelegramError::Api(format!("invalid photo part: {e}")))?;
        let form = reqwest::multipart::Form::new()
            .text("chat_id", chat_id.to_string())
            .text("caption", caption.to_string())
            .part("photo", part);

        let data: Value = self
            .client
            .post(format!("{}/sendPhoto", self.base_url))
            .multipart(form)
            .send()
            .await?
            .json()
            .await?;
        Self::unwrap_envelope(data)?;
        Ok(())
    }
}

#[async_trait::async_trait]
impl Messenger for TelegramApi {
    async fn send_text(&self, chat_id: i64, text: &str) -> Result<(), SendError> {
        self.send_message(chat_id, text)
            .await
            .map_err(|e| SendError(e.to_string()))
    }

    async fn send_photo(
        &self,
        chat_id: i64,
        photo: &[u8],
        caption: &str,
    ) -> Result<(), SendError> {
        self.send_photo_bytes(chat_id, photo.to_vec(), caption)
            .await
            .map_err(|e| SendError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn envelope_ok_unwraps_result() {
        let result =
            TelegramApi::unwrap_envelope(json!({"ok": true, "result": [1, 2]})).unwrap();
        assert_eq!(result, json!([1, 2]));
    }

    #[test]
    fn envelope_error_carries_description() {
        let err =
            TelegramApi::unwrap_envelope(json!({"ok": false, "description": "Bad Request"}))
                .unwrap_err();
        assert!(err.to_string().contains("Bad Request"));
    }

    #[test]
    fn updates_deserialize_with_and_without_text() {
        let updates: Vec<Update> = serde_json::from_value(json!([
            {"update_id": 1, "message": {"chat": {"id": 5}, "text": "привет"}},
            {"update_id": 2, "message": {"chat": {"id": 6}}},
            {"update_id": 3}
        ]))
        .unwrap();
        assert_eq!(updates[0].message.as_ref().unwrap().chat.id, 5);
        assert!(updates[1].message.as_ref().unwrap().text.is_none());
        assert!(updates[2].message.is_none());
    }
}
