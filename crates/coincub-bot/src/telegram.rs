//! Telegram Transport
//!
//! Long-polling Bot API client plus the `ChatTransport` seam the
//! orchestrator is written against. The transport owns message chunking
//! and MarkdownV2 escaping; callers hand it plain text.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::error::{BotError, Result};

/// Telegram's hard per-message length limit.
const MESSAGE_LIMIT: usize = 4096;

/// Characters MarkdownV2 requires escaping.
const MARKDOWN_SPECIAL: &[char] = &[
    '_', '*', '[', ']', '(', ')', '~', '`', '>', '#', '+', '-', '=', '|', '{', '}', '.', '!',
];

/// Outbound chat seam.
///
/// `send_reply` owns chunking and markup; `send_typing` is the liveness
/// indicator primitive the orchestrator pulses while a request runs.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_reply(&self, chat_id: &str, text: &str) -> Result<()>;
    async fn send_typing(&self, chat_id: &str) -> Result<()>;
}

// ============================================================================
// Bot API wire types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: serde::de::DeserializeOwned"))]
struct ApiResponse<T> {
    ok: bool,
    #[serde(default)]
    result: Option<T>,
    #[serde(default)]
    description: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// Thin Bot API client
#[derive(Clone)]
pub struct TelegramClient {
    http: reqwest::Client,
    base: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            base: format!("https://api.telegram.org/bot{bot_token}"),
        }
    }

    async fn call<T: serde::de::DeserializeOwned>(
        &self,
        method: &str,
        payload: serde_json::Value,
    ) -> Result<T> {
        let response: ApiResponse<T> = self
            .http
            .post(format!("{}/{method}", self.base))
            .json(&payload)
            .send()
            .await?
            .json()
            .await?;

        if !response.ok {
            return Err(BotError::Telegram(
                response.description.unwrap_or_else(|| method.to_string()),
            ));
        }
        response
            .result
            .ok_or_else(|| BotError::Telegram(format!("{method}: empty result")))
    }

    /// Long-poll for updates past `offset`.
    pub async fn get_updates(&self, offset: i64, timeout_secs: u64) -> Result<Vec<Update>> {
        self.call(
            "getUpdates",
            json!({
                "offset": offset,
                "timeout": timeout_secs,
                "allowed_updates": ["message"],
            }),
        )
        .await
    }

    async fn send_message(&self, chat_id: &str, text: &str, markdown: bool) -> Result<()> {
        let mut payload = json!({ "chat_id": chat_id, "text": text });
        if markdown {
            payload["parse_mode"] = json!("MarkdownV2");
        }
        let _: serde_json::Value = self.call("sendMessage", payload).await?;
        Ok(())
    }

    async fn send_chat_action(&self, chat_id: &str, action: &str) -> Result<()> {
        let _: serde_json::Value = self
            .call("sendChatAction", json!({ "chat_id": chat_id, "action": action }))
            .await?;
        Ok(())
    }
}

/// `ChatTransport` over the Bot API
pub struct TelegramTransport {
    client: TelegramClient,
}

impl TelegramTransport {
    pub fn new(client: TelegramClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ChatTransport for TelegramTransport {
    /// Chunked, MarkdownV2-escaped delivery with a plain-text retry when
    /// Telegram rejects the markup.
    async fn send_reply(&self, chat_id: &str, text: &str) -> Result<()> {
        for chunk in chunk_message(text, MESSAGE_LIMIT) {
            let escaped = escape_markdown_v2(&chunk);
            if let Err(e) = self.client.send_message(chat_id, &escaped, true).await {
                warn!(chat_id = %chat_id, error = %e, "markdown send failed, retrying as plain text");
                self.client.send_message(chat_id, &chunk, false).await?;
            }
        }
        Ok(())
    }

    async fn send_typing(&self, chat_id: &str) -> Result<()> {
        self.client.send_chat_action(chat_id, "typing").await
    }
}

/// Split into Telegram-sized chunks on character boundaries.
fn chunk_message(text: &str, limit: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Escape text for MarkdownV2 parse mode.
pub fn escape_markdown_v2(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() * 2);
    for ch in text.chars() {
        if MARKDOWN_SPECIAL.contains(&ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escape_covers_the_special_set() {
        assert_eq!(escape_markdown_v2("a.b!c"), r"a\.b\!c");
        assert_eq!(escape_markdown_v2("*bold* [link](x)"), r"\*bold\* \[link\]\(x\)");
        assert_eq!(escape_markdown_v2("plain words"), "plain words");
    }

    #[test]
    fn long_messages_are_chunked() {
        let text = "x".repeat(10_000);
        let chunks = chunk_message(&text, MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 3);
        assert_eq!(chunks[0].chars().count(), 4096);
        assert_eq!(chunks[2].chars().count(), 10_000 - 2 * 4096);
    }

    #[test]
    fn chunking_counts_chars_not_bytes() {
        let text = "é".repeat(5000);
        let chunks = chunk_message(&text, MESSAGE_LIMIT);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].chars().count(), 4096);
    }

    #[test]
    fn empty_text_sends_nothing() {
        assert!(chunk_message("", MESSAGE_LIMIT).is_empty());
    }

    #[test]
    fn updates_deserialize_from_bot_api_shape() {
        let raw = r#"{
            "update_id": 10,
            "message": {
                "chat": { "id": -100123, "type": "private" },
                "text": "/ask btc"
            }
        }"#;
        let update: Update = serde_json::from_str(raw).unwrap();
        let message = update.message.unwrap();
        assert_eq!(update.update_id, 10);
        assert_eq!(message.chat.id, -100123);
        assert_eq!(message.chat.kind, "private");
        assert_eq!(message.text.as_deref(), Some("/ask btc"));
    }
}
