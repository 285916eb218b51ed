//! Conversation Messages
//!
//! Memory entries exchanged between the user and the assistant, and the
//! conversation identity they are keyed by.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role of a memory entry author
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// User input
    User,
    /// Assistant response
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Opaque conversation identifier
///
/// The transport decides what goes in here (a Telegram chat id, a test
/// fixture name); nothing downstream inspects it beyond keying storage.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<i64> for ConversationId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ConversationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single remembered turn in a conversation
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MemoryEntry {
    /// Who said it
    pub role: Role,

    /// What was said
    pub text: String,

    /// When it was appended
    pub timestamp: DateTime<Utc>,
}

impl MemoryEntry {
    /// Create a new entry stamped with the current time
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: Utc::now(),
        }
    }
}

/// An incoming analysis request
#[derive(Clone, Debug)]
pub struct UserQuery {
    /// Raw query text, already stripped of any invoking command token
    pub text: String,

    /// The conversation this request belongs to
    pub conversation: ConversationId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entry_roundtrips_through_json() {
        let entry = MemoryEntry::new(Role::User, "what about btc?");
        let line = serde_json::to_string(&entry).unwrap();
        assert!(line.contains(r#""role":"user""#));

        let parsed: MemoryEntry = serde_json::from_str(&line).unwrap();
        assert_eq!(parsed.role, Role::User);
        assert_eq!(parsed.text, "what about btc?");
    }

    #[test]
    fn conversation_id_from_chat_id() {
        let id = ConversationId::from(-1001234_i64);
        assert_eq!(id.as_str(), "-1001234");
    }
}
