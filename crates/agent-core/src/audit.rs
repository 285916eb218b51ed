//! Analysis Audit Log
//!
//! Persistent record of every successful analysis, keyed by conversation
//! id. The log is a single JSON document, read-modify-written on each
//! append. A write failure here must never fail the request that produced
//! the analysis; callers log and move on.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::message::ConversationId;

/// Longest response prefix kept in an audit record.
const MAX_RESPONSE_CHARS: usize = 4000;

/// One audited analysis
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuditRecord {
    pub timestamp: DateTime<Utc>,
    pub query: String,
    pub response: String,
}

/// Conversation-keyed audit log over a single JSON file
pub struct QueryLog {
    path: PathBuf,
}

impl QueryLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one record for `conversation`. The response is truncated to
    /// its first 4000 characters.
    pub async fn append(&self, conversation: &ConversationId, query: &str, response: &str) -> Result<()> {
        let mut log = self.load()?;
        log.entry(conversation.as_str().to_string())
            .or_default()
            .push(AuditRecord {
                timestamp: Utc::now(),
                query: query.to_string(),
                response: response.chars().take(MAX_RESPONSE_CHARS).collect(),
            });

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(&self.path, serde_json::to_string_pretty(&log)?)?;

        debug!(conversation = %conversation, "audit record written");
        Ok(())
    }

    fn load(&self) -> Result<BTreeMap<String, Vec<AuditRecord>>> {
        match std::fs::read_to_string(&self.path) {
            Ok(content) => Ok(serde_json::from_str(&content)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> (tempfile::TempDir, QueryLog) {
        let dir = tempfile::tempdir().unwrap();
        let log = QueryLog::new(dir.path().join("query_log.json"));
        (dir, log)
    }

    #[tokio::test]
    async fn appends_accumulate_per_conversation() {
        let (_dir, log) = log();
        let first = ConversationId::new("1");
        let second = ConversationId::new("2");

        log.append(&first, "btc?", "btc is fine").await.unwrap();
        log.append(&first, "eth?", "eth too").await.unwrap();
        log.append(&second, "doge?", "much wow").await.unwrap();

        let stored = log.load().unwrap();
        assert_eq!(stored["1"].len(), 2);
        assert_eq!(stored["2"].len(), 1);
        assert_eq!(stored["1"][1].query, "eth?");
    }

    #[tokio::test]
    async fn response_is_truncated_to_first_4000_chars() {
        let (_dir, log) = log();
        let id = ConversationId::new("3");
        let long = "x".repeat(5000);

        log.append(&id, "long one", &long).await.unwrap();

        let stored = log.load().unwrap();
        assert_eq!(stored["3"][0].response.chars().count(), 4000);
    }

    #[tokio::test]
    async fn corrupt_document_is_an_error_not_a_panic() {
        let (_dir, log) = log();
        std::fs::write(&log.path, "not json at all").unwrap();

        let id = ConversationId::new("4");
        assert!(log.append(&id, "q", "r").await.is_err());
    }
}
