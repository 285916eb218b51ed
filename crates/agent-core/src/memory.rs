//! Conversation Memory Store
//!
//! Append-only per-conversation history backed by JSONL files, one line per
//! entry. Reads filter to a trailing 24-hour window; entries outside the
//! window stay on disk untouched (retention is read-time filtering, not
//! physical pruning, so the backing file grows without bound).

use std::io::Write;
use std::path::PathBuf;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tracing::{debug, warn};

use crate::error::Result;
use crate::message::{ConversationId, MemoryEntry, Role};

/// Trailing read window, in seconds.
const MEMORY_WINDOW_SECS: i64 = 86_400;

/// Per-conversation conversation history.
///
/// `read` never fails: a missing or unreadable store is an empty history,
/// and malformed lines are skipped individually. `append` is the only
/// mutation; there is no update or delete.
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Entries within the trailing 24-hour window, in append order.
    async fn read(&self, conversation: &ConversationId) -> Vec<MemoryEntry>;

    /// Append one entry with trimmed text and a fresh timestamp.
    async fn append(&self, conversation: &ConversationId, role: Role, text: &str) -> Result<()>;
}

/// JSONL file store, one `<conversation>.json` file per conversation.
pub struct FileMemoryStore {
    dir: PathBuf,
}

impl FileMemoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, conversation: &ConversationId) -> PathBuf {
        self.dir.join(format!("{}.json", conversation.as_str()))
    }
}

#[async_trait]
impl MemoryStore for FileMemoryStore {
    async fn read(&self, conversation: &ConversationId) -> Vec<MemoryEntry> {
        let path = self.path_for(conversation);
        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "memory read failed, treating as empty");
                return Vec::new();
            }
        };

        let cutoff = Utc::now() - Duration::seconds(MEMORY_WINDOW_SECS);
        let entries: Vec<MemoryEntry> = content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .filter_map(|line| match serde_json::from_str::<MemoryEntry>(line) {
                Ok(entry) => Some(entry),
                Err(e) => {
                    warn!(conversation = %conversation, error = %e, "skipping malformed memory line");
                    None
                }
            })
            .filter(|entry| entry.timestamp > cutoff)
            .collect();

        debug!(conversation = %conversation, count = entries.len(), "memory window loaded");
        entries
    }

    async fn append(&self, conversation: &ConversationId, role: Role, text: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir)?;

        let entry = MemoryEntry::new(role, text.trim());
        let line = serde_json::to_string(&entry)?;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.path_for(conversation))?;
        writeln!(file, "{line}")?;

        Ok(())
    }
}
