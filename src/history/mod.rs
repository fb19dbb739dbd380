//! Chat history archive
//!
//! Durable CRUD over whole conversations, one JSON file per conversation,
//! independent of the context store. The directory is the source of truth;
//! records are only held in memory for the duration of an operation.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

use crate::ai::chat::{ChatMessage, Role};

const TITLE_MAX_CHARS: usize = 50;
const TITLE_ELLIPSIS: &str = "...";
const FALLBACK_TITLE: &str = "New conversation";

/// A persisted conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatHistoryItem {
    pub id: String,
    pub title: String,
    pub last_interaction_at: DateTime<Utc>,
    pub messages: Vec<ChatMessage>,
}

/// Archive service over a storage directory. Constructed explicitly and
/// passed by reference; holds no global state.
pub struct HistoryArchive {
    dir: PathBuf,
}

impl HistoryArchive {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create history directory {:?}", dir))?;
        Ok(Self { dir })
    }

    fn record_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }

    /// All conversations, most recently touched first. Unreadable or
    /// corrupt records are skipped, never fatal.
    pub fn list(&self) -> Vec<ChatHistoryItem> {
        let entries = match std::fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Failed to read history directory {:?}: {}", self.dir, e);
                return Vec::new();
            }
        };

        let mut items: Vec<ChatHistoryItem> = Vec::new();
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }

            match std::fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|content| serde_json::from_str(&content).map_err(Into::into))
            {
                Ok(item) => items.push(item),
                Err(e) => warn!("Skipping unreadable history record {:?}: {:#}", path, e),
            }
        }

        items.sort_by(|a, b| b.last_interaction_at.cmp(&a.last_interaction_at));
        items
    }

    /// Create a new conversation record. When no title is given, one is
    /// derived from the first user turn.
    pub fn create(
        &self,
        title: Option<String>,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatHistoryItem> {
        let now = Utc::now();
        let item = ChatHistoryItem {
            id: now.timestamp_millis().to_string(),
            title: title.unwrap_or_else(|| derive_title(&messages)),
            last_interaction_at: now,
            messages,
        };

        self.write_record(&item)?;
        Ok(item)
    }

    /// Replace a conversation's messages wholesale and bump its timestamp.
    /// Returns `Ok(None)` when the record vanished concurrently.
    pub fn update_messages(
        &self,
        id: &str,
        messages: Vec<ChatMessage>,
    ) -> Result<Option<ChatHistoryItem>> {
        let path = self.record_path(id);
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read history record {:?}", path))?;
        let mut item: ChatHistoryItem = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse history record {:?}", path))?;

        item.messages = messages;
        item.last_interaction_at = Utc::now();
        self.write_record(&item)?;
        Ok(Some(item))
    }

    /// Delete a conversation. Returns whether a record was removed.
    pub fn delete(&self, id: &str) -> bool {
        let path = self.record_path(id);
        if !path.exists() {
            return false;
        }

        match std::fs::remove_file(&path) {
            Ok(()) => true,
            Err(e) => {
                warn!("Failed to delete history record {:?}: {}", path, e);
                false
            }
        }
    }

    /// Load one conversation, if present and readable.
    pub fn load(&self, id: &str) -> Option<ChatHistoryItem> {
        let path = self.record_path(id);
        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(item) => Some(item),
                Err(e) => {
                    warn!("Failed to parse history record {:?}: {}", path, e);
                    None
                }
            },
            Err(_) => None,
        }
    }

    fn write_record(&self, item: &ChatHistoryItem) -> Result<()> {
        let path = self.record_path(&item.id);
        let content =
            serde_json::to_string_pretty(item).context("Failed to serialize history record")?;
        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write history record {:?}", path))
    }
}

/// Derive a conversation title from the first user turn's first line:
/// a fixed fallback when empty, otherwise cut at exactly 50 characters
/// with an ellipsis suffix, regardless of word boundaries.
pub fn derive_title(messages: &[ChatMessage]) -> String {
    let first_line = messages
        .iter()
        .find(|m| m.role == Role::User)
        .and_then(|m| m.content.lines().next())
        .unwrap_or("");

    if first_line.is_empty() {
        return FALLBACK_TITLE.to_string();
    }

    if first_line.chars().count() > TITLE_MAX_CHARS {
        let cut: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
        format!("{}{}", cut, TITLE_ELLIPSIS)
    } else {
        first_line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn archive() -> (TempDir, HistoryArchive) {
        let dir = TempDir::new().unwrap();
        let archive = HistoryArchive::open(dir.path()).unwrap();
        (dir, archive)
    }

    fn write_record(archive: &HistoryArchive, id: &str, millis: i64) {
        let item = ChatHistoryItem {
            id: id.to_string(),
            title: format!("record {}", id),
            last_interaction_at: DateTime::from_timestamp_millis(millis).unwrap(),
            messages: vec![ChatMessage::user("hi")],
        };
        archive.write_record(&item).unwrap();
    }

    #[test]
    fn long_first_line_is_cut_at_fifty_chars() {
        let line = "x".repeat(73);
        let title = derive_title(&[ChatMessage::user(line)]);
        assert_eq!(title.chars().count(), 53);
        assert!(title.ends_with("..."));
    }

    #[test]
    fn fifty_char_line_passes_through_unchanged() {
        let line = "y".repeat(50);
        let title = derive_title(&[ChatMessage::user(line.clone())]);
        assert_eq!(title, line);
    }

    #[test]
    fn empty_first_line_falls_back() {
        assert_eq!(derive_title(&[ChatMessage::user("")]), FALLBACK_TITLE);
        assert_eq!(derive_title(&[]), FALLBACK_TITLE);
    }

    #[test]
    fn title_comes_from_the_first_user_turn() {
        let messages = vec![
            ChatMessage::assistant("Welcome!"),
            ChatMessage::user("Explain lifetimes\nin detail"),
        ];
        assert_eq!(derive_title(&messages), "Explain lifetimes");
    }

    #[test]
    fn create_then_load_round_trips() {
        let (_dir, archive) = archive();
        let created = archive
            .create(None, vec![ChatMessage::user("What is a trait object?")])
            .unwrap();

        assert_eq!(created.title, "What is a trait object?");

        let loaded = archive.load(&created.id).unwrap();
        assert_eq!(loaded.id, created.id);
        assert_eq!(loaded.title, created.title);
        assert_eq!(loaded.last_interaction_at, created.last_interaction_at);
        assert_eq!(loaded.messages.len(), 1);
    }

    #[test]
    fn list_orders_by_last_interaction_descending() {
        let (_dir, archive) = archive();
        write_record(&archive, "a", 1_000);
        write_record(&archive, "c", 3_000);
        write_record(&archive, "b", 2_000);

        let ids: Vec<String> = archive.list().into_iter().map(|i| i.id).collect();
        assert_eq!(ids, vec!["c", "b", "a"]);
    }

    #[test]
    fn corrupt_record_is_skipped_not_fatal() {
        let (dir, archive) = archive();
        write_record(&archive, "a", 1_000);
        write_record(&archive, "b", 2_000);
        std::fs::write(dir.path().join("broken.json"), "{ not json").unwrap();

        let items = archive.list();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn update_replaces_messages_and_bumps_timestamp() {
        let (_dir, archive) = archive();
        let created = archive.create(None, vec![ChatMessage::user("hi")]).unwrap();

        let updated = archive
            .update_messages(
                &created.id,
                vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            )
            .unwrap()
            .unwrap();

        assert_eq!(updated.messages.len(), 2);
        assert!(updated.last_interaction_at >= created.last_interaction_at);

        let loaded = archive.load(&created.id).unwrap();
        assert_eq!(loaded.messages.len(), 2);
    }

    #[test]
    fn update_of_vanished_record_signals_not_found() {
        let (_dir, archive) = archive();
        let result = archive.update_messages("missing", Vec::new()).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn delete_reports_whether_a_record_was_removed() {
        let (_dir, archive) = archive();
        let created = archive.create(None, vec![ChatMessage::user("bye")]).unwrap();

        assert!(archive.delete(&created.id));
        assert!(!archive.delete(&created.id));
        assert!(archive.load(&created.id).is_none());
    }
}
