//! Context items and the four ways they are created
//!
//! A context item is one attached piece of information: a file, a text
//! selection, a manual note, or a conversation excerpt. Each source carries
//! its own default relevance score; callers may override it before the item
//! enters the store.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::ai::chat::ChatMessage;

pub const MAX_RELEVANCE: u8 = 100;

const FILE_RELEVANCE: u8 = 80;
const SELECTION_RELEVANCE: u8 = 90;
const CONVERSATION_RELEVANCE: u8 = 85;
const MANUAL_RELEVANCE: u8 = 75;

/// Sentinel locators for items without a real file path.
const MANUAL_PATH: &str = "manual-input";
const CONVERSATION_PATH: &str = "chat-history";

/// Where a context item came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    File,
    Selection,
    Manual,
    Conversation,
}

impl std::fmt::Display for ContextSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContextSource::File => write!(f, "file"),
            ContextSource::Selection => write!(f, "selection"),
            ContextSource::Manual => write!(f, "manual"),
            ContextSource::Conversation => write!(f, "conversation"),
        }
    }
}

/// One stored piece of context. Fields are fixed at creation; an item is
/// replaced, never edited.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextItem {
    pub id: String,
    pub source: ContextSource,
    pub content: String,
    pub relevance: u8,
    /// Creation time, milliseconds since epoch.
    pub timestamp: i64,
    pub path: Option<String>,
}

/// A candidate item before the store assigns its id and timestamp.
#[derive(Debug, Clone)]
pub struct ContextDraft {
    pub source: ContextSource,
    pub content: String,
    pub relevance: u8,
    pub path: Option<String>,
}

impl ContextDraft {
    /// Attach a file's contents. Fails only when the read fails.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {:?}", path))?;

        Ok(Self {
            source: ContextSource::File,
            content,
            relevance: FILE_RELEVANCE,
            path: Some(path.display().to_string()),
        })
    }

    /// Attach a text selection. An empty selection is a no-op, not an error.
    pub fn from_selection(text: &str) -> Option<Self> {
        if text.trim().is_empty() {
            return None;
        }

        Some(Self {
            source: ContextSource::Selection,
            content: text.to_string(),
            relevance: SELECTION_RELEVANCE,
            path: None,
        })
    }

    /// Attach a conversation excerpt, flattened to `role: content` lines.
    pub fn from_conversation(turns: &[ChatMessage]) -> Self {
        let content = turns
            .iter()
            .map(|turn| format!("{}: {}", turn.role, turn.content))
            .collect::<Vec<_>>()
            .join("\n\n");

        Self {
            source: ContextSource::Conversation,
            content,
            relevance: CONVERSATION_RELEVANCE,
            path: Some(CONVERSATION_PATH.to_string()),
        }
    }

    /// Attach a manually entered note.
    pub fn manual(text: &str) -> Self {
        Self {
            source: ContextSource::Manual,
            content: text.to_string(),
            relevance: MANUAL_RELEVANCE,
            path: Some(MANUAL_PATH.to_string()),
        }
    }

    /// Override the source-default relevance score.
    pub fn with_relevance(mut self, relevance: u8) -> Self {
        self.relevance = relevance.min(MAX_RELEVANCE);
        self
    }
}
