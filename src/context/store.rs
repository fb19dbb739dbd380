//! Bounded context store
//!
//! Owns the in-memory item collection and enforces the capacity ceiling.
//! Pruning is two-phase: eviction drops the oldest items past the ceiling
//! regardless of relevance, then the survivors are re-ordered by relevance
//! for presentation. Persistence is a best-effort mirror of the in-memory
//! state; a failed write is logged and the operation still succeeds.

use chrono::Utc;
use tracing::warn;
use uuid::Uuid;

use super::item::{ContextDraft, ContextItem};
use super::serialize::build_system_message;
use crate::ai::chat::ChatMessage;
use crate::storage::KeyValueStorage;

/// Hard ceiling on stored items. Fixed by design; the configured context
/// window size never feeds into this.
pub const MAX_CONTEXT_ITEMS: usize = 20;

/// Storage key for the whole collection.
pub const CONTEXT_KEY: &str = "context";

pub struct ContextStore {
    items: Vec<ContextItem>,
    storage: Box<dyn KeyValueStorage>,
}

impl ContextStore {
    /// Create an empty store over the given storage.
    pub fn new(storage: Box<dyn KeyValueStorage>) -> Self {
        Self {
            items: Vec::new(),
            storage,
        }
    }

    /// Hydrate a store from its persisted collection. A missing or corrupt
    /// blob starts empty rather than failing.
    pub fn load(storage: Box<dyn KeyValueStorage>) -> Self {
        let items = match storage.load(CONTEXT_KEY) {
            Ok(Some(blob)) => match serde_json::from_str(&blob) {
                Ok(items) => items,
                Err(e) => {
                    warn!("Discarding corrupt context collection: {}", e);
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!("Failed to load context collection: {:#}", e);
                Vec::new()
            }
        };

        Self { items, storage }
    }

    /// Store a candidate item: assign id and timestamp, append, prune,
    /// persist. Always succeeds; returns the stored item.
    pub fn add(&mut self, draft: ContextDraft) -> ContextItem {
        let item = ContextItem {
            id: Uuid::new_v4().to_string(),
            source: draft.source,
            content: draft.content,
            relevance: draft.relevance,
            timestamp: Utc::now().timestamp_millis(),
            path: draft.path,
        };

        self.items.push(item.clone());
        self.prune();
        self.persist();
        item
    }

    /// Remove the item with the given id. Returns whether anything changed.
    pub fn remove(&mut self, id: &str) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);

        let removed = self.items.len() < before;
        if removed {
            self.persist();
        }
        removed
    }

    /// Drop every item.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Defensive copy in current internal order. Consumers that need
    /// relevance order must sort; [`ContextStore::serialize`] already does.
    pub fn list(&self) -> Vec<ContextItem> {
        self.items.clone()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Project the collection into the zero-or-one synthetic system message.
    pub fn serialize(&self) -> Option<ChatMessage> {
        build_system_message(&self.items)
    }

    /// Two-phase capacity enforcement: evict strictly by age, then order
    /// the survivors by relevance. A highly relevant old item loses to a
    /// low-relevance new one; that asymmetry is intentional.
    fn prune(&mut self) {
        if self.items.len() <= MAX_CONTEXT_ITEMS {
            return;
        }

        self.items.sort_by_key(|item| item.timestamp);
        let excess = self.items.len() - MAX_CONTEXT_ITEMS;
        self.items.drain(..excess);
        self.items.sort_by(|a, b| b.relevance.cmp(&a.relevance));
    }

    /// Fire-and-forget mirror of the in-memory state.
    fn persist(&self) {
        let blob = match serde_json::to_string(&self.items) {
            Ok(blob) => blob,
            Err(e) => {
                warn!("Failed to serialize context collection: {}", e);
                return;
            }
        };

        if let Err(e) = self.storage.save(CONTEXT_KEY, &blob) {
            warn!("Failed to persist context collection: {:#}", e);
        }
    }
}
