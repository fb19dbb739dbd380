//! Context projection into the synthetic system message
//!
//! Every outbound completion request carries at most one system message
//! aggregating the current context items, highest relevance first. Each
//! item becomes a BEGIN/END delimited block a downstream reader can split
//! back apart.

use super::item::ContextItem;
use crate::ai::chat::ChatMessage;

/// Build the zero-or-one system message from the current items. Items are
/// presented in descending relevance; ties keep their existing relative
/// order (the sort is stable).
pub fn build_system_message(items: &[ContextItem]) -> Option<ChatMessage> {
    if items.is_empty() {
        return None;
    }

    let mut ordered: Vec<&ContextItem> = items.iter().collect();
    ordered.sort_by(|a, b| b.relevance.cmp(&a.relevance));

    let blocks: Vec<String> = ordered.iter().map(|item| render_block(item)).collect();

    Some(ChatMessage::system(blocks.join("\n\n")))
}

fn render_block(item: &ContextItem) -> String {
    let label = match &item.path {
        Some(path) => format!("{} ({})", item.source, path),
        None => item.source.to_string(),
    };

    format!(
        "--- BEGIN {} ---\n{}\n--- END {} ---",
        label, item.content, label
    )
}
