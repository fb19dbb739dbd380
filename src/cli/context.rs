//! Context commands - attach, inspect, and drop context items

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

use crate::context::{ContextDraft, ContextStore};
use crate::storage::FileStorage;

fn open_store() -> Result<ContextStore> {
    let storage = FileStorage::open_default().context("Failed to open context storage")?;
    Ok(ContextStore::load(Box::new(storage)))
}

fn apply_relevance(draft: ContextDraft, relevance: Option<u8>) -> ContextDraft {
    match relevance {
        Some(r) => draft.with_relevance(r),
        None => draft,
    }
}

pub fn add_file(path: &str, relevance: Option<u8>) -> Result<()> {
    let mut store = open_store()?;
    let draft = apply_relevance(ContextDraft::from_file(Path::new(path))?, relevance);
    let item = store.add(draft);

    println!("Attached {} (relevance {})", path, item.relevance);
    println!("  id: {}", item.id);
    Ok(())
}

pub fn add_selection(text: Option<&str>, relevance: Option<u8>) -> Result<()> {
    let text = match text {
        Some(t) => t.to_string(),
        None => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read selection from stdin")?;
            buffer
        }
    };

    let mut store = open_store()?;
    match ContextDraft::from_selection(&text) {
        Some(draft) => {
            let item = store.add(apply_relevance(draft, relevance));
            println!("Attached selection (relevance {})", item.relevance);
            println!("  id: {}", item.id);
        }
        None => {
            println!("Selection is empty; nothing attached");
        }
    }
    Ok(())
}

pub fn add_manual(text: &str, relevance: Option<u8>) -> Result<()> {
    let mut store = open_store()?;
    let item = store.add(apply_relevance(ContextDraft::manual(text), relevance));

    println!("Attached note (relevance {})", item.relevance);
    println!("  id: {}", item.id);
    Ok(())
}

pub fn list() -> Result<()> {
    let store = open_store()?;

    if store.is_empty() {
        println!("No context attached");
        return Ok(());
    }

    let items = store.list();
    println!("{} context item(s):", items.len());
    for item in items {
        let path = item.path.as_deref().unwrap_or("-");
        println!(
            "  {}  {:<12}  {:>3}  {}",
            item.id, item.source, item.relevance, path
        );
    }
    Ok(())
}

pub fn remove(id: &str) -> Result<()> {
    let mut store = open_store()?;
    if store.remove(id) {
        println!("Removed {}", id);
    } else {
        println!("No context item with id {}", id);
    }
    Ok(())
}

pub fn clear() -> Result<()> {
    let mut store = open_store()?;
    let count = store.len();
    store.clear();
    println!("Cleared {} context item(s)", count);
    Ok(())
}
