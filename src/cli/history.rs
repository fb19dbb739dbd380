//! History commands - browse and prune saved conversations

use anyhow::{Context, Result};

use crate::history::HistoryArchive;
use crate::storage::data_dir;

pub fn open_archive() -> Result<HistoryArchive> {
    let dir = data_dir()?.join("history");
    HistoryArchive::open(dir).context("Failed to open history archive")
}

pub fn list() -> Result<()> {
    let archive = open_archive()?;
    let items = archive.list();

    if items.is_empty() {
        println!("No saved conversations");
        return Ok(());
    }

    println!("{} conversation(s):", items.len());
    for item in items {
        println!(
            "  {}  {}  ({} messages)  {}",
            item.id,
            item.last_interaction_at.format("%Y-%m-%d %H:%M"),
            item.messages.len(),
            item.title
        );
    }
    Ok(())
}

pub fn show(id: &str) -> Result<()> {
    let archive = open_archive()?;

    match archive.load(id) {
        Some(item) => {
            println!("{}", item.title);
            println!("Last activity: {}", item.last_interaction_at.format("%Y-%m-%d %H:%M"));
            println!();
            for message in &item.messages {
                println!("[{}]", message.role);
                println!("{}", message.content);
                println!();
            }
        }
        None => {
            println!("No conversation with id {}", id);
        }
    }
    Ok(())
}

pub fn delete(id: &str) -> Result<()> {
    let archive = open_archive()?;
    if archive.delete(id) {
        println!("Deleted conversation {}", id);
    } else {
        println!("No conversation with id {}", id);
    }
    Ok(())
}
