//! Info command - show version, paths, and stored state

use anyhow::Result;

use crate::config::Config;
use crate::context::ContextStore;
use crate::storage::{data_dir, FileStorage};

pub fn run(config: &Config) -> Result<()> {
    println!("Sidekick v{}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("System Information:");
    println!("  OS: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    println!();
    println!("Configuration:");
    println!("  Config dir: {}", config_dir());
    println!("  Data dir: {}", data_dir().map(|p| p.display().to_string()).unwrap_or_else(|_| "unknown".to_string()));
    println!("  Endpoint: {}", config.api.base_url);
    println!("  Model: {}", config.api.model);
    let key_status = if std::env::var(&config.api.api_key_env).is_ok() {
        "configured"
    } else {
        "not configured"
    };
    println!("  API key ({}): {}", config.api.api_key_env, key_status);

    println!();
    println!("State:");
    let context_count = FileStorage::open_default()
        .map(|storage| ContextStore::load(Box::new(storage)).len())
        .unwrap_or(0);
    println!("  Context items: {}", context_count);
    let history_count = super::history::open_archive()
        .map(|archive| archive.list().len())
        .unwrap_or(0);
    println!("  Saved conversations: {}", history_count);

    Ok(())
}

fn config_dir() -> String {
    directories::ProjectDirs::from("com", "sidekick", "sidekick")
        .map(|p| p.config_dir().to_string_lossy().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
