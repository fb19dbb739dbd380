//! Durable key-value storage for the context store
//!
//! One opaque string blob per key. The file-backed implementation keeps
//! each key as a JSON file in the data directory; the in-memory one backs
//! unit tests.

use anyhow::{Context, Result};
use std::path::PathBuf;

/// Environment variable that overrides the data directory (used by tests
/// and by users who keep their state somewhere non-standard).
pub const DATA_DIR_ENV: &str = "SIDEKICK_DATA_DIR";

/// Opaque blob storage keyed by string.
pub trait KeyValueStorage: Send + Sync {
    fn load(&self, key: &str) -> Result<Option<String>>;
    fn save(&self, key: &str, value: &str) -> Result<()>;
}

/// Resolve the data directory: env override first, then the platform dir.
pub fn data_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var(DATA_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }

    let dirs = directories::ProjectDirs::from("com", "sidekick", "sidekick")
        .context("Failed to determine data directory")?;
    Ok(dirs.data_dir().to_path_buf())
}

/// File-backed storage: one `<key>.json` per key.
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create storage directory {:?}", dir))?;
        Ok(Self { dir })
    }

    /// Open storage rooted at the resolved data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(data_dir()?)
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }
}

impl KeyValueStorage for FileStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {:?}", path))?;
        Ok(Some(content))
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        let path = self.key_path(key);
        std::fs::write(&path, value).with_context(|| format!("Failed to write {:?}", path))
    }
}

/// In-memory storage for tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStorage {
    entries: std::sync::Mutex<std::collections::HashMap<String, String>>,
}

#[cfg(test)]
impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[cfg(test)]
impl KeyValueStorage for MemoryStorage {
    fn load(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    fn save(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_storage_round_trip() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        assert!(storage.load("missing").unwrap().is_none());

        storage.save("items", r#"[{"id":"a"}]"#).unwrap();
        assert_eq!(
            storage.load("items").unwrap().as_deref(),
            Some(r#"[{"id":"a"}]"#)
        );
    }

    #[test]
    fn file_storage_overwrites() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = FileStorage::open(dir.path()).unwrap();

        storage.save("k", "one").unwrap();
        storage.save("k", "two").unwrap();
        assert_eq!(storage.load("k").unwrap().as_deref(), Some("two"));
    }

    #[test]
    fn memory_storage_round_trip() {
        let storage = MemoryStorage::new();
        storage.save("k", "v").unwrap();
        assert_eq!(storage.load("k").unwrap().as_deref(), Some("v"));
        assert!(storage.load("other").unwrap().is_none());
    }
}
