//! Key-value storage backends for session tokens
//!
//! A storage backend is one "scope": every reader and writer of a session must
//! share the same instance (or, for [`FileStorage`], the same path). Values
//! written to one scope are invisible to readers of another.

use crate::error::{CoreError, CoreResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

/// Synchronous string key-value storage
pub trait TokenStorage: Send + Sync {
    /// Read a value
    fn get(&self, key: &str) -> Option<String>;

    /// Write a value, replacing any previous one
    fn set(&self, key: &str, value: &str) -> CoreResult<()>;

    /// Delete a value. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> CoreResult<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Process-local storage, lost when dropped
#[derive(Debug, Default)]
pub struct MemoryStorage {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStorage for MemoryStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        lock(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        lock(&self.values).remove(key);
        Ok(())
    }
}

/// Storage persisted as a JSON object in a single file
///
/// The file is read once on open and rewritten on every mutation, so values
/// survive process restarts.
#[derive(Debug)]
pub struct FileStorage {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStorage {
    /// Open the storage file, starting empty if it does not exist yet
    pub fn open(path: impl Into<PathBuf>) -> CoreResult<Self> {
        let path = path.into();
        let values = if path.exists() {
            let content = std::fs::read_to_string(&path)?;
            if content.trim().is_empty() {
                BTreeMap::new()
            } else {
                serde_json::from_str(&content).map_err(|e| CoreError::CorruptTokenFile {
                    path: path.clone(),
                    reason: e.to_string(),
                })?
            }
        } else {
            BTreeMap::new()
        };

        debug!(path = %path.display(), entries = values.len(), "Opened token storage");
        Ok(Self {
            path,
            values: Mutex::new(values),
        })
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &BTreeMap<String, String>) -> CoreResult<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }
}

impl TokenStorage for FileStorage {
    fn get(&self, key: &str) -> Option<String> {
        lock(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> CoreResult<()> {
        let mut values = lock(&self.values);
        let mut next = values.clone();
        next.insert(key.to_string(), value.to_string());
        self.persist(&next)?;
        *values = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> CoreResult<()> {
        let mut values = lock(&self.values);
        if !values.contains_key(key) {
            return Ok(());
        }
        let mut next = values.clone();
        next.remove(key);
        self.persist(&next)?;
        *values = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn memory_storage_overwrites_and_removes() {
        let storage = MemoryStorage::new();
        storage.set("k", "one").unwrap();
        storage.set("k", "two").unwrap();
        assert_eq!(storage.get("k").as_deref(), Some("two"));

        storage.remove("k").unwrap();
        storage.remove("k").unwrap();
        assert_eq!(storage.get("k"), None);
    }

    #[test]
    fn file_storage_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("accessToken", "abc").unwrap();
        drop(storage);

        let reopened = FileStorage::open(&path).unwrap();
        assert_eq!(reopened.get("accessToken").as_deref(), Some("abc"));
        assert_eq!(reopened.path(), path.as_path());
    }

    #[test]
    fn file_storage_rejects_garbage() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FileStorage::open(&path).unwrap_err();
        assert!(matches!(err, CoreError::CorruptTokenFile { .. }));
    }

    #[test]
    fn file_storage_treats_empty_file_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, "").unwrap();

        let storage = FileStorage::open(&path).unwrap();
        assert_eq!(storage.get("accessToken"), None);
    }

    #[test]
    fn failed_write_leaves_memory_unchanged() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");

        let storage = FileStorage::open(&path).unwrap();
        storage.set("accessToken", "abc").unwrap();

        std::fs::remove_file(&path).unwrap();
        std::fs::create_dir(&path).unwrap();

        assert!(storage.set("refreshToken", "def").is_err());
        assert_eq!(storage.get("refreshToken"), None);

        assert!(storage.remove("accessToken").is_err());
        assert_eq!(storage.get("accessToken").as_deref(), Some("abc"));
    }
}
