//! Durable local key-value storage.
//!
//! A small JSON-file-backed map standing in for browser `localStorage`:
//! string keys, string values, write-through on every mutation. Only three
//! keys exist: [`TOKEN_KEY`], [`REFRESH_TOKEN_KEY`] and [`FAVORITES_KEY`].
//!
//! The file is a cache, not a source of truth (except for the tokens
//! themselves), so loading is tolerant: a missing or malformed file resets
//! to an empty map with a warning, never an error.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use thiserror::Error;

/// Storage key for the access token.
pub const TOKEN_KEY: &str = "token";
/// Storage key for the refresh token.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";
/// Storage key for the serialized favorites collection.
pub const FAVORITES_KEY: &str = "favorites";

/// Errors that can occur when persisting to durable storage.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing the map failed.
    #[error("Serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// File-backed key-value store shared by the token store and favorites.
///
/// Cheap to clone; all clones share the same map and file.
#[derive(Clone)]
pub struct LocalStore {
    inner: Arc<LocalStoreInner>,
}

struct LocalStoreInner {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl LocalStore {
    /// Open (or create) the store at `path`.
    ///
    /// A missing file yields an empty store. A file that cannot be read or
    /// parsed also yields an empty store, with a warning; the next
    /// write-through replaces it.
    #[must_use]
    pub fn open(path: &Path) -> Self {
        let entries = match std::fs::read_to_string(path) {
            Ok(raw) => match serde_json::from_str::<HashMap<String, String>>(&raw) {
                Ok(map) => map,
                Err(error) => {
                    tracing::warn!(%error, path = %path.display(), "Malformed storage file, resetting");
                    HashMap::new()
                }
            },
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(error) => {
                tracing::warn!(%error, path = %path.display(), "Unreadable storage file, resetting");
                HashMap::new()
            }
        };

        Self {
            inner: Arc::new(LocalStoreInner {
                path: path.to_path_buf(),
                entries: Mutex::new(entries),
            }),
        }
    }

    /// Get the value stored under `key`, if any.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        self.lock().get(key).cloned()
    }

    /// Store `value` under `key` and flush the map to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written. The in-memory value
    /// is updated regardless; memory and disk may briefly disagree, which
    /// is acceptable for cache data.
    pub fn set(&self, key: &str, value: &str) -> std::result::Result<(), StorageError> {
        let snapshot = {
            let mut entries = self.lock();
            entries.insert(key.to_string(), value.to_string());
            entries.clone()
        };
        self.persist(&snapshot)
    }

    /// Remove `key` and flush the map to disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn remove(&self, key: &str) -> std::result::Result<(), StorageError> {
        let snapshot = {
            let mut entries = self.lock();
            entries.remove(key);
            entries.clone()
        };
        self.persist(&snapshot)
    }

    fn persist(&self, entries: &HashMap<String, String>) -> std::result::Result<(), StorageError> {
        if let Some(parent) = self.inner.path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_json::to_string_pretty(entries)?;
        std::fs::write(&self.inner.path, raw)?;
        Ok(())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for LocalStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LocalStore")
            .field("path", &self.inner.path)
            .field("keys", &self.lock().keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_store() -> (tempfile::TempDir, LocalStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("state.json"));
        (dir, store)
    }

    #[test]
    fn test_set_get_remove() {
        let (_dir, store) = temp_store();
        assert_eq!(store.get(TOKEN_KEY), None);

        store.set(TOKEN_KEY, "A1").unwrap();
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("A1"));

        store.remove(TOKEN_KEY).unwrap();
        assert_eq!(store.get(TOKEN_KEY), None);
    }

    #[test]
    fn test_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = LocalStore::open(&path);
        store.set(REFRESH_TOKEN_KEY, "R1").unwrap();
        drop(store);

        let reopened = LocalStore::open(&path);
        assert_eq!(reopened.get(REFRESH_TOKEN_KEY).as_deref(), Some("R1"));
    }

    #[test]
    fn test_malformed_file_resets_to_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        std::fs::write(&path, "{not valid json").unwrap();

        let store = LocalStore::open(&path);
        assert_eq!(store.get(TOKEN_KEY), None);

        // Writes still work after a reset.
        store.set(TOKEN_KEY, "A1").unwrap();
        assert_eq!(store.get(TOKEN_KEY).as_deref(), Some("A1"));
    }

    #[test]
    fn test_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalStore::open(&dir.path().join("nope.json"));
        assert_eq!(store.get(FAVORITES_KEY), None);
    }
}
