//! Persistent session store.
//!
//! The store is a plain key/value surface over session-scoped persistent
//! storage: opaque string values, no validation, callers own JSON encoding.
//! Two implementations are provided - [`MemoryStore`] for tests and ephemeral
//! use, and [`FileStore`] which survives process restarts.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

/// Well-known store keys.
///
/// This is the persisted-state layout the rest of the application relies on;
/// the three session keys must not change.
pub mod keys {
    /// Key for the short-lived access token.
    pub const ACCESS: &str = "access";

    /// Key for the longer-lived refresh token.
    pub const REFRESH: &str = "refresh";

    /// Key for the serialized user profile (source of truth for "is logged in").
    pub const USER: &str = "user";

    /// Key for the serialized cart line items.
    pub const CART: &str = "cart";
}

/// Key/value persistence contract shared by the session manager, the HTTP
/// gateway, and the cart.
pub trait SessionStore: Send + Sync + 'static {
    /// Read the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Store `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str);

    /// Remove the value stored under `key`.
    fn remove(&self, key: &str);

    /// Remove every stored value.
    fn clear(&self);
}

// =============================================================================
// MemoryStore
// =============================================================================

/// In-memory store. State dies with the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    /// Create an empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl SessionStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .ok()
            .and_then(|values| values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) {
        if let Ok(mut values) = self.values.write() {
            values.insert(key.to_owned(), value.to_owned());
        }
    }

    fn remove(&self, key: &str) {
        if let Ok(mut values) = self.values.write() {
            values.remove(key);
        }
    }

    fn clear(&self) {
        if let Ok(mut values) = self.values.write() {
            values.clear();
        }
    }
}

// =============================================================================
// FileStore
// =============================================================================

/// File-backed store: one file per key under a directory.
///
/// Storage failures are logged and otherwise swallowed, matching the
/// best-effort semantics of browser storage; a read after a failed write
/// simply returns the previous value.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open (creating if necessary) a store rooted at `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> std::io::Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl SessionStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set(&self, key: &str, value: &str) {
        if let Err(e) = fs::write(self.path_for(key), value) {
            tracing::warn!(key, error = %e, "failed to persist store value");
        }
    }

    fn remove(&self, key: &str) {
        let path = self.path_for(key);
        if path.exists()
            && let Err(e) = fs::remove_file(&path)
        {
            tracing::warn!(key, error = %e, "failed to remove store value");
        }
    }

    fn clear(&self) {
        let Ok(entries) = fs::read_dir(&self.dir) else {
            return;
        };
        for entry in entries.flatten() {
            if let Err(e) = fs::remove_file(entry.path()) {
                tracing::warn!(path = %entry.path().display(), error = %e, "failed to clear store value");
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn unique_temp_dir(tag: &str) -> PathBuf {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir().join(format!("greenbasket-store-{tag}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get(keys::ACCESS), None);

        store.set(keys::ACCESS, "token-1");
        assert_eq!(store.get(keys::ACCESS), Some("token-1".to_string()));

        store.set(keys::ACCESS, "token-2");
        assert_eq!(store.get(keys::ACCESS), Some("token-2".to_string()));

        store.remove(keys::ACCESS);
        assert_eq!(store.get(keys::ACCESS), None);
    }

    #[test]
    fn test_memory_store_clear() {
        let store = MemoryStore::new();
        store.set(keys::ACCESS, "a");
        store.set(keys::REFRESH, "r");
        store.clear();
        assert_eq!(store.get(keys::ACCESS), None);
        assert_eq!(store.get(keys::REFRESH), None);
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = unique_temp_dir("roundtrip");
        let store = FileStore::open(&dir).unwrap();

        store.set(keys::USER, r#"{"id":1}"#);
        assert_eq!(store.get(keys::USER), Some(r#"{"id":1}"#.to_string()));

        store.remove(keys::USER);
        assert_eq!(store.get(keys::USER), None);

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = unique_temp_dir("reopen");
        {
            let store = FileStore::open(&dir).unwrap();
            store.set(keys::REFRESH, "persisted");
        }
        let store = FileStore::open(&dir).unwrap();
        assert_eq!(store.get(keys::REFRESH), Some("persisted".to_string()));

        let _ = fs::remove_dir_all(dir);
    }

    #[test]
    fn test_file_store_clear_removes_all_keys() {
        let dir = unique_temp_dir("clear");
        let store = FileStore::open(&dir).unwrap();
        store.set(keys::ACCESS, "a");
        store.set(keys::CART, "[]");
        store.clear();
        assert_eq!(store.get(keys::ACCESS), None);
        assert_eq!(store.get(keys::CART), None);

        let _ = fs::remove_dir_all(dir);
    }
}
