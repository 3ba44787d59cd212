use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Mutex;

use super::error::StorageError;

/// Blob store keyed by short identifiers. Values are JSON text, but the
/// store itself never looks inside them.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, blob: &str) -> Result<(), StorageError>;
}

/// One `<key>.json` file per key under a base folder.
pub struct FileStore {
    base: PathBuf,
}

impl FileStore {
    pub fn new(base: PathBuf) -> Self {
        FileStore { base }
    }

    fn key_path(&self, key: &str) -> PathBuf {
        self.base.join(format!("{}.json", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.key_path(key);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        std::fs::create_dir_all(&self.base)?;
        let path = self.key_path(key);
        let staging = path.with_extension("json.tmp");
        std::fs::write(&staging, blob)?;
        std::fs::rename(staging, path)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self
            .entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .get(key)
            .cloned())
    }

    fn set(&self, key: &str, blob: &str) -> Result<(), StorageError> {
        self.entries
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(key.to_string(), blob.to_string());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_base() -> PathBuf {
        std::env::temp_dir().join(format!("speed-o-mat-test-{}", uuid::Uuid::new_v4()))
    }

    #[test]
    fn test_file_store_round_trip() {
        let base = temp_base();
        let store = FileStore::new(base.clone());

        assert!(store.get("settings").unwrap().is_none());
        store.set("settings", "{\"dark_mode\":true}").unwrap();
        assert_eq!(
            store.get("settings").unwrap().as_deref(),
            Some("{\"dark_mode\":true}")
        );

        store.set("settings", "{}").unwrap();
        assert_eq!(store.get("settings").unwrap().as_deref(), Some("{}"));
        assert!(!base.join("settings.json.tmp").exists());

        std::fs::remove_dir_all(base).unwrap();
    }

    #[test]
    fn test_memory_store() {
        let store = MemoryStore::new();
        assert!(store.get("a").unwrap().is_none());
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_memory_store_survives_poisoned_lock() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();

        std::thread::scope(|s| {
            let handle = s.spawn(|| {
                let _guard = store.entries.lock().unwrap();
                panic!("panic while holding the store");
            });
            assert!(handle.join().is_err());
        });
        assert!(store.entries.is_poisoned());

        assert_eq!(store.get("a").unwrap().as_deref(), Some("1"));
        store.set("b", "2").unwrap();
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }
}
