//! In-memory key-value store

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;

use super::{KeyValueStore, Result};

/// Map-backed store with no durability, used by tests and demos.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored keys, counters included.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().unwrap().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.lock().unwrap().get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        self.entries.lock().unwrap().remove(key);
        Ok(())
    }

    async fn list_keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().unwrap().keys().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let store = MemoryStore::new();

        store.set("f0", r#"{"title":"x"}"#).await.unwrap();
        assert_eq!(store.get("f0").await.unwrap().unwrap(), r#"{"title":"x"}"#);

        store.delete("f0").await.unwrap();
        assert!(store.get("f0").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_absent_key_is_ok() {
        let store = MemoryStore::new();
        store.delete("f99").await.unwrap();
    }

    #[tokio::test]
    async fn test_list_keys() {
        let store = MemoryStore::new();
        store.set("f0", "a").await.unwrap();
        store.set("s0", "b").await.unwrap();
        store.set("folder_key", "0").await.unwrap();

        let mut keys = store.list_keys().await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["f0", "folder_key", "s0"]);
    }
}
