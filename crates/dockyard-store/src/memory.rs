use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use bytes::Bytes;

use crate::content::Content;
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::traits::Storage;

/// In-memory, HashMap-based storage.
///
/// Intended for tests and embedding. Values are held as [`Bytes`] behind a
/// `RwLock`, so reads hand out cheap clones. `save` drains the incoming
/// stream completely before taking the write lock.
pub struct InMemoryStorage {
    values: RwLock<HashMap<Key, Bytes>>,
}

impl InMemoryStorage {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Number of keys currently stored.
    pub fn len(&self) -> usize {
        self.values.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.read().expect("lock poisoned").is_empty()
    }

    /// Return a sorted list of all keys in the store.
    pub fn keys(&self) -> Vec<Key> {
        let map = self.values.read().expect("lock poisoned");
        let mut keys: Vec<Key> = map.keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl Default for InMemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Storage for InMemoryStorage {
    async fn exists(&self, key: &Key) -> StoreResult<bool> {
        let map = self.values.read().expect("lock poisoned");
        Ok(map.contains_key(key))
    }

    async fn value(&self, key: &Key) -> StoreResult<Content> {
        let data = {
            let map = self.values.read().expect("lock poisoned");
            map.get(key).cloned()
        };
        data.map(Content::from_bytes)
            .ok_or_else(|| StoreError::NotFound(key.clone()))
    }

    async fn save(&self, key: &Key, content: Content) -> StoreResult<()> {
        let data = content.collect_bytes().await?;
        let mut map = self.values.write().expect("lock poisoned");
        map.insert(key.clone(), data);
        Ok(())
    }
}

impl std::fmt::Debug for InMemoryStorage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let count = self.len();
        f.debug_struct("InMemoryStorage")
            .field("key_count", &count)
            .finish()
    }
}
