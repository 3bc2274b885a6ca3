//! In-memory collection store
//!
//! Backs the engine when no persistence is configured, and doubles as the
//! universal fake for tests. Satisfies the full `CollectionStore` contract
//! without any external dependencies.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::store::{Collection, CollectionStore, StorageResult, StoredRecord};

/// In-memory store backed by one `HashMap<id, record>` per collection.
///
/// Clones are handles onto the same map, so a clone kept by a test observes
/// every write the service makes.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<Collection, HashMap<String, StoredRecord>>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held in a collection.
    pub fn len(&self, collection: Collection) -> usize {
        let collections = self.collections.lock().unwrap();
        collections.get(&collection).map_or(0, |m| m.len())
    }

    pub fn is_empty(&self, collection: Collection) -> bool {
        self.len(collection) == 0
    }
}

#[async_trait]
impl CollectionStore for MemoryStore {
    async fn load_all(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>> {
        let collections = self.collections.lock().unwrap();
        Ok(collections
            .get(&collection)
            .map(|m| m.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn upsert(&self, collection: Collection, record: StoredRecord) -> StorageResult<()> {
        let mut collections = self.collections.lock().unwrap();
        collections
            .entry(collection)
            .or_default()
            .insert(record.id.clone(), record);
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StorageResult<()> {
        let mut collections = self.collections.lock().unwrap();
        if let Some(records) = collections.get_mut(&collection) {
            records.remove(id);
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> StorageResult<()> {
        let mut collections = self.collections.lock().unwrap();
        collections.remove(&collection);
        Ok(())
    }
}
