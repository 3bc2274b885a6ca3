//! Hybrid primary/cache collection store
//!
//! Pairs a primary backend (normally remote) with a local cache. One policy,
//! applied uniformly to every collection:
//!
//! - Reads prefer the primary. A successful read refreshes the cache and
//!   marks the collection fresh. If the primary is unreachable, the read is
//!   served from the cache and the collection is flagged stale so callers
//!   can surface degraded mode instead of silently showing old data.
//! - Writes go through the primary first and fail fast if it rejects them.
//!   The cache is updated afterwards; a cache write failure is logged and
//!   tolerated, since the primary already holds the record.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::warn;

use crate::error::StorageError;
use crate::store::{Collection, CollectionStore, StorageResult, StoredRecord};

/// How current the data served for a collection is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state")]
pub enum Freshness {
    /// Last read came from the primary.
    Fresh { synced_at: DateTime<Utc> },
    /// Primary unreachable; reads are served from the cache.
    Stale { since: DateTime<Utc> },
    /// No read has gone through yet.
    Unknown,
}

impl Freshness {
    pub fn is_stale(&self) -> bool {
        matches!(self, Freshness::Stale { .. })
    }
}

/// Write-through store with cache fallback for reads.
#[derive(Debug)]
pub struct HybridStore<P, C> {
    primary: P,
    cache: C,
    freshness: Mutex<HashMap<Collection, Freshness>>,
}

impl<P, C> HybridStore<P, C>
where
    P: CollectionStore,
    C: CollectionStore,
{
    pub fn new(primary: P, cache: C) -> Self {
        Self {
            primary,
            cache,
            freshness: Mutex::new(HashMap::new()),
        }
    }

    /// Current freshness of a collection, as observed by the last read.
    pub fn freshness(&self, collection: Collection) -> Freshness {
        let freshness = self.freshness.lock().unwrap();
        freshness
            .get(&collection)
            .copied()
            .unwrap_or(Freshness::Unknown)
    }

    /// True when any collection is currently served from the cache.
    pub fn degraded(&self) -> bool {
        let freshness = self.freshness.lock().unwrap();
        freshness.values().any(|f| f.is_stale())
    }

    fn mark_fresh(&self, collection: Collection) {
        let mut freshness = self.freshness.lock().unwrap();
        freshness.insert(
            collection,
            Freshness::Fresh {
                synced_at: Utc::now(),
            },
        );
    }

    fn mark_stale(&self, collection: Collection) {
        let mut freshness = self.freshness.lock().unwrap();
        // Keep the original fallback time across repeated failures.
        let entry = freshness.entry(collection).or_insert(Freshness::Stale {
            since: Utc::now(),
        });
        if !entry.is_stale() {
            *entry = Freshness::Stale { since: Utc::now() };
        }
    }

    /// Mirror a primary read into the cache so a later outage serves
    /// data no older than this read.
    async fn refresh_cache(&self, collection: Collection, records: &[StoredRecord]) {
        let result = async {
            self.cache.clear(collection).await?;
            for record in records {
                self.cache.upsert(collection, record.clone()).await?;
            }
            Ok::<_, StorageError>(())
        }
        .await;

        if let Err(e) = result {
            warn!(collection = %collection, error = %e, "cache refresh failed");
        }
    }
}

#[async_trait]
impl<P, C> CollectionStore for HybridStore<P, C>
where
    P: CollectionStore,
    C: CollectionStore,
{
    async fn load_all(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>> {
        match self.primary.load_all(collection).await {
            Ok(records) => {
                self.refresh_cache(collection, &records).await;
                self.mark_fresh(collection);
                Ok(records)
            }
            Err(primary_err) => {
                warn!(
                    collection = %collection,
                    error = %primary_err,
                    "primary store unreachable, serving cached data"
                );
                self.mark_stale(collection);
                self.cache.load_all(collection).await
            }
        }
    }

    async fn upsert(&self, collection: Collection, record: StoredRecord) -> StorageResult<()> {
        self.primary.upsert(collection, record.clone()).await?;
        if let Err(e) = self.cache.upsert(collection, record).await {
            warn!(collection = %collection, error = %e, "cache upsert failed");
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StorageResult<()> {
        self.primary.delete(collection, id).await?;
        if let Err(e) = self.cache.delete(collection, id).await {
            warn!(collection = %collection, error = %e, "cache delete failed");
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> StorageResult<()> {
        self.primary.clear(collection).await?;
        if let Err(e) = self.cache.clear(collection).await {
            warn!(collection = %collection, error = %e, "cache clear failed");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    /// Store whose every operation fails, standing in for a dead remote.
    #[derive(Debug, Default)]
    struct DeadStore;

    #[async_trait]
    impl CollectionStore for DeadStore {
        async fn load_all(&self, _c: Collection) -> StorageResult<Vec<StoredRecord>> {
            Err(unavailable())
        }
        async fn upsert(&self, _c: Collection, _r: StoredRecord) -> StorageResult<()> {
            Err(unavailable())
        }
        async fn delete(&self, _c: Collection, _id: &str) -> StorageResult<()> {
            Err(unavailable())
        }
        async fn clear(&self, _c: Collection) -> StorageResult<()> {
            Err(unavailable())
        }
    }

    fn unavailable() -> StorageError {
        StorageError::Unavailable {
            backend: "dead".to_string(),
            detail: "connection refused".to_string(),
        }
    }

    fn record(id: &str) -> StoredRecord {
        StoredRecord {
            id: id.to_string(),
            body: serde_json::json!({ "id": id }),
        }
    }

    #[tokio::test]
    async fn read_from_primary_refreshes_cache_and_marks_fresh() {
        let primary = MemoryStore::new();
        primary
            .upsert(Collection::Entries, record("e-1"))
            .await
            .unwrap();

        let hybrid = HybridStore::new(primary, MemoryStore::new());
        let loaded = hybrid.load_all(Collection::Entries).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!hybrid.freshness(Collection::Entries).is_stale());
        assert!(!hybrid.degraded());
    }

    #[tokio::test]
    async fn dead_primary_falls_back_to_cache_and_flags_stale() {
        let cache = MemoryStore::new();
        cache
            .upsert(Collection::Entries, record("cached"))
            .await
            .unwrap();

        let hybrid = HybridStore::new(DeadStore, cache);
        let loaded = hybrid.load_all(Collection::Entries).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "cached");
        assert!(hybrid.freshness(Collection::Entries).is_stale());
        assert!(hybrid.degraded());
    }

    #[tokio::test]
    async fn stale_since_is_preserved_across_repeated_failures() {
        let hybrid = HybridStore::new(DeadStore, MemoryStore::new());
        hybrid.load_all(Collection::Judges).await.unwrap();
        let first = hybrid.freshness(Collection::Judges);
        hybrid.load_all(Collection::Judges).await.unwrap();
        assert_eq!(hybrid.freshness(Collection::Judges), first);
    }

    #[tokio::test]
    async fn write_fails_fast_when_primary_rejects() {
        let cache = MemoryStore::new();
        let hybrid = HybridStore::new(DeadStore, cache);

        let err = hybrid
            .upsert(Collection::Scorecards, record("s-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Unavailable { .. }));
    }

    #[tokio::test]
    async fn cache_failure_does_not_fail_writes() {
        let primary = MemoryStore::new();
        let hybrid = HybridStore::new(primary, DeadStore);

        hybrid
            .upsert(Collection::Scorecards, record("s-1"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn successful_read_after_outage_resets_freshness() {
        // Simulate recovery by swapping stores: first a dead primary, then a
        // live one holding the same collection.
        let hybrid = HybridStore::new(DeadStore, MemoryStore::new());
        hybrid.load_all(Collection::Entries).await.unwrap();
        assert!(hybrid.degraded());

        let live = MemoryStore::new();
        live.upsert(Collection::Entries, record("e-1"))
            .await
            .unwrap();
        let recovered = HybridStore::new(live, MemoryStore::new());
        recovered.load_all(Collection::Entries).await.unwrap();
        assert!(!recovered.degraded());
    }
}
