//! Contract tests for the CollectionStore trait.
//!
//! These tests verify the behavioral contract (idempotent upsert, no-op
//! deletes, collection isolation) using the in-memory backend, then mirror
//! the same checks against the file backend. Any conforming implementation
//! must pass these.

use palmares_state::{
    Collection, CollectionStore, HybridStore, JsonFileStore, MemoryStore, StoredRecord,
};

fn record(id: &str, label: &str) -> StoredRecord {
    StoredRecord {
        id: id.to_string(),
        body: serde_json::json!({ "label": label }),
    }
}

// ===========================================================================
// MemoryStore contract tests
// ===========================================================================

#[tokio::test]
async fn load_all_empty_collection() {
    let store = MemoryStore::new();
    let all = store.load_all(Collection::Entries).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn upsert_then_load_all() {
    let store = MemoryStore::new();
    store
        .upsert(Collection::Entries, record("e-1", "feijoada"))
        .await
        .unwrap();
    store
        .upsert(Collection::Entries, record("e-2", "moqueca"))
        .await
        .unwrap();

    let mut all = store.load_all(Collection::Entries).await.unwrap();
    all.sort_by(|a, b| a.id.cmp(&b.id));
    assert_eq!(all.len(), 2);
    assert_eq!(all[0].id, "e-1");
    assert_eq!(all[1].id, "e-2");
}

#[tokio::test]
async fn upsert_same_id_is_idempotent() {
    let store = MemoryStore::new();
    store
        .upsert(Collection::Judges, record("j-1", "first"))
        .await
        .unwrap();
    store
        .upsert(Collection::Judges, record("j-1", "latest"))
        .await
        .unwrap();

    let all = store.load_all(Collection::Judges).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].body["label"], "latest");
}

#[tokio::test]
async fn delete_removes_record() {
    let store = MemoryStore::new();
    store
        .upsert(Collection::Scorecards, record("s-1", "x"))
        .await
        .unwrap();
    store.delete(Collection::Scorecards, "s-1").await.unwrap();

    let all = store.load_all(Collection::Scorecards).await.unwrap();
    assert!(all.is_empty());
}

#[tokio::test]
async fn delete_absent_id_is_noop() {
    let store = MemoryStore::new();
    store.delete(Collection::Scorecards, "ghost").await.unwrap();
}

#[tokio::test]
async fn clear_empties_only_the_named_collection() {
    let store = MemoryStore::new();
    store
        .upsert(Collection::Entries, record("e-1", "a"))
        .await
        .unwrap();
    store
        .upsert(Collection::Judges, record("j-1", "b"))
        .await
        .unwrap();

    store.clear(Collection::Entries).await.unwrap();

    assert!(store.load_all(Collection::Entries).await.unwrap().is_empty());
    assert_eq!(store.load_all(Collection::Judges).await.unwrap().len(), 1);
}

// ===========================================================================
// JsonFileStore contract tests (mirrors the memory tests above)
// ===========================================================================

mod json_file_store {
    use super::*;

    #[tokio::test]
    async fn upsert_then_load_all() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store
            .upsert(Collection::Entries, record("e-1", "feijoada"))
            .await
            .unwrap();
        store
            .upsert(Collection::Entries, record("e-2", "moqueca"))
            .await
            .unwrap();

        let mut all = store.load_all(Collection::Entries).await.unwrap();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].id, "e-1");
    }

    #[tokio::test]
    async fn upsert_same_id_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store
            .upsert(Collection::Judges, record("j-1", "first"))
            .await
            .unwrap();
        store
            .upsert(Collection::Judges, record("j-1", "latest"))
            .await
            .unwrap();

        let all = store.load_all(Collection::Judges).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].body["label"], "latest");
    }

    #[tokio::test]
    async fn delete_absent_id_is_noop() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.delete(Collection::Scorecards, "ghost").await.unwrap();
    }

    #[tokio::test]
    async fn clear_empties_only_the_named_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store
            .upsert(Collection::Entries, record("e-1", "a"))
            .await
            .unwrap();
        store
            .upsert(Collection::Judges, record("j-1", "b"))
            .await
            .unwrap();

        store.clear(Collection::Entries).await.unwrap();

        assert!(store.load_all(Collection::Entries).await.unwrap().is_empty());
        assert_eq!(store.load_all(Collection::Judges).await.unwrap().len(), 1);
    }
}

// ===========================================================================
// HybridStore over real backends
// ===========================================================================

mod hybrid_store {
    use super::*;

    #[tokio::test]
    async fn write_through_lands_in_both_backends() {
        let dir = tempfile::tempdir().unwrap();
        let primary = MemoryStore::new();
        let cache = JsonFileStore::open(dir.path()).unwrap();
        let hybrid = HybridStore::new(primary, cache);

        hybrid
            .upsert(Collection::Entries, record("e-1", "feijoada"))
            .await
            .unwrap();

        // The cache file now holds the record on its own.
        let standalone = JsonFileStore::open(dir.path()).unwrap();
        let cached = standalone.load_all(Collection::Entries).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "e-1");
    }

    #[tokio::test]
    async fn primary_read_resyncs_cache() {
        let dir = tempfile::tempdir().unwrap();
        let primary = MemoryStore::new();
        primary
            .upsert(Collection::Judges, record("j-1", "ana"))
            .await
            .unwrap();

        let hybrid = HybridStore::new(primary, JsonFileStore::open(dir.path()).unwrap());
        hybrid.load_all(Collection::Judges).await.unwrap();

        let standalone = JsonFileStore::open(dir.path()).unwrap();
        let cached = standalone.load_all(Collection::Judges).await.unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].id, "j-1");
    }
}
