//! JSON-file collection store
//!
//! One `<collection>.json` file per collection under a data directory, each
//! holding a JSON array of records. Writes go to a sibling temp file and are
//! renamed into place, so a crash mid-write never leaves a half-written
//! collection behind.
//!
//! Collections are small (tens of entries, a handful of judges), so files are
//! rewritten whole on every mutation.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use tracing::debug;

use crate::error::StorageError;
use crate::store::{Collection, CollectionStore, StorageResult, StoredRecord};

/// File-backed store rooted at a data directory.
pub struct JsonFileStore {
    dir: PathBuf,
    // Serializes load-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl JsonFileStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> StorageResult<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        debug!(dir = %dir.display(), "json file store opened");
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Path of the file backing a collection.
    pub fn collection_path(&self, collection: Collection) -> PathBuf {
        self.dir.join(format!("{}.json", collection.name()))
    }

    fn read_collection(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>> {
        let path = self.collection_path(collection);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path)?;
        serde_json::from_str(&raw).map_err(|e| StorageError::Corrupt {
            collection: collection.name().to_string(),
            detail: format!("{}: {}", path.display(), e),
        })
    }

    fn write_collection(
        &self,
        collection: Collection,
        records: &[StoredRecord],
    ) -> StorageResult<()> {
        let path = self.collection_path(collection);
        let tmp = path.with_extension("json.tmp");
        let raw = serde_json::to_string_pretty(records)?;
        fs::write(&tmp, raw)?;
        fs::rename(&tmp, &path)?;
        Ok(())
    }
}

impl std::fmt::Debug for JsonFileStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonFileStore")
            .field("dir", &self.dir)
            .finish()
    }
}

#[async_trait]
impl CollectionStore for JsonFileStore {
    async fn load_all(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>> {
        self.read_collection(collection)
    }

    async fn upsert(&self, collection: Collection, record: StoredRecord) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut records = self.read_collection(collection)?;
        match records.iter_mut().find(|r| r.id == record.id) {
            Some(existing) => *existing = record,
            None => records.push(record),
        }
        self.write_collection(collection, &records)
    }

    async fn delete(&self, collection: Collection, id: &str) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap();
        let mut records = self.read_collection(collection)?;
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() != before {
            self.write_collection(collection, &records)?;
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> StorageResult<()> {
        let _guard = self.write_lock.lock().unwrap();
        let path = self.collection_path(collection);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }
}

/// Returns `true` when the directory already holds any collection file.
pub fn has_existing_data(dir: &Path) -> bool {
    Collection::ALL
        .iter()
        .any(|c| dir.join(format!("{}.json", c.name())).exists())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: &str, n: u32) -> StoredRecord {
        StoredRecord {
            id: id.to_string(),
            body: serde_json::json!({ "n": n }),
        }
    }

    #[tokio::test]
    async fn survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            store
                .upsert(Collection::Judges, record("j-1", 7))
                .await
                .unwrap();
        }

        let store = JsonFileStore::open(dir.path()).unwrap();
        let all = store.load_all(Collection::Judges).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].body["n"], 7);
    }

    #[tokio::test]
    async fn missing_file_is_empty_collection() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        assert!(store.load_all(Collection::Entries).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn corrupt_file_is_reported_not_swallowed() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        fs::write(store.collection_path(Collection::Entries), "not json").unwrap();

        let err = store.load_all(Collection::Entries).await.unwrap_err();
        assert!(matches!(err, StorageError::Corrupt { .. }));
    }

    #[tokio::test]
    async fn clear_removes_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store
            .upsert(Collection::Scorecards, record("s-1", 1))
            .await
            .unwrap();
        assert!(has_existing_data(dir.path()));

        store.clear(Collection::Scorecards).await.unwrap();
        assert!(!has_existing_data(dir.path()));
    }
}
