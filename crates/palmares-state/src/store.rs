//! Storage trait definitions for Palmares
//!
//! The engine persists three record collections (entries, judges, scorecards)
//! through one narrow abstraction:
//! - `CollectionStore`: load/upsert/delete/clear keyed by record id
//!
//! The trait is async and backend-agnostic. `MemoryStore` doubles as the
//! in-memory fake for testing; file, HTTP and hybrid backends live in their
//! own modules.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// Collection: the three persisted record families
// ---------------------------------------------------------------------------

/// The record collections a backend must hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Entries,
    Judges,
    Scorecards,
}

impl Collection {
    /// All collections, in load order.
    pub const ALL: [Collection; 3] = [
        Collection::Entries,
        Collection::Judges,
        Collection::Scorecards,
    ];

    /// Stable storage name (file stem, URL path segment, map key).
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Entries => "entries",
            Collection::Judges => "judges",
            Collection::Scorecards => "scorecards",
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

// ---------------------------------------------------------------------------
// StoredRecord: schema boundary
// ---------------------------------------------------------------------------

/// A persisted record: an id plus its JSON body.
///
/// Backends move these around opaquely; the typed schema is enforced at the
/// boundary via [`StoredRecord::encode`] and [`StoredRecord::decode`], so a
/// malformed body surfaces as `StorageError::Corrupt` instead of leaking
/// half-parsed data into the engine.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct StoredRecord {
    pub id: String,
    pub body: serde_json::Value,
}

impl StoredRecord {
    /// Serialize a typed value into a record under the given id.
    pub fn encode<T: Serialize>(id: impl Into<String>, value: &T) -> StorageResult<Self> {
        Ok(StoredRecord {
            id: id.into(),
            body: serde_json::to_value(value)?,
        })
    }

    /// Deserialize the body back into its typed form.
    ///
    /// Returns `StorageError::Corrupt` naming the collection when the stored
    /// body does not match the expected schema.
    pub fn decode<T: DeserializeOwned>(&self, collection: Collection) -> StorageResult<T> {
        serde_json::from_value(self.body.clone()).map_err(|e| StorageError::Corrupt {
            collection: collection.name().to_string(),
            detail: format!("record '{}': {}", self.id, e),
        })
    }
}

// ---------------------------------------------------------------------------
// CollectionStore: the persistence contract
// ---------------------------------------------------------------------------

/// Keyed record store over the fixed set of [`Collection`]s.
///
/// Guarantees:
/// - `upsert` is idempotent by record id: inserting the same id twice leaves
///   exactly one record holding the latest body.
/// - `load_all` returns every record of the collection, order unspecified.
/// - `delete` of an absent id is a no-op.
/// - `clear` removes every record of the collection.
#[async_trait]
pub trait CollectionStore: Send + Sync {
    /// Load every record in a collection.
    async fn load_all(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>>;

    /// Insert or replace a record by id.
    async fn upsert(&self, collection: Collection, record: StoredRecord) -> StorageResult<()>;

    /// Delete a record by id. No-op if absent.
    async fn delete(&self, collection: Collection, id: &str) -> StorageResult<()>;

    /// Remove every record in a collection.
    async fn clear(&self, collection: Collection) -> StorageResult<()>;
}

// Lets callers pick a backend at runtime via `Box<dyn CollectionStore>`.
#[async_trait]
impl<T: CollectionStore + ?Sized> CollectionStore for Box<T> {
    async fn load_all(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>> {
        (**self).load_all(collection).await
    }

    async fn upsert(&self, collection: Collection, record: StoredRecord) -> StorageResult<()> {
        (**self).upsert(collection, record).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> StorageResult<()> {
        (**self).delete(collection, id).await
    }

    async fn clear(&self, collection: Collection) -> StorageResult<()> {
        (**self).clear(collection).await
    }
}
