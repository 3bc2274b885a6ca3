//! Palmares-State: persistence layer for the Palmares scoring engine
//!
//! The engine keeps three record collections (entries, judges, scorecards)
//! behind one narrow storage abstraction. This crate defines that contract
//! and ships four interchangeable backends:
//!
//! - `MemoryStore`: ephemeral, also the universal test fake
//! - `JsonFileStore`: one JSON file per collection under a data directory
//! - `HttpStore`: client of a remote JSON API, with request timeouts
//! - `HybridStore`: remote primary with local cache fallback and an explicit
//!   staleness flag
//!
//! Records cross the boundary as `StoredRecord` (id + JSON body); the typed
//! schema is enforced at encode/decode time, never inside a backend.

mod error;
mod hybrid;
mod json_file;
mod memory;
mod remote;
pub mod store;

pub use error::StorageError;
pub use hybrid::{Freshness, HybridStore};
pub use json_file::{has_existing_data, JsonFileStore};
pub use memory::MemoryStore;
pub use remote::{HttpStore, RemoteConfig};
pub use store::{Collection, CollectionStore, StorageResult, StoredRecord};
