//! HTTP-backed collection store
//!
//! Client of a remote JSON API that exposes each collection as a resource:
//!
//! ```text
//! GET    /{collection}        -> JSON array of records
//! PUT    /{collection}/{id}   -> upsert one record (idempotent)
//! DELETE /{collection}/{id}   -> delete one record
//! DELETE /{collection}        -> clear the collection
//! ```
//!
//! Every request carries the configured timeout, so a dead server surfaces
//! as `StorageError::Timeout` instead of hanging a submission. Reads retry
//! once on transport failure; writes never retry (a retried upsert that
//! half-succeeded would be indistinguishable from a double submission).

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::StorageError;
use crate::store::{Collection, CollectionStore, StorageResult, StoredRecord};

const BACKEND: &str = "http";

/// Remote API configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteConfig {
    /// Base URL of the API (no trailing slash)
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
    /// Bearer token (optional for open deployments)
    pub token: Option<String>,
}

impl RemoteConfig {
    /// Config for a specific server with the default 10s timeout.
    pub fn new(base_url: &str) -> Self {
        RemoteConfig {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout_secs: 10,
            token: None,
        }
    }

    /// Read config from `PALMARES_REMOTE_URL` / `PALMARES_REMOTE_TOKEN`.
    ///
    /// Returns `None` when no remote URL is configured, so callers can fall
    /// back to a local backend.
    pub fn from_env() -> Option<Self> {
        let base_url = std::env::var("PALMARES_REMOTE_URL").ok()?;
        let mut config = Self::new(&base_url);
        config.token = std::env::var("PALMARES_REMOTE_TOKEN").ok();
        Some(config)
    }

    /// Set the bearer token.
    pub fn with_token(mut self, token: &str) -> Self {
        self.token = Some(token.to_string());
        self
    }

    /// Set the per-request timeout.
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }
}

/// Store that persists collections through the remote API.
pub struct HttpStore {
    config: RemoteConfig,
    client: reqwest::Client,
}

impl HttpStore {
    /// Build a store for the given config.
    pub fn new(config: RemoteConfig) -> StorageResult<Self> {
        let client = reqwest::Client::builder()
            .user_agent("palmares-state/0.1.0")
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| StorageError::Unavailable {
                backend: BACKEND.to_string(),
                detail: e.to_string(),
            })?;
        Ok(Self { config, client })
    }

    /// Build a store from environment variables, if a remote is configured.
    pub fn from_env() -> StorageResult<Option<Self>> {
        match RemoteConfig::from_env() {
            Some(config) => Ok(Some(Self::new(config)?)),
            None => Ok(None),
        }
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.config.base_url, collection.name())
    }

    fn record_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{}/{}", self.config.base_url, collection.name(), id)
    }

    fn apply_auth(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.config.token {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    fn transport_error(e: reqwest::Error) -> StorageError {
        if e.is_timeout() {
            StorageError::Timeout {
                backend: BACKEND.to_string(),
            }
        } else {
            StorageError::Unavailable {
                backend: BACKEND.to_string(),
                detail: e.to_string(),
            }
        }
    }

    fn status_error(status: reqwest::StatusCode) -> StorageError {
        StorageError::Unavailable {
            backend: BACKEND.to_string(),
            detail: format!("server returned {status}"),
        }
    }

    async fn fetch_collection(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>> {
        let url = self.collection_url(collection);
        let response = self
            .apply_auth(self.client.get(&url))
            .send()
            .await
            .map_err(Self::transport_error)?;

        // A collection the server has never seen is an empty collection.
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(Vec::new());
        }
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }

        response
            .json::<Vec<StoredRecord>>()
            .await
            .map_err(|e| StorageError::Corrupt {
                collection: collection.name().to_string(),
                detail: e.to_string(),
            })
    }
}

impl std::fmt::Debug for HttpStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpStore")
            .field("base_url", &self.config.base_url)
            .field("timeout_secs", &self.config.timeout_secs)
            .finish()
    }
}

#[async_trait]
impl CollectionStore for HttpStore {
    async fn load_all(&self, collection: Collection) -> StorageResult<Vec<StoredRecord>> {
        match self.fetch_collection(collection).await {
            Ok(records) => Ok(records),
            // Corrupt payloads are not transient; only transport faults
            // qualify for the single retry.
            Err(err @ StorageError::Corrupt { .. }) => Err(err),
            Err(first) => {
                warn!(collection = %collection, error = %first, "read failed, retrying once");
                self.fetch_collection(collection).await
            }
        }
    }

    async fn upsert(&self, collection: Collection, record: StoredRecord) -> StorageResult<()> {
        let url = self.record_url(collection, &record.id);
        debug!(collection = %collection, id = %record.id, "remote upsert");
        let response = self
            .apply_auth(self.client.put(&url).json(&record))
            .send()
            .await
            .map_err(Self::transport_error)?;
        if !response.status().is_success() {
            return Err(Self::status_error(response.status()));
        }
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> StorageResult<()> {
        let url = self.record_url(collection, id);
        let response = self
            .apply_auth(self.client.delete(&url))
            .send()
            .await
            .map_err(Self::transport_error)?;
        // Deleting an absent record is a no-op, same as the other backends.
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Self::status_error(response.status()));
        }
        Ok(())
    }

    async fn clear(&self, collection: Collection) -> StorageResult<()> {
        let url = self.collection_url(collection);
        let response = self
            .apply_auth(self.client.delete(&url))
            .send()
            .await
            .map_err(Self::transport_error)?;
        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(Self::status_error(response.status()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_strips_trailing_slash() {
        let config = RemoteConfig::new("https://api.example.com/v1/");
        assert_eq!(config.base_url, "https://api.example.com/v1");
    }

    #[test]
    fn config_builders() {
        let config = RemoteConfig::new("https://api.example.com")
            .with_token("secret")
            .with_timeout(3);
        assert_eq!(config.token.as_deref(), Some("secret"));
        assert_eq!(config.timeout_secs, 3);
    }

    #[test]
    fn urls_follow_collection_layout() {
        let store = HttpStore::new(RemoteConfig::new("https://api.example.com")).unwrap();
        assert_eq!(
            store.collection_url(Collection::Entries),
            "https://api.example.com/entries"
        );
        assert_eq!(
            store.record_url(Collection::Scorecards, "s-9"),
            "https://api.example.com/scorecards/s-9"
        );
    }
}
