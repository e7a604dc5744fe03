// src/services/store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::models::{CacheEntry, CacheKey, ClearFilter, Site};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("http request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("failed to decode row: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("{0}")]
    Backend(String),
}

/// Backing store for cached analytics payloads.
///
/// Writes are upserts on the full composite key, so concurrent writers for
/// the same key overwrite each other.
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// Entry for `key` whose `expires_at` is after `now`.
    async fn find_live(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<Option<CacheEntry>, StoreError>;

    /// Most recently fetched entry for `key`, expired or not.
    async fn find_latest(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError>;

    async fn upsert(&self, entry: &CacheEntry) -> Result<(), StoreError>;

    /// Returns the number of rows removed.
    async fn delete(&self, filter: &ClearFilter) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait SiteRepository: Send + Sync {
    async fn find_site_by_id(&self, id: &str) -> Result<Option<Site>, StoreError>;

    async fn find_site_by_slug(&self, slug: &str) -> Result<Option<Site>, StoreError>;

    /// Dashboard links carry either the row id or the slug; ids win.
    async fn find_site_by_id_or_slug(&self, id_or_slug: &str) -> Result<Option<Site>, StoreError> {
        if let Some(site) = self.find_site_by_id(id_or_slug).await? {
            return Ok(Some(site));
        }
        self.find_site_by_slug(id_or_slug).await
    }
}
