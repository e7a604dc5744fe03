// src/services/cache.rs
//
// Read-through cache in front of the analytics fetchers. Callers never see
// an error: upstream or store failures degrade to the last stored payload,
// or to `None` when nothing was ever stored.

use chrono::{DateTime, Utc};
use log::{debug, error, info, warn};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::models::{CacheEntry, CacheKey, ClearFilter, DataSource};
use super::store::{CacheStore, StoreError};
use super::ttl::TtlTable;

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache store failure: {0}")]
    Store(#[from] StoreError),
    #[error("fetch failure: {0}")]
    Fetch(anyhow::Error),
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub struct CacheGateway {
    store: Arc<dyn CacheStore>,
    ttl: TtlTable,
    clock: Arc<dyn Clock>,
}

impl CacheGateway {
    pub fn new(store: Arc<dyn CacheStore>) -> Self {
        CacheGateway {
            store,
            ttl: TtlTable::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_ttl(mut self, ttl: TtlTable) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Returns the cached payload for `key`, calling `fetch` only on a miss.
    ///
    /// `fetch` returning `None` (or JSON null) is passed through uncached.
    pub async fn get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> Option<Value>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<Value>>>,
    {
        match self.try_get_or_fetch(key, fetch).await {
            Ok(value) => value,
            Err(e) => {
                error!("Cache read-through failed for {}: {}", key, e);
                self.stale_fallback(key).await
            }
        }
    }

    /// Typed wrapper over [`CacheGateway::get_or_fetch`].
    pub async fn get_or_fetch_as<T, F, Fut>(&self, key: &CacheKey, fetch: F) -> Option<T>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<T>>>,
    {
        let value = self
            .get_or_fetch(key, move || async move {
                match fetch().await? {
                    Some(data) => Ok(Some(serde_json::to_value(data)?)),
                    None => Ok(None),
                }
            })
            .await?;

        match serde_json::from_value(value) {
            Ok(data) => Some(data),
            Err(e) => {
                error!("Cached payload for {} does not match the expected shape: {}", key, e);
                None
            }
        }
    }

    async fn try_get_or_fetch<F, Fut>(&self, key: &CacheKey, fetch: F) -> Result<Option<Value>, CacheError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<Option<Value>>>,
    {
        if let Some(entry) = self.store.find_live(key, self.clock.now()).await? {
            debug!("Cache hit for {} (expires {})", key, entry.expires_at);
            return Ok(Some(entry.data));
        }

        info!("Cache miss for {}, fetching", key);
        let data = match fetch().await.map_err(CacheError::Fetch)? {
            None | Some(Value::Null) => {
                info!("Fetch for {} returned no data, not caching", key);
                return Ok(None);
            }
            Some(data) => data,
        };

        let fetched_at = self.clock.now();
        let entry = CacheEntry {
            key: key.clone(),
            data,
            fetched_at,
            expires_at: fetched_at + self.ttl.ttl(key.source, &key.metric_type),
        };

        // A failed write still leaves us holding fresh data
        if let Err(e) = self.store.upsert(&entry).await {
            error!("Failed to store cache entry for {}: {}", key, e);
        }

        Ok(Some(entry.data))
    }

    async fn stale_fallback(&self, key: &CacheKey) -> Option<Value> {
        match self.store.find_latest(key).await {
            Ok(Some(entry)) => {
                warn!("Serving stale data for {} fetched at {}", key, entry.fetched_at);
                Some(entry.data)
            }
            Ok(None) => {
                warn!("No stale data available for {}", key);
                None
            }
            Err(e) => {
                error!("Stale lookup failed for {}: {}", key, e);
                None
            }
        }
    }

    pub async fn clear_site(&self, site_id: &str) -> Result<u64, CacheError> {
        let deleted = self.store.delete(&ClearFilter::Site(site_id.to_string())).await?;
        info!("Cleared {} cache entries for site {}", deleted, site_id);
        Ok(deleted)
    }

    pub async fn clear_source(&self, source: DataSource) -> Result<u64, CacheError> {
        let deleted = self.store.delete(&ClearFilter::Source(source)).await?;
        info!("Cleared {} cache entries for source {}", deleted, source);
        Ok(deleted)
    }

    pub async fn clear_expired(&self) -> Result<u64, CacheError> {
        let deleted = self
            .store
            .delete(&ClearFilter::ExpiredBefore(self.clock.now()))
            .await?;
        info!("Cleared {} expired cache entries", deleted);
        Ok(deleted)
    }
}
