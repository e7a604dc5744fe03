// src/services/memory_store.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::debug;
use std::collections::HashMap;
use tokio::sync::RwLock;

use crate::models::{CacheEntry, CacheKey, ClearFilter, Site};
use super::store::{CacheStore, SiteRepository, StoreError};

/// Process-local store used when no Supabase project is configured.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<CacheKey, CacheEntry>>,
    sites: RwLock<Vec<Site>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sites(sites: Vec<Site>) -> Self {
        MemoryStore {
            entries: RwLock::new(HashMap::new()),
            sites: RwLock::new(sites),
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl CacheStore for MemoryStore {
    async fn find_live(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<Option<CacheEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.get(key).filter(|e| e.is_live(now)).cloned())
    }

    async fn find_latest(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        debug!("Upserting in-memory cache entry {}", entry.key);
        self.entries
            .write()
            .await
            .insert(entry.key.clone(), entry.clone());
        Ok(())
    }

    async fn delete(&self, filter: &ClearFilter) -> Result<u64, StoreError> {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, entry| match filter {
            ClearFilter::Site(site_id) => &key.site_id != site_id,
            ClearFilter::Source(source) => key.source != *source,
            ClearFilter::ExpiredBefore(now) => entry.expires_at > *now,
        });
        Ok((before - entries.len()) as u64)
    }
}

#[async_trait]
impl SiteRepository for MemoryStore {
    async fn find_site_by_id(&self, id: &str) -> Result<Option<Site>, StoreError> {
        Ok(self.sites.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn find_site_by_slug(&self, slug: &str) -> Result<Option<Site>, StoreError> {
        Ok(self.sites.read().await.iter().find(|s| s.slug == slug).cloned())
    }
}
