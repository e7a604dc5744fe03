// src/services/supabase.rs
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info};
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::{CacheEntry, CacheKey, ClearFilter, DataSource, Site};
use super::store::{CacheStore, SiteRepository, StoreError};

const CACHE_TABLE: &str = "analytics_cache";
const SITES_TABLE: &str = "sites";
const CACHE_CONFLICT_COLUMNS: &str = "site_id,data_source,metric_type,date_range,start_date,end_date";
// Absent dates are stored as '' so they take part in the unique key
const NO_DATE: &str = "";

#[derive(Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub service_key: String,
}

/// One row of `analytics_cache` as PostgREST returns it. See
/// `sql/analytics_cache.sql` for the table and its conflict key.
#[derive(Debug, Serialize, Deserialize)]
struct CacheRow {
    site_id: String,
    data_source: DataSource,
    metric_type: String,
    date_range: String,
    #[serde(default)]
    start_date: Option<String>,
    #[serde(default)]
    end_date: Option<String>,
    data: Value,
    fetched_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
}

impl From<CacheRow> for CacheEntry {
    fn from(row: CacheRow) -> Self {
        CacheEntry {
            key: CacheKey {
                site_id: row.site_id,
                source: row.data_source,
                metric_type: row.metric_type,
                date_range: row.date_range,
                start_date: from_column(row.start_date),
                end_date: from_column(row.end_date),
            },
            data: row.data,
            fetched_at: row.fetched_at,
            expires_at: row.expires_at,
        }
    }
}

impl From<&CacheEntry> for CacheRow {
    fn from(entry: &CacheEntry) -> Self {
        CacheRow {
            site_id: entry.key.site_id.clone(),
            data_source: entry.key.source,
            metric_type: entry.key.metric_type.clone(),
            date_range: entry.key.date_range.clone(),
            start_date: Some(to_column(&entry.key.start_date).to_string()),
            end_date: Some(to_column(&entry.key.end_date).to_string()),
            data: entry.data.clone(),
            fetched_at: entry.fetched_at,
            expires_at: entry.expires_at,
        }
    }
}

/// PostgREST-backed store for the cache table and the site registry.
pub struct SupabaseStore {
    config: SupabaseConfig,
    client: Client,
}

impl SupabaseStore {
    pub fn new(config: SupabaseConfig) -> Self {
        SupabaseStore {
            config,
            client: Client::new(),
        }
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{}", self.config.url.trim_end_matches('/'), table)
    }

    fn authed(&self, builder: RequestBuilder) -> RequestBuilder {
        builder
            .header("apikey", &self.config.service_key)
            .bearer_auth(&self.config.service_key)
    }

    async fn select_rows<T: for<'de> Deserialize<'de>>(
        &self,
        table: &str,
        params: &[(String, String)],
    ) -> Result<Vec<T>, StoreError> {
        let response = self
            .authed(self.client.get(self.table_url(table)))
            .query(params)
            .send()
            .await?;
        let response = check_status(response).await?;
        Ok(response.json::<Vec<T>>().await?)
    }

    async fn select_cache_row(&self, params: Vec<(String, String)>) -> Result<Option<CacheEntry>, StoreError> {
        let rows: Vec<CacheRow> = self.select_rows(CACHE_TABLE, &params).await?;
        Ok(rows.into_iter().next().map(CacheEntry::from))
    }
}

async fn check_status(response: Response) -> Result<Response, StoreError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(StoreError::Status {
        status: status.as_u16(),
        body,
    })
}

fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn to_column(date: &Option<String>) -> &str {
    date.as_deref().unwrap_or(NO_DATE)
}

fn from_column(date: Option<String>) -> Option<String> {
    date.filter(|d| d != NO_DATE)
}

/// PostgREST filters matching exactly one composite key.
fn key_filters(key: &CacheKey) -> Vec<(String, String)> {
    vec![
        ("site_id".to_string(), format!("eq.{}", key.site_id)),
        ("data_source".to_string(), format!("eq.{}", key.source)),
        ("metric_type".to_string(), format!("eq.{}", key.metric_type)),
        ("date_range".to_string(), format!("eq.{}", key.date_range)),
        ("start_date".to_string(), format!("eq.{}", to_column(&key.start_date))),
        ("end_date".to_string(), format!("eq.{}", to_column(&key.end_date))),
    ]
}

fn clear_filter_params(filter: &ClearFilter) -> (String, String) {
    match filter {
        ClearFilter::Site(site_id) => ("site_id".to_string(), format!("eq.{}", site_id)),
        ClearFilter::Source(source) => ("data_source".to_string(), format!("eq.{}", source)),
        ClearFilter::ExpiredBefore(now) => ("expires_at".to_string(), format!("lte.{}", timestamp(*now))),
    }
}

#[async_trait]
impl CacheStore for SupabaseStore {
    async fn find_live(&self, key: &CacheKey, now: DateTime<Utc>) -> Result<Option<CacheEntry>, StoreError> {
        let mut params = key_filters(key);
        params.push(("expires_at".to_string(), format!("gt.{}", timestamp(now))));
        params.push(("select".to_string(), "*".to_string()));
        params.push(("order".to_string(), "fetched_at.desc".to_string()));
        params.push(("limit".to_string(), "1".to_string()));
        self.select_cache_row(params).await
    }

    async fn find_latest(&self, key: &CacheKey) -> Result<Option<CacheEntry>, StoreError> {
        let mut params = key_filters(key);
        params.push(("select".to_string(), "*".to_string()));
        params.push(("order".to_string(), "fetched_at.desc".to_string()));
        params.push(("limit".to_string(), "1".to_string()));
        self.select_cache_row(params).await
    }

    async fn upsert(&self, entry: &CacheEntry) -> Result<(), StoreError> {
        debug!("Upserting cache row {}", entry.key);
        let response = self
            .authed(self.client.post(self.table_url(CACHE_TABLE)))
            .query(&[("on_conflict", CACHE_CONFLICT_COLUMNS)])
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&CacheRow::from(entry))
            .send()
            .await?;
        check_status(response).await?;
        Ok(())
    }

    async fn delete(&self, filter: &ClearFilter) -> Result<u64, StoreError> {
        let response = self
            .authed(self.client.delete(self.table_url(CACHE_TABLE)))
            .query(&[clear_filter_params(filter)])
            .query(&[("select", "site_id")])
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let deleted: Vec<Value> = check_status(response).await?.json().await?;
        info!("Deleted {} rows from {} ({:?})", deleted.len(), CACHE_TABLE, filter);
        Ok(deleted.len() as u64)
    }
}

#[async_trait]
impl SiteRepository for SupabaseStore {
    async fn find_site_by_id(&self, id: &str) -> Result<Option<Site>, StoreError> {
        let params = vec![
            ("id".to_string(), format!("eq.{}", id)),
            ("select".to_string(), "*".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        match self.select_rows::<Site>(SITES_TABLE, &params).await {
            Ok(rows) => Ok(rows.into_iter().next()),
            // Postgres rejects a slug compared against a uuid column
            Err(StoreError::Status { status, .. }) if status == StatusCode::BAD_REQUEST.as_u16() => {
                debug!("{} is not a valid site id, falling back to slug", id);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn find_site_by_slug(&self, slug: &str) -> Result<Option<Site>, StoreError> {
        let params = vec![
            ("slug".to_string(), format!("eq.{}", slug)),
            ("select".to_string(), "*".to_string()),
            ("limit".to_string(), "1".to_string()),
        ];
        let rows: Vec<Site> = self.select_rows(SITES_TABLE, &params).await?;
        Ok(rows.into_iter().next())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn absent_dates_filter_on_empty_string() {
        let key = CacheKey::new("acme", DataSource::MetaAds, "campaigns", "last_7_days");
        let filters = key_filters(&key);
        assert!(filters.contains(&("data_source".to_string(), "eq.meta_ads".to_string())));
        assert!(filters.contains(&("start_date".to_string(), "eq.".to_string())));
        assert!(filters.contains(&("end_date".to_string(), "eq.".to_string())));
        assert!(!filters.iter().any(|(_, v)| v == "is.null"));

        let dated = key.with_dates("2026-01-01", "2026-01-07");
        assert!(key_filters(&dated).contains(&("start_date".to_string(), "eq.2026-01-01".to_string())));
    }

    #[test]
    fn expired_filter_uses_utc_timestamp() {
        let now = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        assert_eq!(
            clear_filter_params(&ClearFilter::ExpiredBefore(now)),
            ("expires_at".to_string(), "lte.2026-05-01T12:00:00.000Z".to_string())
        );
    }

    #[test]
    fn rows_decode_into_entries() {
        let row: CacheRow = serde_json::from_value(json!({
            "site_id": "acme",
            "data_source": "search_console",
            "metric_type": "queries",
            "date_range": "last_28_days",
            "start_date": null,
            "end_date": null,
            "data": { "rows": [] },
            "fetched_at": "2026-05-01T12:00:00+00:00",
            "expires_at": "2026-05-02T00:00:00+00:00"
        }))
        .unwrap();
        let entry = CacheEntry::from(row);
        assert_eq!(entry.key.source, DataSource::SearchConsole);
        assert_eq!(entry.key.start_date, None);
        assert_eq!(entry.expires_at - entry.fetched_at, chrono::Duration::hours(12));
    }

    #[test]
    fn undated_keys_write_the_same_conflict_columns_every_time() {
        let at = Utc.with_ymd_and_hms(2026, 5, 1, 12, 0, 0).unwrap();
        let key = CacheKey::new("acme", DataSource::Ga4, "overview", "last_30_days");
        let entry = CacheEntry {
            key: key.clone(),
            data: json!({ "sessions": 10 }),
            fetched_at: at,
            expires_at: at + chrono::Duration::hours(1),
        };

        let row = serde_json::to_value(CacheRow::from(&entry)).unwrap();
        assert_eq!(row["start_date"], "");
        assert_eq!(row["end_date"], "");

        let stored: CacheRow = serde_json::from_value(row).unwrap();
        assert_eq!(CacheEntry::from(stored).key, key);

        let dated = CacheEntry {
            key: key.with_dates("2026-01-01", "2026-01-31"),
            ..entry
        };
        let row = serde_json::to_value(CacheRow::from(&dated)).unwrap();
        assert_eq!(row["start_date"], "2026-01-01");
    }
}
