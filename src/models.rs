// src/models.rs
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};
use std::fmt;
use std::str::FromStr;

/// Analytics providers the dashboard pulls from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataSource {
    Ga4,
    GoogleAds,
    MetaAds,
    SearchConsole,
}

impl DataSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            DataSource::Ga4 => "ga4",
            DataSource::GoogleAds => "google_ads",
            DataSource::MetaAds => "meta_ads",
            DataSource::SearchConsole => "search_console",
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ga4" => Ok(DataSource::Ga4),
            "google_ads" => Ok(DataSource::GoogleAds),
            "meta_ads" => Ok(DataSource::MetaAds),
            "search_console" => Ok(DataSource::SearchConsole),
            other => Err(format!("unknown data source: {}", other)),
        }
    }
}

/// Composite key of a cached analytics payload.
///
/// Two keys that differ only in their explicit dates are different entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CacheKey {
    pub site_id: String,
    pub source: DataSource,
    pub metric_type: String,
    pub date_range: String,
    pub start_date: Option<String>, // YYYY-MM-DD
    pub end_date: Option<String>,
}

impl CacheKey {
    pub fn new(
        site_id: impl Into<String>,
        source: DataSource,
        metric_type: impl Into<String>,
        date_range: impl Into<String>,
    ) -> Self {
        CacheKey {
            site_id: site_id.into(),
            source,
            metric_type: metric_type.into(),
            date_range: date_range.into(),
            start_date: None,
            end_date: None,
        }
    }

    pub fn with_dates(mut self, start_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        self.start_date = Some(start_date.into());
        self.end_date = Some(end_date.into());
        self
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.site_id, self.source, self.metric_type, self.date_range
        )?;
        if let (Some(start), Some(end)) = (&self.start_date, &self.end_date) {
            write!(f, "[{}..{}]", start, end)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub key: CacheKey,
    pub data: serde_json::Value,
    pub fetched_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl CacheEntry {
    pub fn is_live(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// Administrative delete filters.
#[derive(Debug, Clone, PartialEq)]
pub enum ClearFilter {
    Site(String),
    Source(DataSource),
    ExpiredBefore(DateTime<Utc>),
}

/// A client website tracked by the dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Site {
    pub id: String,
    pub slug: String,
    pub name: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub ga4_property_id: Option<String>,
    #[serde(default)]
    pub google_ads_customer_id: Option<String>,
    #[serde(default)]
    pub meta_ad_account_id: Option<String>,
    #[serde(default)]
    pub search_console_url: Option<String>,
}

fn default_timezone() -> String {
    "America/Chicago".to_string()
}
