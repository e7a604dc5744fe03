// src/services/ttl.rs
use chrono::Duration;
use std::collections::HashMap;

use crate::models::DataSource;

/// Fallback for any (source, metric) pair not listed below.
pub const DEFAULT_TTL_HOURS: i64 = 4;

/// Per-(source, metric) cache lifetimes.
#[derive(Debug, Clone)]
pub struct TtlTable {
    entries: HashMap<(DataSource, String), Duration>,
    default: Duration,
}

impl Default for TtlTable {
    fn default() -> Self {
        let mut table = TtlTable::empty();

        table.set(DataSource::Ga4, "realtime", Duration::minutes(5));
        table.set(DataSource::Ga4, "overview", Duration::hours(1));
        table.set(DataSource::Ga4, "traffic_sources", Duration::hours(1));
        table.set(DataSource::Ga4, "pages", Duration::hours(2));

        table.set(DataSource::GoogleAds, "overview", Duration::hours(2));
        table.set(DataSource::GoogleAds, "campaigns", Duration::hours(2));

        table.set(DataSource::MetaAds, "overview", Duration::hours(2));
        table.set(DataSource::MetaAds, "campaigns", Duration::hours(2));

        // Search Console data lags by days, no point refreshing often
        table.set(DataSource::SearchConsole, "overview", Duration::hours(12));
        table.set(DataSource::SearchConsole, "queries", Duration::hours(12));
        table.set(DataSource::SearchConsole, "pages", Duration::hours(12));

        table
    }
}

impl TtlTable {
    pub fn empty() -> Self {
        TtlTable {
            entries: HashMap::new(),
            default: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    pub fn set(&mut self, source: DataSource, metric_type: &str, ttl: Duration) {
        self.entries.insert((source, metric_type.to_string()), ttl);
    }

    pub fn ttl(&self, source: DataSource, metric_type: &str) -> Duration {
        self.entries
            .get(&(source, metric_type.to_string()))
            .copied()
            .unwrap_or(self.default)
    }
}
