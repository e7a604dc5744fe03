use chrono::{DateTime, Duration, TimeZone, Utc};
use dashboard_walkthrough::models::{CacheKey, DataSource};
use dashboard_walkthrough::services::cache::{CacheGateway, Clock};
use dashboard_walkthrough::services::memory_store::MemoryStore;
use dashboard_walkthrough::services::store::CacheStore;
use dashboard_walkthrough::services::ttl::TtlTable;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct ManualClock(Mutex<DateTime<Utc>>);

impl ManualClock {
    fn advance(&self, by: Duration) {
        let mut now = self.0.lock().unwrap();
        *now = *now + by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.0.lock().unwrap()
    }
}

fn setup() -> (CacheGateway, Arc<ManualClock>, Arc<MemoryStore>) {
    let clock = Arc::new(ManualClock(Mutex::new(
        Utc.with_ymd_and_hms(2026, 4, 1, 8, 0, 0).unwrap(),
    )));
    let store = Arc::new(MemoryStore::new());
    let gateway = CacheGateway::new(store.clone()).with_clock(clock.clone());
    (gateway, clock, store)
}

fn realtime_key() -> CacheKey {
    CacheKey::new("acme", DataSource::Ga4, "realtime", "today")
}

#[tokio::test]
async fn repeated_reads_fetch_once() {
    let (gateway, _clock, _store) = setup();
    let counter = AtomicUsize::new(0);
    let calls = &counter;
    let fetch = move || async move {
        calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(json!({ "activeUsers": 17 })))
    };

    let first = gateway.get_or_fetch(&realtime_key(), fetch).await;
    let second = gateway.get_or_fetch(&realtime_key(), fetch).await;

    assert_eq!(first, Some(json!({ "activeUsers": 17 })));
    assert_eq!(first, second);
    assert_eq!(counter.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn entry_expires_exactly_at_ttl() {
    let (gateway, clock, _store) = setup();
    let counter = AtomicUsize::new(0);
    let calls = &counter;
    let fetch = move || async move {
        let n = calls.fetch_add(1, Ordering::SeqCst);
        Ok(Some(json!(n)))
    };

    gateway.get_or_fetch(&realtime_key(), fetch).await;

    // realtime reports live for five minutes
    clock.advance(Duration::minutes(5) - Duration::milliseconds(1));
    assert_eq!(gateway.get_or_fetch(&realtime_key(), fetch).await, Some(json!(0)));

    clock.advance(Duration::milliseconds(2));
    assert_eq!(gateway.get_or_fetch(&realtime_key(), fetch).await, Some(json!(1)));
    assert_eq!(counter.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn unlisted_metrics_live_four_hours() {
    let (gateway, clock, store) = setup();
    let key = CacheKey::new("acme", DataSource::MetaAds, "creatives", "last_7_days");
    gateway.get_or_fetch(&key, || async { Ok(Some(json!([]))) }).await;

    let entry = store.find_latest(&key).await.unwrap().unwrap();
    assert_eq!(entry.expires_at - entry.fetched_at, Duration::hours(4));
    assert_eq!(entry.fetched_at, clock.now());
}

#[tokio::test]
async fn failed_refresh_serves_stale_value() {
    let (gateway, clock, _store) = setup();
    let key = realtime_key();

    gateway.get_or_fetch(&key, || async { Ok(Some(json!({ "activeUsers": 3 }))) }).await;
    clock.advance(Duration::hours(1));

    let value = gateway
        .get_or_fetch(&key, || async { Err(anyhow::anyhow!("GA4 returned 503")) })
        .await;
    assert_eq!(value, Some(json!({ "activeUsers": 3 })));
}

#[tokio::test]
async fn failed_fetch_without_history_is_none() {
    let (gateway, _clock, store) = setup();
    let value = gateway
        .get_or_fetch(&realtime_key(), || async { Err(anyhow::anyhow!("token expired")) })
        .await;
    assert!(value.is_none());
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn explicit_dates_are_cached_separately() {
    let (gateway, _clock, store) = setup();
    let base = CacheKey::new("acme", DataSource::SearchConsole, "queries", "custom");
    let january = base.clone().with_dates("2026-01-01", "2026-01-31");
    let february = base.with_dates("2026-02-01", "2026-02-28");

    gateway.get_or_fetch(&january, || async { Ok(Some(json!("jan"))) }).await;
    let feb = gateway.get_or_fetch(&february, || async { Ok(Some(json!("feb"))) }).await;

    assert_eq!(feb, Some(json!("feb")));
    assert_eq!(store.len().await, 2);
}

#[tokio::test]
async fn concurrent_misses_both_fetch_and_last_write_wins() {
    let (gateway, _clock, store) = setup();
    let key = realtime_key();

    let (a, b) = tokio::join!(
        gateway.get_or_fetch(&key, || async {
            tokio::task::yield_now().await;
            Ok(Some(json!("a")))
        }),
        gateway.get_or_fetch(&key, || async { Ok(Some(json!("b"))) }),
    );

    assert_eq!(a, Some(json!("a")));
    assert_eq!(b, Some(json!("b")));
    assert_eq!(store.len().await, 1);
}

#[tokio::test]
async fn custom_ttl_table_is_respected() {
    let (_, clock, store) = setup();
    let mut ttl = TtlTable::empty();
    ttl.set(DataSource::GoogleAds, "campaigns", Duration::minutes(1));
    let gateway = CacheGateway::new(store).with_clock(clock.clone()).with_ttl(ttl);
    let key = CacheKey::new("acme", DataSource::GoogleAds, "campaigns", "last_30_days");

    gateway.get_or_fetch(&key, || async { Ok(Some(json!(1))) }).await;
    clock.advance(Duration::minutes(2));
    let value: Option<Value> = gateway.get_or_fetch(&key, || async { Ok(Some(json!(2))) }).await;
    assert_eq!(value, Some(json!(2)));
}

#[tokio::test]
async fn admin_clears() {
    let (gateway, clock, store) = setup();
    let sites = ["acme", "globex"];
    for site in sites {
        for source in [DataSource::Ga4, DataSource::MetaAds] {
            let key = CacheKey::new(site, source, "overview", "last_30_days");
            gateway.get_or_fetch(&key, move || async move { Ok(Some(json!(site))) }).await;
        }
    }
    assert_eq!(store.len().await, 4);

    assert_eq!(gateway.clear_source(DataSource::MetaAds).await.unwrap(), 2);
    assert_eq!(gateway.clear_site("globex").await.unwrap(), 1);

    clock.advance(Duration::days(1));
    assert_eq!(gateway.clear_expired().await.unwrap(), 1);
    assert!(store.is_empty().await);
}
