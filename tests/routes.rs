use dashboard_walkthrough::handlers::AppState;
use dashboard_walkthrough::models::{CacheKey, DataSource, Site};
use dashboard_walkthrough::routes::routes;
use dashboard_walkthrough::services::cache::CacheGateway;
use dashboard_walkthrough::services::date_range::DEFAULT_REPORTING_TZ;
use dashboard_walkthrough::services::memory_store::MemoryStore;
use dashboard_walkthrough::services::pricing::PricingConfig;
use serde_json::{json, Value};
use std::sync::Arc;

fn state_with(store: Arc<MemoryStore>) -> AppState {
    AppState {
        gateway: Arc::new(CacheGateway::new(store.clone())),
        sites: store,
        pricing: Arc::new(PricingConfig::default()),
        reporting_tz: DEFAULT_REPORTING_TZ,
    }
}

fn acme() -> Site {
    serde_json::from_value(json!({
        "id": "6f1c2a9e-0000-4000-8000-000000000001",
        "slug": "acme-movers",
        "name": "Acme Movers",
        "ga4_property_id": "properties/123"
    }))
    .unwrap()
}

#[tokio::test]
async fn quote_endpoint_returns_items_and_warning() {
    let api = routes(state_with(Arc::new(MemoryStore::new())));

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/quote")
        .json(&json!({
            "request": {
                "junkRemoval": "medium",
                "fixedBudget": true,
                "fixedBudgetAmount": "350"
            }
        }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["total"], 405.0);
    assert_eq!(body["budget"]["insufficient"], true);
    assert!(body["budgetWarning"].as_str().unwrap().contains("$478.50"));
}

#[tokio::test]
async fn malformed_quote_body_is_bad_request() {
    let api = routes(state_with(Arc::new(MemoryStore::new())));

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/quote")
        .header("content-type", "application/json")
        .body("{not json")
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn site_lookup_by_slug_and_missing() {
    let api = routes(state_with(Arc::new(MemoryStore::with_sites(vec![acme()]))));

    let resp = warp::test::request()
        .path("/api/v1/sites/acme-movers")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["timezone"], "America/Chicago");

    let resp = warp::test::request()
        .path("/api/v1/sites/nobody")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 404);
}

#[tokio::test]
async fn clear_source_validates_name() {
    let store = Arc::new(MemoryStore::new());
    let state = state_with(store.clone());
    let key = CacheKey::new("acme", DataSource::MetaAds, "campaigns", "last_7_days");
    state
        .gateway
        .get_or_fetch(&key, || async { Ok(Some(json!({ "spend": 12.5 }))) })
        .await;
    let api = routes(state);

    let resp = warp::test::request()
        .method("DELETE")
        .path("/api/v1/cache/source/tiktok")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 400);

    let resp = warp::test::request()
        .method("DELETE")
        .path("/api/v1/cache/source/meta_ads")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["deleted"], 1);
    assert!(store.is_empty().await);
}

#[tokio::test]
async fn custom_date_range_resolves() {
    let api = routes(state_with(Arc::new(MemoryStore::new())));

    let resp = warp::test::request()
        .path("/api/v1/date-range/custom?start=2026-01-01&end=2026-01-31&tz=America/New_York")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 200);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["start_date"], "2026-01-01");
    assert_eq!(body["label"], "custom");

    let resp = warp::test::request()
        .path("/api/v1/date-range/custom")
        .reply(&api)
        .await;
    assert_eq!(resp.status(), 400);
}

#[tokio::test]
async fn oversized_quote_body_is_rejected_as_too_large() {
    let api = routes(state_with(Arc::new(MemoryStore::new())));
    let padding = "x".repeat(70 * 1024);

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/quote")
        .json(&json!({ "request": {}, "notes": padding }))
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 413);
    let body: Value = serde_json::from_slice(resp.body()).unwrap();
    assert_eq!(body["error"], "Payload Too Large");
}

#[tokio::test]
async fn quote_body_must_be_json() {
    let api = routes(state_with(Arc::new(MemoryStore::new())));

    let resp = warp::test::request()
        .method("POST")
        .path("/api/v1/quote")
        .header("content-type", "text/plain")
        .body("junkRemoval=medium")
        .reply(&api)
        .await;

    assert_eq!(resp.status(), 415);
}
