// src/handlers/cache.rs
use chrono_tz::Tz;
use log::{error, info};
use serde_json::json;
use std::collections::HashMap;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::AppState;
use crate::models::DataSource;
use crate::services::cache::CacheError;
use crate::services::date_range::{parse_date, today_in, DateRange};

fn deleted_reply(result: Result<u64, CacheError>) -> Result<Json, Rejection> {
    match result {
        Ok(deleted) => Ok(warp::reply::json(&json!({ "deleted": deleted }))),
        Err(e) => {
            error!("Cache clear failed: {}", e);
            Err(warp::reject::custom(ApiError::store_error(e.to_string())))
        }
    }
}

pub async fn clear_site(site_id: String, state: AppState) -> Result<Json, Rejection> {
    info!("Clearing cache for site {}", site_id);
    deleted_reply(state.gateway.clear_site(&site_id).await)
}

pub async fn clear_source(source: String, state: AppState) -> Result<Json, Rejection> {
    let source: DataSource = source
        .parse()
        .map_err(|e: String| warp::reject::custom(ApiError::bad_request(e)))?;
    info!("Clearing cache for source {}", source);
    deleted_reply(state.gateway.clear_source(source).await)
}

pub async fn clear_expired(state: AppState) -> Result<Json, Rejection> {
    info!("Clearing expired cache entries");
    deleted_reply(state.gateway.clear_expired().await)
}

/// Resolves a dashboard range label to the dates used in cache keys.
pub async fn resolve_date_range(
    label: String,
    params: HashMap<String, String>,
    state: AppState,
) -> Result<Json, Rejection> {
    let bad_request = |e: String| warp::reject::custom(ApiError::bad_request(e));

    let range: DateRange = label.parse().map_err(bad_request)?;
    let tz = match params.get("tz") {
        Some(name) => name
            .parse::<Tz>()
            .map_err(|_| bad_request(format!("unknown timezone: {}", name)))?,
        None => state.reporting_tz,
    };
    let custom = match (params.get("start"), params.get("end")) {
        (Some(start), Some(end)) => Some((
            parse_date(start).map_err(bad_request)?,
            parse_date(end).map_err(bad_request)?,
        )),
        _ => None,
    };

    let resolved = range.resolve(today_in(tz), custom).map_err(bad_request)?;
    Ok(warp::reply::json(&resolved))
}
