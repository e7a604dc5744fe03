// src/handlers/sites.rs
use log::{error, info};
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use super::AppState;

pub async fn get_site(id_or_slug: String, state: AppState) -> Result<Json, Rejection> {
    info!("Looking up site {}", id_or_slug);

    match state.sites.find_site_by_id_or_slug(&id_or_slug).await {
        Ok(Some(site)) => Ok(warp::reply::json(&site)),
        Ok(None) => Err(warp::reject::custom(ApiError::not_found(format!(
            "site {} not found",
            id_or_slug
        )))),
        Err(e) => {
            error!("Site lookup failed for {}: {}", id_or_slug, e);
            Err(warp::reject::custom(ApiError::store_error(e.to_string())))
        }
    }
}
