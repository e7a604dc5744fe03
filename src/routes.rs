// src/routes.rs
use crate::handlers::{cache, quote::post_quote, sites::get_site, AppState};
use log::info;
use std::collections::HashMap;

use std::convert::Infallible;
use warp::reject::Rejection;
use warp::{Filter, Reply};
use crate::handlers::error::ApiError;

// Quote bodies are small; anything larger is not a walk-through form
const MAX_BODY_BYTES: u64 = 64 * 1024;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let code;
    let message;

    if err.is_not_found() {
        code = warp::http::StatusCode::NOT_FOUND;
        message = "Not Found".to_string();
    } else if let Some(api_error) = err.find::<ApiError>() {
        code = api_error.status;
        message = api_error.message.clone();
    } else if let Some(body_error) = err.find::<warp::filters::body::BodyDeserializeError>() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = body_error.to_string();
    } else if err.find::<warp::reject::PayloadTooLarge>().is_some() {
        code = warp::http::StatusCode::PAYLOAD_TOO_LARGE;
        message = "Payload Too Large".to_string();
    } else if err.find::<warp::reject::LengthRequired>().is_some() {
        code = warp::http::StatusCode::LENGTH_REQUIRED;
        message = "Length Required".to_string();
    } else if err.find::<warp::reject::UnsupportedMediaType>().is_some() {
        code = warp::http::StatusCode::UNSUPPORTED_MEDIA_TYPE;
        message = "Unsupported Media Type".to_string();
    } else if err.find::<warp::reject::InvalidQuery>().is_some() {
        code = warp::http::StatusCode::BAD_REQUEST;
        message = "Invalid query string".to_string();
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        code = warp::http::StatusCode::METHOD_NOT_ALLOWED;
        message = "Method Not Allowed".to_string();
    } else {
        code = warp::http::StatusCode::INTERNAL_SERVER_ERROR;
        message = "Internal Server Error".to_string();
    }

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: AppState) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let quote_route = warp::path!("api" / "v1" / "quote")
        .and(warp::post())
        .and(warp::body::content_length_limit(MAX_BODY_BYTES))
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(post_quote);

    let site_route = warp::path!("api" / "v1" / "sites" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(get_site);

    let date_range_route = warp::path!("api" / "v1" / "date-range" / String)
        .and(warp::get())
        .and(warp::query::<HashMap<String, String>>())
        .and(state_filter.clone())
        .and_then(cache::resolve_date_range);

    let clear_site_route = warp::path!("api" / "v1" / "cache" / "site" / String)
        .and(warp::delete())
        .and(state_filter.clone())
        .and_then(cache::clear_site);

    let clear_source_route = warp::path!("api" / "v1" / "cache" / "source" / String)
        .and(warp::delete())
        .and(state_filter.clone())
        .and_then(cache::clear_source);

    let clear_expired_route = warp::path!("api" / "v1" / "cache" / "expired")
        .and(warp::delete())
        .and(state_filter.clone())
        .and_then(cache::clear_expired);

    info!("All routes configured successfully.");

    quote_route
        .or(site_route)
        .or(date_range_route)
        .or(clear_site_route)
        .or(clear_source_route)
        .or(clear_expired_route)
        .recover(handle_rejection)
}
