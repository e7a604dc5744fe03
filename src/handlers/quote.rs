// src/handlers/quote.rs
use log::info;
use serde::{Deserialize, Serialize};
use warp::reply::Json;
use warp::Rejection;

use super::AppState;
use crate::services::pricing::{calculate_quote, Quote};
use crate::services::quote_request::{DistanceData, MoveQuoteRequest};

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct QuoteBody {
    pub request: MoveQuoteRequest,
    pub distance: Option<DistanceData>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteResponse {
    #[serde(flatten)]
    pub quote: Quote,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_warning: Option<String>,
}

pub async fn post_quote(body: QuoteBody, state: AppState) -> Result<Json, Rejection> {
    let quote = calculate_quote(&body.request, body.distance.as_ref(), &state.pricing);
    info!(
        "Calculated {:?} quote: {} items, total {:.2}",
        body.request.service_type,
        quote.items.len(),
        quote.total
    );

    let budget_warning = quote.budget_warning();
    Ok(warp::reply::json(&QuoteResponse { quote, budget_warning }))
}
