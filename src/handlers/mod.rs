// src/handlers/mod.rs

pub mod cache;
pub mod error;
pub mod quote;
pub mod sites;

use std::sync::Arc;

use chrono_tz::Tz;

use crate::services::cache::CacheGateway;
use crate::services::pricing::PricingConfig;
use crate::services::store::SiteRepository;

/// Shared handles passed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub gateway: Arc<CacheGateway>,
    pub sites: Arc<dyn SiteRepository>,
    pub pricing: Arc<PricingConfig>,
    pub reporting_tz: Tz,
}
