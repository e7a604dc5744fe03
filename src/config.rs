// src/config.rs
use chrono_tz::Tz;
use log::{info, warn};
use std::env;
use thiserror::Error;

use crate::services::date_range::DEFAULT_REPORTING_TZ;
use crate::services::supabase::SupabaseConfig;

pub const DEFAULT_PORT: u16 = 3030;
/// Top of every hour (seconds-first cron syntax).
pub const DEFAULT_PURGE_CRON: &str = "0 0 * * * *";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} has an invalid value {value:?}")]
    Invalid { name: &'static str, value: String },
}

#[derive(Clone)]
pub struct Config {
    pub port: u16,
    pub supabase: Option<SupabaseConfig>,
    pub purge_cron: String,
    pub reporting_tz: Tz,
}

impl Config {
    /// Reads settings from the environment (call `dotenv().ok()` first).
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match env::var("PORT") {
            Ok(value) => value.parse().map_err(|_| ConfigError::Invalid { name: "PORT", value })?,
            Err(_) => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let supabase = match (env::var("SUPABASE_URL"), env::var("SUPABASE_SERVICE_KEY")) {
            (Ok(url), Ok(service_key)) if !url.is_empty() && !service_key.is_empty() => {
                info!("Using Supabase store at {}", url);
                Some(SupabaseConfig { url, service_key })
            }
            _ => {
                warn!("SUPABASE_URL / SUPABASE_SERVICE_KEY not set, cache will be in-memory only");
                None
            }
        };

        let purge_cron = env::var("CACHE_PURGE_CRON").unwrap_or_else(|_| DEFAULT_PURGE_CRON.to_string());

        let reporting_tz = match env::var("REPORTING_TZ") {
            Ok(value) => value
                .parse::<Tz>()
                .map_err(|_| ConfigError::Invalid { name: "REPORTING_TZ", value })?,
            Err(_) => DEFAULT_REPORTING_TZ,
        };

        Ok(Config {
            port,
            supabase,
            purge_cron,
            reporting_tz,
        })
    }
}
