use dashboard_walkthrough::config::Config;
use dashboard_walkthrough::handlers::AppState;
use dashboard_walkthrough::routes;
use dashboard_walkthrough::services::cache::CacheGateway;
use dashboard_walkthrough::services::memory_store::MemoryStore;
use dashboard_walkthrough::services::pricing::PricingConfig;
use dashboard_walkthrough::services::scheduler::start_cache_purge;
use dashboard_walkthrough::services::store::{CacheStore, SiteRepository};
use dashboard_walkthrough::services::supabase::SupabaseStore;
use dotenv::dotenv;
use log::{info, warn};
use std::net::SocketAddr;
use std::sync::Arc;
use warp::Filter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = Config::from_env()?;
    info!("Using PORT: {}", config.port);

    let (store, sites): (Arc<dyn CacheStore>, Arc<dyn SiteRepository>) = match &config.supabase {
        Some(supabase) => {
            let store = Arc::new(SupabaseStore::new(supabase.clone()));
            let cache: Arc<dyn CacheStore> = store.clone();
            let sites: Arc<dyn SiteRepository> = store;
            (cache, sites)
        }
        None => {
            let store = Arc::new(MemoryStore::new());
            let cache: Arc<dyn CacheStore> = store.clone();
            let sites: Arc<dyn SiteRepository> = store;
            (cache, sites)
        }
    };

    let gateway = Arc::new(CacheGateway::new(store));

    // Held for the lifetime of the server
    let _purge = match start_cache_purge(gateway.clone(), &config.purge_cron).await {
        Ok(scheduler) => Some(scheduler),
        Err(e) => {
            warn!("Cache purge job not scheduled: {}", e);
            None
        }
    };

    let state = AppState {
        gateway,
        sites,
        pricing: Arc::new(PricingConfig::default()),
        reporting_tz: config.reporting_tz,
    };

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST", "DELETE"]);

    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api).run(addr).await;
    Ok(())
}
