// src/bin/purge_cache.rs
use dashboard_walkthrough::config::Config;
use dashboard_walkthrough::models::DataSource;
use dashboard_walkthrough::services::cache::CacheGateway;
use dashboard_walkthrough::services::supabase::SupabaseStore;
use dotenv::dotenv;
use log::info;
use std::env;
use std::sync::Arc;

/// One-off cache maintenance against the configured Supabase project.
///
///   purge_cache                  remove expired rows
///   purge_cache site <site_id>   remove every row for a site
///   purge_cache source <source>  remove every row for a data source
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env()?;
    let supabase = config
        .supabase
        .ok_or_else(|| anyhow::anyhow!("SUPABASE_URL and SUPABASE_SERVICE_KEY must be set"))?;
    let gateway = CacheGateway::new(Arc::new(SupabaseStore::new(supabase)));

    let args: Vec<String> = env::args().skip(1).collect();
    let deleted = match args.as_slice() {
        [] => gateway.clear_expired().await?,
        [kind, site_id] if kind == "site" => gateway.clear_site(site_id).await?,
        [kind, source] if kind == "source" => {
            let source: DataSource = source.parse().map_err(anyhow::Error::msg)?;
            gateway.clear_source(source).await?
        }
        _ => anyhow::bail!("usage: purge_cache [site <site_id> | source <data_source>]"),
    };

    info!("Purge complete");
    println!("Deleted {} cache rows", deleted);
    Ok(())
}
