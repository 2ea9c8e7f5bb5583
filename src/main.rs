use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use marketplace_search::api::create_router;
use marketplace_search::cache::MemoryCache;
use marketplace_search::catalog::CatalogSettings;
use marketplace_search::config::CONFIG;
use marketplace_search::data_models::SearchResponse;
use marketplace_search::db::{Database, ProductRepo};
use marketplace_search::repository::ResultRepository;
use marketplace_search::search_engine::ElasticsearchClient;
use marketplace_search::service::{SearchService, SearchServiceOptions};

const CACHE_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Parser, Debug)]
#[command(about = "Product search API with Elasticsearch and MongoDB fallback")]
struct Args {
    /// Address to listen on; overrides BIND_ADDR.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing subscriber (handles both tracing and log crate)
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(true)
        .init();

    let args = Args::parse();

    let db = Database::init_global().await?;
    let products = ProductRepo::new(db);
    products.ensure_indexes().await?;

    let engine = ElasticsearchClient::from_config()?;
    let repository = Arc::new(ResultRepository::new(Arc::new(engine), Arc::new(products)));

    let cache = Arc::new(MemoryCache::<SearchResponse>::new());
    let sweeper = Arc::clone(&cache);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(CACHE_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sweeper.purge_expired();
            if purged > 0 {
                log::debug!("Purged {purged} expired search responses");
            }
        }
    });

    let service = Arc::new(SearchService::new(
        repository,
        cache,
        Arc::new(CatalogSettings::default()),
        SearchServiceOptions {
            cache_ttl: CONFIG.search_cache_ttl,
            search_path: CONFIG.search_path.clone(),
        },
    ));

    let bind = args.bind.unwrap_or_else(|| CONFIG.bind_addr.clone());
    let listener = tokio::net::TcpListener::bind(&bind).await?;
    log::info!("Listening on {bind}");

    axum::serve(listener, create_router(service)).await?;
    Ok(())
}
