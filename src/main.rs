//! Storefront Catalog - product catalog service

use anyhow::Result;
use std::sync::Arc;
use storefront_catalog::api::{self, AppState};
use storefront_catalog::media::LocalMediaHost;
use storefront_catalog::service::{CatalogService, EventPublisher};
use storefront_catalog::store::{CatalogStore, MemoryStore, PgStore};
use storefront_catalog::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();
    let config = Config::from_env();

    let store: Arc<dyn CatalogStore> = match &config.database_url {
        Some(url) => {
            let pg = PgStore::connect(url, config.database_max_connections).await?;
            pg.migrate().await?;
            tracing::info!(max_connections = config.database_max_connections, "Connected to Postgres");
            Arc::new(pg)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, catalog data lives in memory only");
            Arc::new(MemoryStore::new())
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events will not be published");
                None
            }
        },
        None => None,
    };

    tokio::fs::create_dir_all(&config.media_dir).await?;
    let media = Arc::new(LocalMediaHost::new(config.media_dir.clone(), config.media_base_url.clone()));
    let catalog = CatalogService::new(store, media, EventPublisher::new(nats));
    let port = config.port;
    let app = api::router(AppState { catalog, config: Arc::new(config) });

    tracing::info!("Storefront catalog listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}
