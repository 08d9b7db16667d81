//! WooCommerce Catalog Sync - import, sync and transfer service

use std::sync::Arc;
use anyhow::Result;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use woo_catalog_sync::api::{router, AppState};
use woo_catalog_sync::remote::WooClientFactory;
use woo_catalog_sync::schedule::SyncScheduler;
use woo_catalog_sync::store::PgCatalogStore;
use woo_catalog_sync::{CatalogService, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry().with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into())).with(tracing_subscriber::fmt::layer()).init();

    let settings = Settings::from_env()?;
    let db = PgPoolOptions::new().max_connections(settings.database_max_connections).connect(&settings.database_url).await?;
    sqlx::migrate!("./migrations").run(&db).await?;

    let service = CatalogService::new(
        Arc::new(PgCatalogStore::new(db)),
        Arc::new(WooClientFactory::new(settings.remote)),
        settings.import,
        settings.sync,
    );
    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    let scheduler = tokio::spawn(SyncScheduler::new(service.clone(), settings.scheduler_tick).run(shutdown_rx));
    let app = router(AppState { service });

    tracing::info!("woo-catalog-sync listening on 0.0.0.0:{}", settings.port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", settings.port)).await?, app)
        .with_graceful_shutdown(async { tokio::signal::ctrl_c().await.ok(); })
        .await?;

    shutdown_tx.send(true).ok();
    scheduler.await?;
    Ok(())
}
