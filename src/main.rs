use std::sync::Arc;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

mod api;
mod config;
mod domain;
mod inventory;
mod metrics;
mod store;
mod utils;

use config::AppConfig;
use domain::order::OrderLifecycle;
use inventory::HttpInventoryGateway;
use store::{InMemoryOrderStore, OrderStore, PostgresOrderStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Default to INFO level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true).with_thread_ids(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,order_lifecycle=debug")),
        )
        .init();

    tracing::info!("🚀 Starting order lifecycle service");

    // === 1. Configuration ===
    let config = AppConfig::load()?;
    tracing::info!(
        inventory_url = %config.inventory.base_url,
        port = config.server.port,
        "Configuration loaded"
    );

    // === 2. Prometheus metrics ===
    let metrics = Arc::new(metrics::Metrics::new()?);
    tracing::info!(
        "📊 Metrics registry created with {} metrics",
        metrics.registry().gather().len()
    );

    // === 3. Order store ===
    let store: Arc<dyn OrderStore> = match &config.database.url {
        Some(url) => {
            tracing::info!("Connecting to PostgreSQL...");
            let store = PostgresOrderStore::connect(url, config.database.max_connections).await?;
            store.migrate().await?;
            Arc::new(store)
        }
        None => {
            tracing::warn!("No database configured, orders are kept in memory only");
            Arc::new(InMemoryOrderStore::new())
        }
    };

    // === 4. Inventory service client (with circuit breaker) ===
    let inventory = Arc::new(HttpInventoryGateway::new(&config.inventory)?);

    // === 5. Lifecycle engine and HTTP API ===
    let engine = Arc::new(OrderLifecycle::new(store, inventory, metrics.clone()));
    api::serve(&config.server, engine, metrics, config.metrics.enabled).await?;

    tracing::info!("Order lifecycle service stopped");
    Ok(())
}
