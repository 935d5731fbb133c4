use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use runway_orchestrator::{
    api::{self, AppState},
    catalog::Catalog,
    config::Config,
    definitions::CatalogScriptStore,
    executor::ExecutorRegistry,
    relay::RelayHub,
    repository,
    service::Orchestrator,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runway_orchestrator=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Runway Orchestrator...");

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => {
            tracing::warn!("RUNWAY_CATALOG not set, starting without executors or scripts");
            Catalog::default()
        }
    };

    let executors = ExecutorRegistry::from_descriptors(
        &catalog.executors,
        &HashMap::new(),
        config.executor_poll_interval,
    )
    .context("Failed to build executor registry")?;
    tracing::info!("Registered executors: {:?}", executors.types());

    let scripts = CatalogScriptStore::from_catalog(&catalog);
    tracing::info!("Loaded {} script definitions", scripts.len());

    let repository = repository::connect(config.database_url.as_deref())
        .await
        .context("Failed to open execution repository")?;

    let orchestrator = Arc::new(Orchestrator::new(
        repository,
        Arc::new(scripts),
        executors,
    ));
    let relay = RelayHub::new(config.relay_request_timeout, config.relay_handshake_timeout);

    // Build router with all API endpoints
    let app = api::create_router(AppState {
        orchestrator: orchestrator.clone(),
        relay: relay.clone(),
    });

    tracing::info!("Listening on {}", config.bind_addr);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down...");
    relay.shutdown().await;
    orchestrator.shutdown().await;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
