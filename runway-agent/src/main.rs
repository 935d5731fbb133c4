use std::collections::HashMap;
use std::sync::Arc;

use anyhow::Context;
use runway_agent::config::Config;
use runway_agent::handler::OrchestratorHandler;
use runway_agent::tunnel;
use runway_orchestrator::catalog::Catalog;
use runway_orchestrator::definitions::CatalogScriptStore;
use runway_orchestrator::executor::ExecutorRegistry;
use runway_orchestrator::repository;
use runway_orchestrator::service::Orchestrator;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "runway_agent=info,runway_orchestrator=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        agent_id = %config.agent_id,
        control_plane_url = %config.control_plane_url,
        "Starting Runway Agent",
    );

    let catalog = match &config.catalog_path {
        Some(path) => Catalog::load(path)
            .with_context(|| format!("Failed to load catalog {}", path.display()))?,
        None => {
            tracing::warn!("RUNWAY_CATALOG not set, no scripts can be executed");
            Catalog::default()
        }
    };

    let executors = ExecutorRegistry::from_descriptors(
        &catalog.executors,
        &HashMap::new(),
        config.executor_poll_interval,
    )
    .context("Failed to build executor registry")?;

    let repository = repository::connect(config.database_url.as_deref())
        .await
        .context("Failed to open execution repository")?;

    let orchestrator = Arc::new(Orchestrator::new(
        repository,
        Arc::new(CatalogScriptStore::from_catalog(&catalog)),
        executors,
    ));
    let handler = Arc::new(OrchestratorHandler::new(orchestrator.clone()));

    let shutdown = CancellationToken::new();
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for shutdown signal");
                return;
            }
            tracing::info!("Shutdown signal received");
            shutdown.cancel();
        }
    });

    tunnel::run(&config, handler, shutdown).await;

    orchestrator.shutdown().await;
    Ok(())
}
