//! Application startup and server initialization.
//!
//! This module wires the order store, the metrics registry and push sink,
//! the simulator and the price client into the shared state, then serves
//! the router until a shutdown signal arrives.

use std::error::Error;
use std::sync::Arc;
use std::time::Instant;

use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::ConfigV1;
use crate::metrics::{Metrics, MetricsSink, NoSink, StatsdSink, Telemetry};
use crate::price_client::PriceClient;
use crate::routes;
use crate::simulation::Simulator;
use crate::state::AppState;
use crate::store::{create_store, InstrumentedStore, OrderStore};

/// Builds the shared state from configuration.
///
/// Must be called from within a tokio runtime when the StatsD sink is enabled.
pub async fn build_state(config: Arc<ConfigV1>) -> Result<AppState, Box<dyn Error>> {
    let backend = create_store(&config.store).await?;
    let metrics = Metrics::new(&config.service.name, config.metrics.max_series_per_metric)?;

    let sink: Arc<dyn MetricsSink> = if config.statsd.enabled {
        Arc::new(StatsdSink::spawn(&config.statsd, &config.service))
    } else {
        info!("DogStatsD sink disabled");
        Arc::new(NoSink)
    };

    let prices = match &config.price_service {
        Some(price_config) => Some(PriceClient::new(price_config)?),
        None => None,
    };
    let simulator = Arc::new(Simulator::from_config(&config.simulation));

    let telemetry = Telemetry::new(Arc::new(metrics), sink);
    let store: Arc<dyn OrderStore> = Arc::new(InstrumentedStore::new(backend, telemetry.clone()));

    Ok(AppState {
        telemetry,
        store,
        simulator,
        prices,
        config,
        started_at: Instant::now(),
    })
}

/// Initializes and runs the application server.
///
/// # Errors
///
/// Returns an error if a collaborator cannot be created, the server fails
/// to bind to the configured address, or serving fails.
pub async fn run(config: Arc<ConfigV1>) -> Result<(), Box<dyn Error>> {
    let state = build_state(config.clone()).await?;
    let app = routes::create_router(state);

    info!(
        service = config.service.name.as_str(),
        environment = config.service.environment.as_str(),
        "Starting server on {}",
        config.bind_address
    );
    let listener = TcpListener::bind(&config.bind_address).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Failed to listen for shutdown signal: {}", e),
    }
}
