//! Shared application state.
//!
//! Contains the state that is shared across all request handlers,
//! including configuration, the order store and the metrics handle.

use std::sync::Arc;
use std::time::Instant;

use crate::config::ConfigV1;
use crate::metrics::Telemetry;
use crate::price_client::PriceClient;
use crate::simulation::Simulator;
use crate::store::OrderStore;

/// Application state shared across all HTTP handlers.
///
/// This state is cloned for each request handler; every field is cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration loaded at startup.
    pub config: Arc<ConfigV1>,
    /// Persistence for orders and users.
    pub store: Arc<dyn OrderStore>,
    /// Recorder and push sink for all metrics.
    pub telemetry: Telemetry,
    /// Latency and failure injection for order processing.
    pub simulator: Arc<Simulator>,
    /// Upstream price service, if configured.
    pub prices: Option<PriceClient>,
    pub started_at: Instant,
}
