//! HTTP route definitions and handlers.
//!
//! Every route except `/metrics` sits behind the golden-signal layer,
//! including the 404 fallback.

mod client_metric_routes;
mod health_routes;
mod metrics_routes;
mod order_routes;
mod user_routes;

pub use order_routes::{CreateOrderRequest, LIST_LIMIT};

use crate::middleware::track_golden_signals;
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{middleware, Router};

/// Creates the application router with all configured routes.
///
/// The layer is added after the routes and the fallback so that all of
/// them, and only them, are instrumented.
pub fn create_router(state: AppState) -> Router {
    let instrumented = Router::new()
        .merge(health_routes::routes())
        .merge(order_routes::routes())
        .merge(user_routes::routes())
        .merge(client_metric_routes::routes())
        .fallback(not_found)
        .layer(middleware::from_fn_with_state(
            state.telemetry.clone(),
            track_golden_signals,
        ));

    Router::new()
        .merge(metrics_routes::routes())
        .merge(instrumented)
        .with_state(state)
}

async fn not_found() -> HTTPError {
    HTTPError::not_found("not found")
}
