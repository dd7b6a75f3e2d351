//! Metrics exposition endpoint.

use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;
use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::error;

/// Creates the metrics route.
///
/// Mounted outside the golden-signal layer, so scraping never changes
/// what the next scrape returns.
pub fn routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Returns all collected metrics in Prometheus text format.
async fn metrics_handler(State(state): State<AppState>) -> Response {
    match state.telemetry.render() {
        Ok(text) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
            text,
        )
            .into_response(),
        Err(e) => {
            error!(
                event_name = "metrics.render.failed",
                event_domain = "metrics",
                error = %e,
                "failed to render metrics"
            );
            HTTPError::internal("failed to render metrics").into_response()
        }
    }
}
