//! Health check and service info endpoints.

use crate::state::AppState;
use axum::{extract::State, routing::get, Json, Router};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{json, Value};

/// Registers health check and info routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(service_info))
        .route("/healthz", get(health_check))
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_seconds: f64,
    timestamp: String,
}

/// Liveness check. Always answers 200 while the process is serving.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_seconds: state.started_at.elapsed().as_secs_f64(),
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}

const ENDPOINTS: &[&str] = &[
    "GET /healthz",
    "GET /metrics",
    "GET /api/orders",
    "POST /api/orders",
    "GET /api/orders/:id",
    "GET /api/orders/price/:item",
    "POST /api/users/signup",
    "POST /api/metrics/web-vitals",
    "POST /api/metrics/:client",
];

async fn service_info(State(state): State<AppState>) -> Json<Value> {
    let service = &state.config.service;
    Json(json!({
        "name": service.name,
        "version": service.version,
        "environment": service.environment,
        "store": state.store.backend_name(),
        "endpoints": ENDPOINTS,
    }))
}
