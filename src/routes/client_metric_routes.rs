//! Ingestion of metrics reported by browsers and mobile apps.

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    routing::post,
    Json, Router,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::metrics::table::{
    CLIENT_ERRORS_TOTAL, CLIENT_REQUESTS_TOTAL, CLIENT_REQUEST_DURATION_SECONDS,
    WEB_VITALS_TOTAL, WEB_VITAL_VALUE,
};
use crate::metrics::{LabelKey, LabelSet, MetricSample};
use crate::models::{ClientKind, ClientReport, VitalRating, WebVital, WebVitalReport};
use crate::state::AppState;
use crate::utils::http_helpers::HTTPError;

/// `web-vitals` is a static segment and takes precedence over `:client`.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/api/metrics/web-vitals", post(web_vitals))
        .route("/api/metrics/:client", post(client_metrics))
}

fn accepted() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn web_vitals(
    State(state): State<AppState>,
    payload: Result<Json<WebVitalReport>, JsonRejection>,
) -> Result<Json<Value>, HTTPError> {
    let Json(report) = payload.map_err(|_| HTTPError::bad_request("invalid web vital payload"))?;

    let vital = report
        .name
        .as_deref()
        .and_then(WebVital::parse)
        .ok_or_else(|| HTTPError::bad_request("unknown web vital"))?;
    let value = report
        .value
        .filter(|v| v.is_finite())
        .ok_or_else(|| HTTPError::bad_request("value must be a number"))?;
    let rating = VitalRating::parse(report.rating.as_deref());

    state.telemetry.emit(MetricSample::gauge_set(
        &WEB_VITAL_VALUE,
        LabelSet::new().with(LabelKey::Vital, vital.as_str()),
        value,
    ));
    state.telemetry.emit(MetricSample::increment(
        &WEB_VITALS_TOTAL,
        LabelSet::new()
            .with(LabelKey::Vital, vital.as_str())
            .with(LabelKey::Rating, rating.as_str()),
    ));
    debug!(vital = vital.as_str(), value, rating = rating.as_str(), "web vital recorded");

    Ok(accepted())
}

async fn client_metrics(
    State(state): State<AppState>,
    Path(client): Path<String>,
    payload: Result<Json<ClientReport>, JsonRejection>,
) -> Result<Json<Value>, HTTPError> {
    let client =
        ClientKind::parse(&client).ok_or_else(|| HTTPError::not_found("unknown client"))?;
    let Json(report) = payload.map_err(|_| HTTPError::bad_request("invalid client payload"))?;
    if report.route.is_none() {
        return Err(HTTPError::bad_request("route is required"));
    }

    let labels = LabelSet::new()
        .with(LabelKey::Client, client.as_str())
        .with(LabelKey::Route, report.route_label(&state.config.client_routes));

    state
        .telemetry
        .emit(MetricSample::increment(&CLIENT_REQUESTS_TOTAL, labels.clone()));
    if report.is_error() {
        state
            .telemetry
            .emit(MetricSample::increment(&CLIENT_ERRORS_TOTAL, labels.clone()));
    }
    if let Some(seconds) = report.duration_seconds() {
        state.telemetry.emit(MetricSample::observe(
            &CLIENT_REQUEST_DURATION_SECONDS,
            labels,
            seconds,
        ));
    }

    Ok(accepted())
}
