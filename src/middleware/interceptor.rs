//! Golden-signal instrumentation for every routed request.
//!
//! For each request exactly one terminal sample set is emitted: traffic +1,
//! one latency observation, and an error +1 for 4xx, 5xx or aborted
//! requests. A request whose future is dropped before a response exists
//! (client disconnect, cancellation, handler panic) is finished from
//! [`RequestContext`]'s `Drop` with status `aborted`.

use std::time::Instant;

use axum::extract::{MatchedPath, Request, State};
use axum::http::{Method, StatusCode};
use axum::middleware::Next;
use axum::response::Response;
use tracing::{info, warn};

use crate::metrics::table::{
    HTTP_ERRORS_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
    HTTP_REQUEST_DURATION_SECONDS,
};
use crate::metrics::{LabelKey, LabelSet, MetricSample, Telemetry};

/// Route label for requests no route matched.
pub const UNMATCHED_ROUTE: &str = "unmatched";

/// Status label for requests that ended without a response.
pub const ABORTED_STATUS: &str = "aborted";

/// Method label for anything outside the standard verbs.
pub const OTHER_METHOD: &str = "OTHER";

const STANDARD_METHODS: [&str; 9] = [
    "GET", "HEAD", "POST", "PUT", "DELETE", "CONNECT", "OPTIONS", "TRACE", "PATCH",
];

/// Axum middleware that records the golden signals for a request.
///
/// Use with `axum::middleware::from_fn_with_state`; it must be added with
/// `Router::layer` so the matched route template is available.
pub async fn track_golden_signals(
    State(telemetry): State<Telemetry>,
    request: Request,
    next: Next,
) -> Response {
    let context = RequestContext::enter(telemetry, &request);
    let response = next.run(request).await;
    context.complete(response.status());
    response
}

/// How a request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed(StatusCode),
    Aborted,
}

impl Outcome {
    pub fn status_label(&self) -> String {
        match self {
            Outcome::Completed(status) => status.as_u16().to_string(),
            Outcome::Aborted => ABORTED_STATUS.to_string(),
        }
    }

    /// `None` for successful responses.
    pub fn error_class(&self) -> Option<&'static str> {
        match self {
            Outcome::Completed(status) => match status.as_u16() {
                400..=499 => Some("client_error"),
                code if code >= 500 => Some("server_error"),
                _ => None,
            },
            Outcome::Aborted => Some("server_error"),
        }
    }
}

/// Per-request state between entry and completion.
pub struct RequestContext {
    telemetry: Telemetry,
    started_at: Instant,
    method: &'static str,
    route: String,
    finished: bool,
}

impl RequestContext {
    pub fn enter(telemetry: Telemetry, request: &Request) -> Self {
        let route = request
            .extensions()
            .get::<MatchedPath>()
            .map(|p| p.as_str().to_owned())
            .unwrap_or_else(|| UNMATCHED_ROUTE.to_owned());

        telemetry.emit(MetricSample::gauge_add(
            &HTTP_REQUESTS_IN_FLIGHT,
            LabelSet::new(),
            1.0,
        ));

        RequestContext {
            telemetry,
            started_at: Instant::now(),
            method: normalize_method(request.method()),
            route,
            finished: false,
        }
    }

    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn method(&self) -> &'static str {
        self.method
    }

    /// Records the final status. Consumes the context so it cannot finish twice.
    pub fn complete(mut self, status: StatusCode) {
        self.finish(Outcome::Completed(status));
    }

    fn finish(&mut self, outcome: Outcome) {
        if self.finished {
            return;
        }
        self.finished = true;

        let elapsed = self.started_at.elapsed().as_secs_f64();
        let status = outcome.status_label();
        let labels = LabelSet::new()
            .with(LabelKey::Method, self.method)
            .with(LabelKey::Route, &self.route)
            .with(LabelKey::StatusCode, &status);

        self.telemetry
            .emit(MetricSample::increment(&HTTP_REQUESTS_TOTAL, labels.clone()));
        if let Some(class) = outcome.error_class() {
            self.telemetry.emit(MetricSample::increment(
                &HTTP_ERRORS_TOTAL,
                labels.clone().with(LabelKey::ErrorClass, class),
            ));
        }
        self.telemetry.emit(MetricSample::observe(
            &HTTP_REQUEST_DURATION_SECONDS,
            labels,
            elapsed,
        ));
        self.telemetry.emit(MetricSample::gauge_add(
            &HTTP_REQUESTS_IN_FLIGHT,
            LabelSet::new(),
            -1.0,
        ));

        match outcome {
            Outcome::Completed(_) => info!(
                event_name = "http.request.completed",
                event_domain = "http",
                method = self.method,
                route = self.route.as_str(),
                status = status.as_str(),
                duration_seconds = elapsed,
                "request completed"
            ),
            Outcome::Aborted => warn!(
                event_name = "http.request.aborted",
                event_domain = "http",
                method = self.method,
                route = self.route.as_str(),
                duration_seconds = elapsed,
                "request ended without a response"
            ),
        }
    }
}

impl Drop for RequestContext {
    fn drop(&mut self) {
        self.finish(Outcome::Aborted);
    }
}

/// Maps extension methods to [`OTHER_METHOD`] so the label stays bounded.
pub fn normalize_method(method: &Method) -> &'static str {
    STANDARD_METHODS
        .iter()
        .copied()
        .find(|m| *m == method.as_str())
        .unwrap_or(OTHER_METHOD)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::test_support::sample_value;
    use crate::metrics::{Metrics, MetricsRecorder};
    use axum::body::Body;
    use std::sync::Arc;

    fn telemetry() -> (Telemetry, Metrics) {
        let metrics = Metrics::new("test", 100).unwrap();
        (Telemetry::local(Arc::new(metrics.clone())), metrics)
    }

    fn request(method: &str) -> Request {
        axum::http::Request::builder()
            .method(method)
            .uri("/raw/path/123")
            .body(Body::empty())
            .unwrap()
    }

    #[test]
    fn error_classes() {
        assert_eq!(Outcome::Completed(StatusCode::OK).error_class(), None);
        assert_eq!(
            Outcome::Completed(StatusCode::FOUND).error_class(),
            None
        );
        assert_eq!(
            Outcome::Completed(StatusCode::NOT_FOUND).error_class(),
            Some("client_error")
        );
        assert_eq!(
            Outcome::Completed(StatusCode::BAD_GATEWAY).error_class(),
            Some("server_error")
        );
        assert_eq!(Outcome::Aborted.error_class(), Some("server_error"));
        assert_eq!(Outcome::Aborted.status_label(), "aborted");
    }

    #[test]
    fn extension_methods_are_folded() {
        assert_eq!(normalize_method(&Method::PATCH), "PATCH");
        let custom = Method::from_bytes(b"PURGE").unwrap();
        assert_eq!(normalize_method(&custom), OTHER_METHOD);
    }

    #[test]
    fn missing_matched_path_is_unmatched() {
        let (telemetry, _) = telemetry();
        let context = RequestContext::enter(telemetry, &request("GET"));
        assert_eq!(context.route(), UNMATCHED_ROUTE);
        assert_eq!(context.method(), "GET");
    }

    #[test]
    fn complete_then_drop_counts_once() {
        let (telemetry, metrics) = telemetry();
        let context = RequestContext::enter(telemetry, &request("GET"));
        context.complete(StatusCode::OK);

        let text = metrics.render().unwrap();
        assert_eq!(
            sample_value(
                &text,
                "http_requests_total",
                &[("method", "GET"), ("route", "unmatched"), ("status_code", "200")]
            ),
            1.0
        );
        assert_eq!(sample_value(&text, "http_requests_total", &[]), 1.0);
        assert!(!text.contains("aborted"));
        assert_eq!(sample_value(&text, "http_requests_in_flight", &[]), 0.0);
    }

    #[test]
    fn dropped_context_is_recorded_as_aborted() {
        let (telemetry, metrics) = telemetry();
        let context = RequestContext::enter(telemetry, &request("DELETE"));
        drop(context);

        let text = metrics.render().unwrap();
        let labels = [
            ("method", "DELETE"),
            ("route", "unmatched"),
            ("status_code", "aborted"),
        ];
        assert_eq!(sample_value(&text, "http_requests_total", &labels), 1.0);
        assert_eq!(
            sample_value(
                &text,
                "http_errors_total",
                &[("error_class", "server_error"), ("status_code", "aborted")]
            ),
            1.0
        );
        assert_eq!(
            sample_value(&text, "http_request_duration_seconds_count", &labels),
            1.0
        );
    }
}
