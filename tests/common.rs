#![allow(dead_code)]

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use figment::{
    providers::{Format, Yaml},
    Figment,
};
use orderpulse::config::{from_figment, ConfigV1};
use orderpulse::routes::create_router;
use orderpulse::simulation::Simulator;
use orderpulse::startup::build_state;
use orderpulse::state::AppState;
use serde_json::Value;
use tower::ServiceExt;

pub const TEST_CONFIG: &str = r#"
version: "1.0.0"
bind_address: 127.0.0.1:0
service:
  name: orderpulse-test
  version: 0.0.1
  environment: test
logging:
  level: debug
  format: json
store:
  type: memory
simulation:
  failure_rate: 0.0
  min_latency_ms: 0
  max_latency_ms: 0
signup:
  enterprise_domains:
    - company.com
"#;

/// Parses `TEST_CONFIG` with `extra` YAML appended.
pub fn load_test_config(extra: &str) -> ConfigV1 {
    let yaml = format!("{}{}", TEST_CONFIG, extra);
    from_figment(Figment::new().merge(Yaml::string(&yaml))).expect("Failed to parse test config YAML")
}

/// Builds the full router with its own registry. `simulator` replaces the
/// configured one when given.
pub async fn build_app(config: ConfigV1, simulator: Option<Simulator>) -> (Router, AppState) {
    let mut state = build_state(Arc::new(config))
        .await
        .expect("state should build");
    if let Some(simulator) = simulator {
        state.simulator = Arc::new(simulator);
    }
    (create_router(state.clone()), state)
}

pub fn get(path: &str) -> Request<Body> {
    request(Method::GET, path)
}

pub fn request(method: Method, path: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(path)
        .body(Body::empty())
        .expect("failed to build request")
}

pub fn post_json(path: &str, body: &Value) -> Request<Body> {
    post_raw(path, &body.to_string())
}

pub fn post_raw(path: &str, body: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("failed to build request")
}

/// Sends a request and returns the status with the JSON body, or `Null`
/// when the body is not JSON.
pub async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app
        .clone()
        .oneshot(request)
        .await
        .expect("request should complete");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

pub async fn scrape(app: &Router) -> String {
    let response = app
        .clone()
        .oneshot(get("/metrics"))
        .await
        .expect("scrape should complete");
    assert_eq!(response.status(), StatusCode::OK);
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should be readable");
    String::from_utf8(bytes.to_vec()).expect("exposition should be UTF-8")
}

/// Sums every series of `name` whose labels include all of `labels`.
pub fn metric_value(text: &str, name: &str, labels: &[(&str, &str)]) -> f64 {
    text.lines()
        .filter(|line| !line.starts_with('#') && !line.is_empty())
        .filter_map(parse_line)
        .filter(|(series, _, _)| *series == name)
        .filter(|(_, series_labels, _)| {
            labels
                .iter()
                .all(|(k, v)| series_labels.iter().any(|(sk, sv)| sk == k && sv == v))
        })
        .map(|(_, _, value)| value)
        .sum()
}

fn parse_line(line: &str) -> Option<(&str, Vec<(&str, &str)>, f64)> {
    let (head, value) = line.rsplit_once(' ')?;
    let value = value.parse().ok()?;
    match head.split_once('{') {
        Some((name, rest)) => {
            let labels = rest
                .trim_end_matches('}')
                .split("\",")
                .filter_map(|pair| {
                    let (k, v) = pair.split_once("=\"")?;
                    Some((k, v.trim_end_matches('"')))
                })
                .collect();
            Some((name, labels, value))
        }
        None => Some((head, Vec::new(), value)),
    }
}
