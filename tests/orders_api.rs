mod common;

use axum::http::StatusCode;
use common::{build_app, get, load_test_config, metric_value, post_json, post_raw, scrape, send};
use mockito::Server;
use serde_json::json;

#[tokio::test]
async fn created_orders_are_listed_and_counted() {
    let (app, _state) = build_app(load_test_config(""), None).await;

    let order = json!({
        "item": "headphones",
        "price": 99.5,
        "currency": "eur",
        "category": "electronics",
        "customer": "c-42"
    });
    let (status, created) = send(&app, post_json("/api/orders", &order)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(created["currency"], "EUR");
    assert_eq!(created["category"], "electronics");
    let id = created["id"].as_str().expect("order id").to_string();

    let (status, fetched) = send(&app, get(&format!("/api/orders/{}", id))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["item"], "headphones");

    let (status, listed) = send(&app, get("/api/orders")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(listed["orders"].as_array().map(Vec::len), Some(1));

    let text = scrape(&app).await;
    assert_eq!(
        metric_value(
            &text,
            "orders_created_total",
            &[("category", "electronics"), ("currency", "EUR")]
        ),
        1.0
    );
    assert_eq!(metric_value(&text, "order_value_count", &[]), 1.0);
    assert_eq!(metric_value(&text, "order_value_sum", &[]), 99.5);
    assert_eq!(
        metric_value(
            &text,
            "revenue_total",
            &[("category", "electronics"), ("currency", "EUR")]
        ),
        99.5
    );
    for operation in ["insert", "get", "list"] {
        assert_eq!(
            metric_value(
                &text,
                "database_query_duration_seconds_count",
                &[("operation", operation), ("collection", "orders")]
            ),
            1.0,
            "{} should be timed once",
            operation
        );
    }
    assert!(!text.contains("headphones"));
    assert!(!text.contains(&id));
}

#[tokio::test]
async fn invalid_orders_are_validation_failures() {
    let (app, _state) = build_app(load_test_config(""), None).await;

    let (status, body) = send(&app, post_raw("/api/orders", "{not json")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());

    let (status, _) = send(
        &app,
        post_json("/api/orders", &json!({"item": "atlas", "price": -1, "category": "books"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let text = scrape(&app).await;
    assert_eq!(
        metric_value(
            &text,
            "orders_failed_total",
            &[("reason", "validation"), ("category", "other")]
        ),
        1.0
    );
    assert_eq!(
        metric_value(
            &text,
            "orders_failed_total",
            &[("reason", "validation"), ("category", "books")]
        ),
        1.0
    );
}

#[tokio::test]
async fn signup_classifies_and_rejects_duplicates() {
    let (app, _state) = build_app(load_test_config(""), None).await;

    let signup = json!({"email": "Ana@Company.com", "signup_method": "google"});
    let (status, body) = send(&app, post_json("/api/users/signup", &signup)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_type"], "enterprise");
    assert_eq!(body["signup_method"], "google");
    assert!(body["id"].is_string());

    let (status, _) = send(&app, post_json("/api/users/signup", &signup)).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(
        &app,
        post_json("/api/users/signup", &json!({"email": "not-an-email"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = send(
        &app,
        post_json("/api/users/signup", &json!({"email": "bob@example.org"})),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["user_type"], "consumer");
    assert_eq!(body["signup_method"], "direct");

    let text = scrape(&app).await;
    assert_eq!(
        metric_value(
            &text,
            "user_signups_total",
            &[("signup_method", "google"), ("user_type", "enterprise")]
        ),
        1.0
    );
    assert_eq!(metric_value(&text, "user_signups_total", &[]), 2.0);
    assert_eq!(
        metric_value(
            &text,
            "database_query_duration_seconds_count",
            &[("operation", "insert"), ("collection", "users")]
        ),
        3.0
    );
    assert!(!text.contains("company.com"));
    assert_eq!(
        metric_value(
            &text,
            "http_requests_total",
            &[("route", "/api/users/signup"), ("status_code", "409")]
        ),
        1.0
    );
}

#[tokio::test]
async fn web_vitals_are_recorded() {
    let (app, _state) = build_app(load_test_config(""), None).await;

    let vital = json!({"name": "LCP", "value": 2500.0, "rating": "needs-improvement"});
    let (status, _) = send(&app, post_json("/api/metrics/web-vitals", &vital)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(
        &app,
        post_json("/api/metrics/web-vitals", &json!({"name": "XYZ", "value": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let text = scrape(&app).await;
    assert_eq!(metric_value(&text, "web_vital_value", &[("vital", "LCP")]), 2500.0);
    assert_eq!(
        metric_value(
            &text,
            "web_vitals_total",
            &[("vital", "LCP"), ("rating", "needs-improvement")]
        ),
        1.0
    );
    assert!(!text.contains("XYZ"));
    assert_eq!(
        metric_value(
            &text,
            "http_requests_total",
            &[("route", "/api/metrics/web-vitals")]
        ),
        2.0
    );
}

#[tokio::test]
async fn client_reports_use_allowlisted_routes() {
    let (app, _state) = build_app(load_test_config(""), None).await;

    let report = json!({"route": "/orders", "duration": 120.0, "error": true});
    let (status, _) = send(&app, post_json("/api/metrics/frontend", &report)).await;
    assert_eq!(status, StatusCode::OK);

    let report = json!({"route": "/orders/8812", "duration": 40.0});
    let (status, _) = send(&app, post_json("/api/metrics/mobile", &report)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = send(&app, post_json("/api/metrics/desktop", &json!({"route": "/"}))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let text = scrape(&app).await;
    assert_eq!(
        metric_value(
            &text,
            "client_requests_total",
            &[("client", "frontend"), ("route", "/orders")]
        ),
        1.0
    );
    assert_eq!(
        metric_value(&text, "client_errors_total", &[("client", "frontend")]),
        1.0
    );
    assert_eq!(
        metric_value(
            &text,
            "client_requests_total",
            &[("client", "mobile"), ("route", "other")]
        ),
        1.0
    );
    assert_eq!(
        metric_value(&text, "client_request_duration_seconds_count", &[]),
        2.0
    );
    assert!(!text.contains("8812"));
    assert!(!text.contains("desktop"));
}

#[tokio::test]
async fn price_lookup_proxies_upstream() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/price/widget")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"price": 12.5}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/price/gadget")
        .with_status(503)
        .create_async()
        .await;

    let config = load_test_config(&format!("price_service:\n  url: {}\n", server.url()));
    let (app, _state) = build_app(config, None).await;

    let (status, body) = send(&app, get("/api/orders/price/widget")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"item": "widget", "price": 12.5}));

    let (status, body) = send(&app, get("/api/orders/price/gadget")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body, json!({"error": "upstream_error"}));

    let text = scrape(&app).await;
    assert_eq!(
        metric_value(
            &text,
            "http_errors_total",
            &[("route", "/api/orders/price/:item"), ("error_class", "server_error")]
        ),
        1.0
    );
}

#[tokio::test]
async fn price_lookup_without_upstream_is_bad_gateway() {
    let (app, _state) = build_app(load_test_config(""), None).await;

    let (status, body) = send(&app, get("/api/orders/price/widget")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "upstream_error");
}

#[tokio::test]
async fn health_and_info_describe_the_service() {
    let (app, _state) = build_app(load_test_config(""), None).await;

    let (status, health) = send(&app, get("/healthz")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["status"], "ok");
    assert!(health["uptime_seconds"].as_f64().is_some());
    assert!(health["timestamp"].is_string());

    let (status, info) = send(&app, get("/")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(info["name"], "orderpulse-test");
    assert_eq!(info["environment"], "test");
    assert_eq!(info["store"], "memory");
}
