//! The declared table of every metric this service emits.
//!
//! Recorders register exactly these definitions and reject samples for
//! anything else, so names, label keys and buckets cannot drift between
//! call sites.

use super::labels::LabelKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    Counter,
    Histogram,
    Gauge,
}

/// DogStatsD metric type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatsdType {
    Count,
    Histogram,
    Timing,
    Gauge,
}

impl StatsdType {
    pub fn code(&self) -> &'static str {
        match self {
            StatsdType::Count => "c",
            StatsdType::Histogram => "h",
            StatsdType::Timing => "ms",
            StatsdType::Gauge => "g",
        }
    }
}

/// How a metric is forwarded to the push sink.
#[derive(Debug)]
pub struct StatsdMapping {
    pub name: &'static str,
    pub kind: StatsdType,
    /// Multiplier applied to the value before sending (seconds -> ms for timings).
    pub scale: f64,
}

#[derive(Debug)]
pub struct MetricDef {
    pub name: &'static str,
    pub help: &'static str,
    pub kind: MetricKind,
    pub label_keys: &'static [LabelKey],
    /// Only read for histograms.
    pub buckets: &'static [f64],
    /// Keys rewritten to [`OVERFLOW_VALUE`] once the metric reaches its
    /// series cap. Empty means samples over the cap are rejected.
    pub overflow_keys: &'static [LabelKey],
    pub statsd: Option<StatsdMapping>,
}

pub const LATENCY_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

pub const DB_LATENCY_BUCKETS: &[f64] = &[0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0];

pub const ORDER_VALUE_BUCKETS: &[f64] = &[10.0, 25.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0];

const HTTP_LABELS: &[LabelKey] = &[LabelKey::Method, LabelKey::Route, LabelKey::StatusCode];

/// Label value of the series that absorbs samples over the cap.
pub const OVERFLOW_VALUE: &str = "other";

/// Request signals must never be dropped, so their high-variety keys fold
/// into one overflow series instead.
const HTTP_OVERFLOW_KEYS: &[LabelKey] = &[LabelKey::Route, LabelKey::StatusCode];

// Golden signals

pub static HTTP_REQUESTS_TOTAL: MetricDef = MetricDef {
    name: "http_requests_total",
    help: "Total HTTP requests received",
    kind: MetricKind::Counter,
    label_keys: HTTP_LABELS,
    buckets: &[],
    overflow_keys: HTTP_OVERFLOW_KEYS,
    statsd: Some(StatsdMapping {
        name: "http.requests",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

pub static HTTP_REQUEST_DURATION_SECONDS: MetricDef = MetricDef {
    name: "http_request_duration_seconds",
    help: "HTTP request duration in seconds",
    kind: MetricKind::Histogram,
    label_keys: HTTP_LABELS,
    buckets: LATENCY_BUCKETS,
    overflow_keys: HTTP_OVERFLOW_KEYS,
    statsd: Some(StatsdMapping {
        name: "http.request.duration",
        kind: StatsdType::Timing,
        scale: 1000.0,
    }),
};

pub static HTTP_ERRORS_TOTAL: MetricDef = MetricDef {
    name: "http_errors_total",
    help: "Total HTTP error responses (4xx, 5xx and aborted requests)",
    kind: MetricKind::Counter,
    label_keys: &[
        LabelKey::Method,
        LabelKey::Route,
        LabelKey::StatusCode,
        LabelKey::ErrorClass,
    ],
    buckets: &[],
    overflow_keys: HTTP_OVERFLOW_KEYS,
    statsd: Some(StatsdMapping {
        name: "http.errors",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

pub static HTTP_REQUESTS_IN_FLIGHT: MetricDef = MetricDef {
    name: "http_requests_in_flight",
    help: "HTTP requests currently being served",
    kind: MetricKind::Gauge,
    label_keys: &[],
    buckets: &[],
    overflow_keys: &[],
    statsd: None,
};

// Business metrics

pub static ORDERS_CREATED_TOTAL: MetricDef = MetricDef {
    name: "orders_created_total",
    help: "Orders created successfully",
    kind: MetricKind::Counter,
    label_keys: &[LabelKey::Category, LabelKey::Currency],
    buckets: &[],
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "orders.created",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

pub static ORDERS_FAILED_TOTAL: MetricDef = MetricDef {
    name: "orders_failed_total",
    help: "Order attempts that failed",
    kind: MetricKind::Counter,
    label_keys: &[LabelKey::Reason, LabelKey::Category],
    buckets: &[],
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "orders.failed",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

pub static ORDER_VALUE: MetricDef = MetricDef {
    name: "order_value",
    help: "Distribution of created order values",
    kind: MetricKind::Histogram,
    label_keys: &[LabelKey::Category, LabelKey::Currency],
    buckets: ORDER_VALUE_BUCKETS,
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "orders.value",
        kind: StatsdType::Histogram,
        scale: 1.0,
    }),
};

pub static REVENUE_TOTAL: MetricDef = MetricDef {
    name: "revenue_total",
    help: "Sum of created order values, in the order's currency",
    kind: MetricKind::Counter,
    label_keys: &[LabelKey::Category, LabelKey::Currency],
    buckets: &[],
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "orders.revenue",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

pub static USER_SIGNUPS_TOTAL: MetricDef = MetricDef {
    name: "user_signups_total",
    help: "User sign-ups",
    kind: MetricKind::Counter,
    label_keys: &[LabelKey::SignupMethod, LabelKey::UserType],
    buckets: &[],
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "users.signup",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

// Data store

pub static DATABASE_QUERY_DURATION_SECONDS: MetricDef = MetricDef {
    name: "database_query_duration_seconds",
    help: "Order store call duration in seconds",
    kind: MetricKind::Histogram,
    label_keys: &[LabelKey::Operation, LabelKey::Collection],
    buckets: DB_LATENCY_BUCKETS,
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "database.query.duration",
        kind: StatsdType::Timing,
        scale: 1000.0,
    }),
};

// Client-reported metrics

pub static WEB_VITAL_VALUE: MetricDef = MetricDef {
    name: "web_vital_value",
    help: "Last reported Web Vital value (ms, CLS is unitless)",
    kind: MetricKind::Gauge,
    label_keys: &[LabelKey::Vital],
    buckets: &[],
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "frontend.web_vitals",
        kind: StatsdType::Gauge,
        scale: 1.0,
    }),
};

pub static WEB_VITALS_TOTAL: MetricDef = MetricDef {
    name: "web_vitals_total",
    help: "Web Vital reports received",
    kind: MetricKind::Counter,
    label_keys: &[LabelKey::Vital, LabelKey::Rating],
    buckets: &[],
    overflow_keys: &[],
    statsd: None,
};

const CLIENT_LABELS: &[LabelKey] = &[LabelKey::Client, LabelKey::Route];

pub static CLIENT_REQUESTS_TOTAL: MetricDef = MetricDef {
    name: "client_requests_total",
    help: "Requests reported by frontend and mobile clients",
    kind: MetricKind::Counter,
    label_keys: CLIENT_LABELS,
    buckets: &[],
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "client.requests",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

pub static CLIENT_ERRORS_TOTAL: MetricDef = MetricDef {
    name: "client_errors_total",
    help: "Errors reported by frontend and mobile clients",
    kind: MetricKind::Counter,
    label_keys: CLIENT_LABELS,
    buckets: &[],
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "client.errors",
        kind: StatsdType::Count,
        scale: 1.0,
    }),
};

pub static CLIENT_REQUEST_DURATION_SECONDS: MetricDef = MetricDef {
    name: "client_request_duration_seconds",
    help: "Request duration reported by clients, in seconds",
    kind: MetricKind::Histogram,
    label_keys: CLIENT_LABELS,
    buckets: LATENCY_BUCKETS,
    overflow_keys: &[],
    statsd: Some(StatsdMapping {
        name: "client.request.duration",
        kind: StatsdType::Timing,
        scale: 1000.0,
    }),
};

/// Every metric registered by a recorder.
pub static METRIC_TABLE: &[&MetricDef] = &[
    &HTTP_REQUESTS_TOTAL,
    &HTTP_REQUEST_DURATION_SECONDS,
    &HTTP_ERRORS_TOTAL,
    &HTTP_REQUESTS_IN_FLIGHT,
    &ORDERS_CREATED_TOTAL,
    &ORDERS_FAILED_TOTAL,
    &ORDER_VALUE,
    &REVENUE_TOTAL,
    &USER_SIGNUPS_TOTAL,
    &DATABASE_QUERY_DURATION_SECONDS,
    &WEB_VITAL_VALUE,
    &WEB_VITALS_TOTAL,
    &CLIENT_REQUESTS_TOTAL,
    &CLIENT_ERRORS_TOTAL,
    &CLIENT_REQUEST_DURATION_SECONDS,
];
