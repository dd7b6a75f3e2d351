//! Metrics recording implementation using Prometheus.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};
use tracing::{debug, warn};

use super::labels::{describe_keys, UNKNOWN};
use super::sample::{Measurement, MetricSample};
use super::table::{MetricDef, MetricKind, METRIC_TABLE, OVERFLOW_VALUE};
use super::{MetricsError, MetricsResult};
use crate::metrics::LabelSet;

/// Aggregator the interceptor and handlers write into.
///
/// Implementations own their own state; nothing here is process-global, so
/// each test can build an isolated recorder.
pub trait MetricsRecorder: Send + Sync + 'static {
    /// Applies one sample to the aggregate state.
    fn record(&self, sample: &MetricSample) -> MetricsResult<()>;

    /// Renders all metrics in Prometheus text format.
    fn render(&self) -> MetricsResult<String>;

    fn increment(&self, def: &'static MetricDef, labels: LabelSet) -> MetricsResult<()> {
        self.record(&MetricSample::increment(def, labels))
    }

    fn observe(&self, def: &'static MetricDef, labels: LabelSet, value: f64) -> MetricsResult<()> {
        self.record(&MetricSample::observe(def, labels, value))
    }

    fn add(&self, def: &'static MetricDef, labels: LabelSet, delta: f64) -> MetricsResult<()> {
        self.record(&MetricSample::gauge_add(def, labels, delta))
    }
}

#[derive(Clone)]
enum Family {
    Counter(CounterVec),
    Histogram(HistogramVec),
    Gauge(GaugeVec),
}

impl Family {
    fn register(def: &MetricDef, registry: &Registry) -> MetricsResult<Self> {
        let keys: Vec<&str> = def.label_keys.iter().map(|k| k.as_str()).collect();
        let family = match def.kind {
            MetricKind::Counter => {
                let vec = CounterVec::new(Opts::new(def.name, def.help), &keys)?;
                registry.register(Box::new(vec.clone()))?;
                Family::Counter(vec)
            }
            MetricKind::Histogram => {
                let opts = HistogramOpts::new(def.name, def.help).buckets(def.buckets.to_vec());
                let vec = HistogramVec::new(opts, &keys)?;
                registry.register(Box::new(vec.clone()))?;
                Family::Histogram(vec)
            }
            MetricKind::Gauge => {
                let vec = GaugeVec::new(Opts::new(def.name, def.help), &keys)?;
                registry.register(Box::new(vec.clone()))?;
                Family::Gauge(vec)
            }
        };
        Ok(family)
    }
}

/// Caps the number of distinct label combinations per metric.
struct SeriesGuard {
    limit: usize,
    seen: Mutex<HashMap<&'static str, HashSet<String>>>,
}

impl SeriesGuard {
    fn new(limit: usize) -> Self {
        SeriesGuard {
            limit,
            seen: Mutex::new(HashMap::new()),
        }
    }

    fn admit(&self, metric: &'static str, values: &[&str]) -> MetricsResult<()> {
        let mut seen = match self.seen.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                warn!("series guard mutex poisoned, recovering");
                poisoned.into_inner()
            }
        };
        let series = seen.entry(metric).or_default();
        let key = values.join("\u{1f}");
        if series.contains(&key) {
            return Ok(());
        }
        if series.len() >= self.limit {
            return Err(MetricsError::CardinalityExceeded {
                metric,
                limit: self.limit,
            });
        }
        series.insert(key);
        Ok(())
    }
}

/// Prometheus metrics collector built from the declared metric table.
#[derive(Clone)]
pub struct Metrics {
    registry: Arc<Registry>,
    families: Arc<HashMap<&'static str, Family>>,
    series: Arc<SeriesGuard>,
}

impl Metrics {
    /// Creates a registry holding every metric in the table. `service` is
    /// attached to all series as a constant label.
    pub fn new(service: &str, max_series_per_metric: usize) -> MetricsResult<Self> {
        let const_labels = HashMap::from([("service".to_string(), service.to_string())]);
        let registry = Registry::new_custom(None, Some(const_labels))?;

        // Resident memory, CPU time, open fds and threads of this process.
        #[cfg(target_os = "linux")]
        registry.register(Box::new(
            prometheus::process_collector::ProcessCollector::for_self(),
        ))?;

        let mut families = HashMap::with_capacity(METRIC_TABLE.len());
        for def in METRIC_TABLE {
            families.insert(def.name, Family::register(def, &registry)?);
        }

        Ok(Metrics {
            registry: Arc::new(registry),
            families: Arc::new(families),
            series: Arc::new(SeriesGuard::new(max_series_per_metric.max(1))),
        })
    }

    /// Label values ordered as the metric declares its keys.
    fn ordered_values<'a>(sample: &'a MetricSample) -> MetricsResult<Vec<&'a str>> {
        let declared = sample.def.label_keys;
        let matches = sample.labels.len() == declared.len()
            && declared.iter().all(|k| sample.labels.get(*k).is_some());
        if !matches {
            return Err(MetricsError::LabelMismatch {
                metric: sample.def.name,
                expected: describe_keys(declared.iter().copied()),
                got: sample.labels.describe_keys(),
            });
        }
        Ok(declared
            .iter()
            .map(|k| sample.labels.get(*k).unwrap_or(UNKNOWN))
            .collect())
    }

    /// Replaces the values of the metric's overflow keys with [`OVERFLOW_VALUE`].
    fn fold_overflow<'a>(def: &MetricDef, values: Vec<&'a str>) -> Vec<&'a str> {
        def.label_keys
            .iter()
            .zip(values)
            .map(|(key, value)| {
                if def.overflow_keys.contains(key) {
                    OVERFLOW_VALUE
                } else {
                    value
                }
            })
            .collect()
    }
}

impl MetricsRecorder for Metrics {
    fn record(&self, sample: &MetricSample) -> MetricsResult<()> {
        let name = sample.def.name;
        let family = self
            .families
            .get(name)
            .ok_or(MetricsError::UnknownMetric(name))?;
        if sample.measurement.kind() != sample.def.kind {
            return Err(MetricsError::KindMismatch {
                metric: name,
                measurement: sample.measurement.describe(),
            });
        }
        if let Measurement::Increment(v) = sample.measurement {
            if v < 0.0 || v.is_nan() {
                return Err(MetricsError::NegativeIncrement(name));
            }
        }

        let values = Self::ordered_values(sample)?;
        // Overflow series sit outside the cap; their size is bounded by the
        // keys that are not folded.
        let values = match self.series.admit(name, &values) {
            Ok(()) => values,
            Err(e) if sample.def.overflow_keys.is_empty() => return Err(e),
            Err(_) => {
                debug!(metric = name, "series cap reached, folding into overflow series");
                Self::fold_overflow(sample.def, values)
            }
        };

        match (family, sample.measurement) {
            (Family::Counter(vec), Measurement::Increment(v)) => {
                vec.get_metric_with_label_values(&values)?.inc_by(v)
            }
            (Family::Histogram(vec), Measurement::Observe(v)) => {
                vec.get_metric_with_label_values(&values)?.observe(v)
            }
            (Family::Gauge(vec), Measurement::GaugeAdd(v)) => {
                vec.get_metric_with_label_values(&values)?.add(v)
            }
            (Family::Gauge(vec), Measurement::GaugeSet(v)) => {
                vec.get_metric_with_label_values(&values)?.set(v)
            }
            _ => {
                return Err(MetricsError::KindMismatch {
                    metric: name,
                    measurement: sample.measurement.describe(),
                })
            }
        }
        Ok(())
    }

    fn render(&self) -> MetricsResult<String> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::table::{
        HTTP_ERRORS_TOTAL, HTTP_REQUESTS_IN_FLIGHT, HTTP_REQUESTS_TOTAL,
        HTTP_REQUEST_DURATION_SECONDS, ORDERS_CREATED_TOTAL,
    };
    use crate::metrics::test_support::{sample_value, without_process_metrics};
    use crate::metrics::LabelKey;

    static UNREGISTERED: MetricDef = MetricDef {
        name: "not_in_table_total",
        help: "never registered",
        kind: MetricKind::Counter,
        label_keys: &[],
        buckets: &[],
        overflow_keys: &[],
        statsd: None,
    };

    fn http_labels(route: &str) -> LabelSet {
        LabelSet::new()
            .with(LabelKey::Method, "GET")
            .with(LabelKey::Route, route)
            .with(LabelKey::StatusCode, "200")
    }

    #[test]
    fn counter_and_histogram_are_rendered() {
        let metrics = Metrics::new("test", 100).unwrap();
        metrics
            .increment(&HTTP_REQUESTS_TOTAL, http_labels("/api/orders"))
            .unwrap();
        metrics
            .observe(&HTTP_REQUEST_DURATION_SECONDS, http_labels("/api/orders"), 0.042)
            .unwrap();

        let text = metrics.render().unwrap();
        let labels = [
            ("method", "GET"),
            ("route", "/api/orders"),
            ("status_code", "200"),
            ("service", "test"),
        ];
        assert_eq!(sample_value(&text, "http_requests_total", &labels), 1.0);
        assert_eq!(
            sample_value(&text, "http_request_duration_seconds_count", &labels),
            1.0
        );
    }

    #[test]
    fn render_is_idempotent() {
        let metrics = Metrics::new("test", 100).unwrap();
        metrics
            .increment(&HTTP_REQUESTS_TOTAL, http_labels("/healthz"))
            .unwrap();
        assert_eq!(
            without_process_metrics(&metrics.render().unwrap()),
            without_process_metrics(&metrics.render().unwrap())
        );
    }

    #[test]
    fn registries_are_isolated() {
        let a = Metrics::new("a", 100).unwrap();
        let b = Metrics::new("b", 100).unwrap();
        a.increment(&HTTP_REQUESTS_TOTAL, http_labels("/x")).unwrap();
        assert!(!b.render().unwrap().contains(r#"route="/x""#));
    }

    #[test]
    fn unknown_metric_is_rejected() {
        let metrics = Metrics::new("test", 100).unwrap();
        let err = metrics.increment(&UNREGISTERED, LabelSet::new()).unwrap_err();
        assert!(matches!(err, MetricsError::UnknownMetric("not_in_table_total")));
    }

    #[test]
    fn missing_or_extra_labels_are_rejected() {
        let metrics = Metrics::new("test", 100).unwrap();

        let missing = LabelSet::new().with(LabelKey::Method, "GET");
        let err = metrics.increment(&HTTP_REQUESTS_TOTAL, missing).unwrap_err();
        assert!(matches!(err, MetricsError::LabelMismatch { .. }));

        let extra = http_labels("/x").with(LabelKey::Currency, "USD");
        let err = metrics.increment(&HTTP_REQUESTS_TOTAL, extra).unwrap_err();
        assert!(matches!(err, MetricsError::LabelMismatch { .. }));

        assert!(!metrics.render().unwrap().contains("route=\"/x\""));
    }

    #[test]
    fn wrong_measurement_kind_is_rejected() {
        let metrics = Metrics::new("test", 100).unwrap();
        let err = metrics
            .observe(&HTTP_REQUESTS_TOTAL, http_labels("/x"), 1.0)
            .unwrap_err();
        assert!(matches!(err, MetricsError::KindMismatch { .. }));
    }

    #[test]
    fn counters_cannot_decrease() {
        let metrics = Metrics::new("test", 100).unwrap();
        let sample = MetricSample::new(
            &HTTP_REQUESTS_TOTAL,
            Measurement::Increment(-1.0),
            http_labels("/x"),
        );
        assert!(matches!(
            metrics.record(&sample),
            Err(MetricsError::NegativeIncrement(_))
        ));
    }

    #[test]
    fn series_limit_rejects_new_combinations_only() {
        let metrics = Metrics::new("test", 2).unwrap();
        let labels = |category: &str| {
            LabelSet::new()
                .with(LabelKey::Category, category)
                .with(LabelKey::Currency, "USD")
        };

        metrics.increment(&ORDERS_CREATED_TOTAL, labels("books")).unwrap();
        metrics.increment(&ORDERS_CREATED_TOTAL, labels("food")).unwrap();
        let err = metrics
            .increment(&ORDERS_CREATED_TOTAL, labels("electronics"))
            .unwrap_err();
        assert!(matches!(
            err,
            MetricsError::CardinalityExceeded { limit: 2, .. }
        ));

        // Existing series keep counting.
        metrics.increment(&ORDERS_CREATED_TOTAL, labels("books")).unwrap();
        let text = metrics.render().unwrap();
        assert_eq!(
            sample_value(
                &text,
                "orders_created_total",
                &[("category", "books"), ("currency", "USD")]
            ),
            2.0
        );
        assert!(!text.contains("electronics"));
    }

    #[test]
    fn series_limit_is_per_metric() {
        let metrics = Metrics::new("test", 1).unwrap();
        metrics.increment(&HTTP_REQUESTS_TOTAL, http_labels("/a")).unwrap();
        let error_labels = http_labels("/a").with(LabelKey::ErrorClass, "client_error");
        metrics.increment(&HTTP_ERRORS_TOTAL, error_labels).unwrap();
    }

    #[test]
    fn label_less_gauge_moves_both_ways() {
        let metrics = Metrics::new("test", 10).unwrap();
        metrics.add(&HTTP_REQUESTS_IN_FLIGHT, LabelSet::new(), 1.0).unwrap();
        metrics.add(&HTTP_REQUESTS_IN_FLIGHT, LabelSet::new(), 1.0).unwrap();
        metrics.add(&HTTP_REQUESTS_IN_FLIGHT, LabelSet::new(), -1.0).unwrap();
        let text = metrics.render().unwrap();
        assert_eq!(
            sample_value(&text, "http_requests_in_flight", &[("service", "test")]),
            1.0
        );
    }

    #[test]
    fn request_signals_over_the_cap_fold_into_overflow_series() {
        let metrics = Metrics::new("test", 1).unwrap();
        for route in ["/a", "/b", "/c"] {
            metrics.increment(&HTTP_REQUESTS_TOTAL, http_labels(route)).unwrap();
            metrics
                .observe(&HTTP_REQUEST_DURATION_SECONDS, http_labels(route), 0.01)
                .unwrap();
        }

        let text = metrics.render().unwrap();
        assert_eq!(sample_value(&text, "http_requests_total", &[]), 3.0);
        assert_eq!(
            sample_value(&text, "http_request_duration_seconds_count", &[]),
            3.0
        );
        assert_eq!(
            sample_value(
                &text,
                "http_requests_total",
                &[("method", "GET"), ("route", "other"), ("status_code", "other")]
            ),
            2.0
        );
        assert!(!text.contains(r#"route="/b""#));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn process_metrics_are_exported() {
        let metrics = Metrics::new("test", 10).unwrap();
        let text = metrics.render().unwrap();
        assert!(sample_value(&text, "process_resident_memory_bytes", &[]) > 0.0);
        assert!(text.contains("process_cpu_seconds_total"));
    }
}
