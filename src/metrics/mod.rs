//! Metrics collection and exposition for Prometheus, with an optional
//! DogStatsD push sink.
//!
//! Every metric in the process is declared once in [`table`]. Samples flow
//! through [`Telemetry`], which records them into the injected
//! [`MetricsRecorder`] and forwards them to the [`MetricsSink`].

pub mod events;
pub mod labels;
mod recorder;
mod sample;
pub mod sink;
pub mod statsd;
pub mod table;
mod telemetry;
#[cfg(test)]
pub(crate) mod test_support;

pub use events::{BusinessEvent, FailureReason};
pub use labels::{LabelKey, LabelSet};
pub use recorder::{Metrics, MetricsRecorder};
pub use sample::{Measurement, MetricSample};
pub use sink::{MetricsSink, NoSink};
pub use statsd::StatsdSink;
pub use table::{MetricDef, MetricKind};
pub use telemetry::Telemetry;

/// Errors raised while recording or rendering metrics.
///
/// None of these ever reach an HTTP client: callers on the request path
/// log them at debug level and drop the sample.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("unknown metric '{0}'")]
    UnknownMetric(&'static str),

    #[error("metric '{metric}' expects labels [{expected}], got [{got}]")]
    LabelMismatch {
        metric: &'static str,
        expected: String,
        got: String,
    },

    #[error("metric '{metric}' does not accept a {measurement} measurement")]
    KindMismatch {
        metric: &'static str,
        measurement: &'static str,
    },

    #[error("counter '{0}' cannot be decreased")]
    NegativeIncrement(&'static str),

    #[error("label cardinality exceeded for metric '{metric}': limit is {limit} series")]
    CardinalityExceeded { metric: &'static str, limit: usize },

    #[error("prometheus: {0}")]
    Prometheus(#[from] prometheus::Error),

    #[error("exposition is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}

/// Result type for metrics operations
pub type MetricsResult<T> = Result<T, MetricsError>;
