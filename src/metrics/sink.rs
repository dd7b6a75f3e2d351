//! Secondary destinations for metric samples.

use super::sample::MetricSample;

/// A best-effort destination that receives every sample the registry accepted.
///
/// `submit` runs on the request path: it must not block, fail, or await.
pub trait MetricsSink: Send + Sync {
    fn submit(&self, sample: &MetricSample);
}

/// Sink used when no push backend is configured.
pub struct NoSink;

impl MetricsSink for NoSink {
    fn submit(&self, _sample: &MetricSample) {}
}
