use std::sync::Arc;

use tracing::debug;

use super::events::BusinessEvent;
use super::recorder::MetricsRecorder;
use super::sample::MetricSample;
use super::sink::{MetricsSink, NoSink};
use super::MetricsResult;

/// Handle used by the interceptor and handlers to emit samples.
///
/// Samples go to the recorder first; only accepted samples are forwarded to
/// the sink. Neither path can fail the caller.
#[derive(Clone)]
pub struct Telemetry {
    recorder: Arc<dyn MetricsRecorder>,
    sink: Arc<dyn MetricsSink>,
}

impl Telemetry {
    pub fn new(recorder: Arc<dyn MetricsRecorder>, sink: Arc<dyn MetricsSink>) -> Self {
        Telemetry { recorder, sink }
    }

    /// Telemetry without a push sink.
    pub fn local(recorder: Arc<dyn MetricsRecorder>) -> Self {
        Self::new(recorder, Arc::new(NoSink))
    }

    pub fn emit(&self, sample: MetricSample) {
        match self.recorder.record(&sample) {
            Ok(()) => self.sink.submit(&sample),
            Err(e) => debug!(
                event_name = "metrics.sample.rejected",
                event_domain = "metrics",
                metric = sample.name(),
                error = %e,
                "metric sample rejected"
            ),
        }
    }

    pub fn record_event(&self, event: BusinessEvent) {
        for sample in event.samples() {
            self.emit(sample);
        }
    }

    pub fn render(&self) -> MetricsResult<String> {
        self.recorder.render()
    }
}
