//! DogStatsD push sink.
//!
//! `submit` formats a line and pushes it onto a bounded queue; a background
//! task drains the queue into UDP datagrams. When the queue is full the
//! oldest line is dropped. Nothing on the request path waits for the
//! network.

use std::collections::VecDeque;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::sample::{Measurement, MetricSample};
use super::sink::MetricsSink;
use crate::config::{ServiceConfig, StatsdConfig};
use crate::utils::log_throttle::LogThrottle;

/// Largest datagram we build; fits a 1500-byte MTU with headroom.
pub const MAX_DATAGRAM_BYTES: usize = 1432;

const FAILURE_LOG_WINDOW: Duration = Duration::from_secs(30);

/// Bounded FIFO that evicts its oldest line when full.
pub(crate) struct SinkQueue {
    lines: Mutex<VecDeque<String>>,
    capacity: usize,
    dropped: AtomicU64,
    notify: Notify,
}

impl SinkQueue {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        SinkQueue {
            lines: Mutex::new(VecDeque::with_capacity(capacity)),
            capacity,
            dropped: AtomicU64::new(0),
            notify: Notify::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, VecDeque<String>> {
        match self.lines.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub(crate) fn push(&self, line: String) {
        {
            let mut lines = self.lock();
            if lines.len() >= self.capacity {
                lines.pop_front();
                self.dropped.fetch_add(1, Ordering::Relaxed);
            }
            lines.push_back(line);
        }
        self.notify.notify_one();
    }

    pub(crate) fn drain(&self) -> Vec<String> {
        self.lock().drain(..).collect()
    }

    pub(crate) fn len(&self) -> usize {
        self.lock().len()
    }

    pub(crate) fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Reports queue evictions at most once per throttle window.
struct DropReporter {
    reported: u64,
    throttle: LogThrottle,
}

impl DropReporter {
    fn new(window: Duration) -> Self {
        DropReporter {
            reported: 0,
            throttle: LogThrottle::new(window),
        }
    }

    /// Lines dropped since the last report, when there are any and a report is due.
    fn due(&mut self, dropped_total: u64) -> Option<u64> {
        if dropped_total <= self.reported {
            return None;
        }
        self.throttle.should_emit()?;
        let newly_dropped = dropped_total - self.reported;
        self.reported = dropped_total;
        Some(newly_dropped)
    }
}

/// Best-effort DogStatsD sink backed by a background tokio task.
pub struct StatsdSink {
    prefix: String,
    global_tags: String,
    queue: Arc<SinkQueue>,
    worker: JoinHandle<()>,
}

impl StatsdSink {
    /// Starts the sender task. Must be called from within a tokio runtime.
    pub fn spawn(config: &StatsdConfig, service: &ServiceConfig) -> Self {
        let queue = Arc::new(SinkQueue::new(config.queue_capacity));
        let target = config.target();
        info!(
            event_name = "metrics.statsd.started",
            event_domain = "metrics",
            target = target.as_str(),
            queue_capacity = config.queue_capacity,
            "DogStatsD sink enabled"
        );
        let worker = tokio::spawn(run_sender(target, queue.clone()));

        StatsdSink {
            prefix: config.prefix.clone(),
            global_tags: format!(
                "service:{},env:{},version:{}",
                sanitize_tag(&service.name),
                sanitize_tag(&service.environment),
                sanitize_tag(&service.version)
            ),
            queue,
            worker,
        }
    }

    /// Formats a sample as a DogStatsD line, or `None` if the metric is not
    /// forwarded.
    pub fn format_line(&self, sample: &MetricSample) -> Option<String> {
        let mapping = sample.def.statsd.as_ref()?;
        let scaled = sample.value() * mapping.scale;
        let value = match sample.measurement {
            Measurement::GaugeAdd(_) if scaled >= 0.0 => format!("+{}", scaled),
            _ => scaled.to_string(),
        };

        let mut line = format!(
            "{}{}:{}|{}|#{}",
            self.prefix,
            mapping.name,
            value,
            mapping.kind.code(),
            self.global_tags
        );
        for (key, value) in sample.labels.iter() {
            line.push(',');
            line.push_str(key.as_str());
            line.push(':');
            line.push_str(&sanitize_tag(value));
        }
        Some(line)
    }

    /// Lines waiting to be sent.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Lines evicted because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.queue.dropped()
    }
}

impl MetricsSink for StatsdSink {
    fn submit(&self, sample: &MetricSample) {
        if let Some(line) = self.format_line(sample) {
            self.queue.push(line);
        }
    }
}

impl Drop for StatsdSink {
    fn drop(&mut self) {
        self.worker.abort();
    }
}

/// DogStatsD reserves these characters inside tags.
fn sanitize_tag(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            '|' | ',' | '#' | '\n' | '\r' => '_',
            other => other,
        })
        .collect()
}

/// Joins lines into newline-separated payloads no larger than
/// [`MAX_DATAGRAM_BYTES`]. An oversized single line travels alone.
fn pack_datagrams(lines: &[String]) -> Vec<String> {
    let mut datagrams = Vec::new();
    let mut current = String::new();
    for line in lines {
        if !current.is_empty() && current.len() + 1 + line.len() > MAX_DATAGRAM_BYTES {
            datagrams.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push('\n');
        }
        current.push_str(line);
    }
    if !current.is_empty() {
        datagrams.push(current);
    }
    datagrams
}

async fn open_socket(target: &str) -> io::Result<(UdpSocket, SocketAddr)> {
    let addr = tokio::net::lookup_host(target)
        .await?
        .next()
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "no address for statsd target"))?;
    let bind = if addr.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(bind).await?;
    Ok((socket, addr))
}

async fn run_sender(target: String, queue: Arc<SinkQueue>) {
    let mut throttle = LogThrottle::new(FAILURE_LOG_WINDOW);
    let mut drops = DropReporter::new(FAILURE_LOG_WINDOW);
    let mut socket: Option<(UdpSocket, SocketAddr)> = None;

    loop {
        queue.notify.notified().await;
        let lines = queue.drain();
        let dropped_total = queue.dropped();
        if let Some(newly_dropped) = drops.due(dropped_total) {
            debug!(
                event_name = "metrics.statsd.lines_dropped",
                event_domain = "metrics",
                target = target.as_str(),
                newly_dropped,
                dropped_total,
                "DogStatsD queue full, oldest lines dropped"
            );
        }
        if lines.is_empty() {
            continue;
        }

        if socket.is_none() {
            match open_socket(&target).await {
                Ok(opened) => socket = Some(opened),
                Err(e) => {
                    if let Some(suppressed_count) = throttle.should_emit() {
                        debug!(
                            event_name = "metrics.statsd.unreachable",
                            event_domain = "metrics",
                            target = target.as_str(),
                            error = %e,
                            discarded = lines.len(),
                            suppressed_count,
                            "could not open DogStatsD socket, discarding batch"
                        );
                    }
                    continue;
                }
            }
        }

        let Some((sock, addr)) = socket.as_ref() else {
            continue;
        };
        for datagram in pack_datagrams(&lines) {
            if let Err(e) = sock.send_to(datagram.as_bytes(), addr).await {
                if let Some(suppressed_count) = throttle.should_emit() {
                    debug!(
                        event_name = "metrics.statsd.send_failed",
                        event_domain = "metrics",
                        target = target.as_str(),
                        error = %e,
                        suppressed_count,
                        "DogStatsD send failed"
                    );
                }
            }
        }
    }
}
