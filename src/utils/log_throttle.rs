use std::time::{Duration, Instant};

/// Rate-limits a repeating log event to one emission per window.
///
/// Owned by the task that logs, so no locking is involved.
#[derive(Debug)]
pub struct LogThrottle {
    interval: Duration,
    window_started_at: Option<Instant>,
    suppressed: u64,
}

impl LogThrottle {
    pub fn new(interval: Duration) -> Self {
        LogThrottle {
            interval,
            window_started_at: None,
            suppressed: 0,
        }
    }

    /// Returns `Some(suppressed_count)` when the event should be logged,
    /// otherwise `None` and the event is counted as suppressed for the active window.
    pub fn should_emit(&mut self) -> Option<u64> {
        let now = Instant::now();
        match self.window_started_at {
            Some(started) if now.duration_since(started) < self.interval => {
                self.suppressed += 1;
                None
            }
            _ => {
                let suppressed = self.suppressed;
                self.window_started_at = Some(now);
                self.suppressed = 0;
                Some(suppressed)
            }
        }
    }
}
