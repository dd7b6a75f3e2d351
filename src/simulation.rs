//! Simulated order-processing behaviour: random latency and failures.

use std::time::Duration;

use rand::Rng;

use crate::config::SimulationConfig;

/// Decides whether a simulated operation fails.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FailurePolicy {
    Never,
    Always,
    /// Fails with the given probability, in (0, 1).
    Random(f64),
}

impl FailurePolicy {
    /// Rates at or below 0 (or NaN) never fail; rates at or above 1 always do.
    pub fn from_rate(rate: f64) -> Self {
        if rate.is_nan() || rate <= 0.0 {
            FailurePolicy::Never
        } else if rate >= 1.0 {
            FailurePolicy::Always
        } else {
            FailurePolicy::Random(rate)
        }
    }

    pub fn should_fail(&self) -> bool {
        match *self {
            FailurePolicy::Never => false,
            FailurePolicy::Always => true,
            FailurePolicy::Random(p) => rand::thread_rng().gen_bool(p),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Simulator {
    policy: FailurePolicy,
    min_latency_ms: u64,
    max_latency_ms: u64,
}

impl Simulator {
    pub fn new(policy: FailurePolicy, min_latency_ms: u64, max_latency_ms: u64) -> Self {
        Simulator {
            policy,
            min_latency_ms: min_latency_ms.min(max_latency_ms),
            max_latency_ms: min_latency_ms.max(max_latency_ms),
        }
    }

    pub fn from_config(config: &SimulationConfig) -> Self {
        Self::new(
            FailurePolicy::from_rate(config.failure_rate),
            config.min_latency_ms,
            config.max_latency_ms,
        )
    }

    /// No latency, no failures.
    pub fn disabled() -> Self {
        Self::new(FailurePolicy::Never, 0, 0)
    }

    /// Replaces the failure policy, keeping the latency range.
    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn should_fail(&self) -> bool {
        self.policy.should_fail()
    }

    pub fn latency(&self) -> Duration {
        if self.max_latency_ms == 0 {
            return Duration::ZERO;
        }
        let ms = rand::thread_rng().gen_range(self.min_latency_ms..=self.max_latency_ms);
        Duration::from_millis(ms)
    }

    /// Sleeps for a random duration within the configured range.
    pub async fn delay(&self) {
        let latency = self.latency();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_map_to_policies() {
        assert_eq!(FailurePolicy::from_rate(0.0), FailurePolicy::Never);
        assert_eq!(FailurePolicy::from_rate(-1.0), FailurePolicy::Never);
        assert_eq!(FailurePolicy::from_rate(f64::NAN), FailurePolicy::Never);
        assert_eq!(FailurePolicy::from_rate(1.0), FailurePolicy::Always);
        assert_eq!(FailurePolicy::from_rate(0.1), FailurePolicy::Random(0.1));
    }

    #[test]
    fn pinned_policies_are_deterministic() {
        assert!((0..100).all(|_| FailurePolicy::Always.should_fail()));
        assert!((0..100).all(|_| !FailurePolicy::Never.should_fail()));
    }

    #[test]
    fn latency_stays_in_range() {
        let simulator = Simulator::new(FailurePolicy::Never, 30, 10);
        for _ in 0..100 {
            let ms = simulator.latency().as_millis();
            assert!((10..=30).contains(&ms), "latency {}ms out of range", ms);
        }
        assert_eq!(Simulator::disabled().latency(), Duration::ZERO);
    }

    #[test]
    fn with_policy_overrides_config() {
        let simulator = Simulator::from_config(&SimulationConfig::default())
            .with_policy(FailurePolicy::Always);
        assert!(simulator.should_fail());
    }
}
