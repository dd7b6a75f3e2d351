use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Settings for the DogStatsD push sink.
///
/// The sink is off unless `enabled` is set, either in the YAML or through
/// `ORDERPULSE_STATSD__ENABLED=true`.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct StatsdConfig {
    pub enabled: bool,
    pub host: String,
    pub port: u16,
    /// Prepended to every metric name, e.g. "orderpulse."
    pub prefix: String,
    /// Lines buffered before the oldest ones are dropped.
    pub queue_capacity: usize,
}

impl Default for StatsdConfig {
    fn default() -> Self {
        StatsdConfig {
            enabled: false,
            host: "localhost".to_string(),
            port: 8125,
            prefix: "orderpulse.".to_string(),
            queue_capacity: 4096,
        }
    }
}

impl StatsdConfig {
    pub fn target(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
