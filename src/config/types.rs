use std::path::PathBuf;

use figment::providers::{Env, Format, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;
use super::statsd::StatsdConfig;
use super::store::StoreConfig;

/// Environment variable naming an alternative config file.
pub const CONFIG_PATH_ENV: &str = "ORDERPULSE_CONFIG";

/// Prefix for environment overrides, e.g. `ORDERPULSE_STATSD__ENABLED=true`.
pub const ENV_PREFIX: &str = "ORDERPULSE_";

/// A top-level enum for versioned configurations.
#[derive(Deserialize, Serialize, JsonSchema)]
#[serde(tag = "version")]
pub enum Config {
    #[serde(rename = "1.0.0")]
    ConfigV1(ConfigV1),
}

/// Main config for v1.0.0.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct ConfigV1 {
    pub bind_address: String,
    #[serde(default)]
    pub service: ServiceConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub statsd: StatsdConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub simulation: SimulationConfig,
    pub price_service: Option<PriceServiceConfig>,
    #[serde(default)]
    pub signup: SignupConfig,
    /// Routes that frontend and mobile clients may report under; anything
    /// else is folded into "other".
    #[serde(default = "default_client_routes")]
    pub client_routes: Vec<String>,
}

/// Location of the YAML config, honouring `ORDERPULSE_CONFIG`.
pub fn config_path() -> PathBuf {
    std::env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("./config.yaml"))
}

/// Load config from the YAML file and layer `ORDERPULSE_*` environment
/// variables on top.
pub fn load_config() -> Result<ConfigV1, figment::Error> {
    let figment = Figment::new().merge(Yaml::file(config_path())).merge(
        Env::prefixed(ENV_PREFIX)
            .ignore(&["config"])
            .split("__"),
    );
    from_figment(figment)
}

/// Extract a versioned config from an arbitrary figment.
pub fn from_figment(figment: Figment) -> Result<ConfigV1, figment::Error> {
    match figment.extract::<Config>()? {
        Config::ConfigV1(c) => Ok(c),
    }
}

/// Print the JSON schema for the configuration to stdout.
pub fn print_schema() -> Result<(), serde_json::Error> {
    let schema = schema_for!(Config);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

/// Identity attached to every metric, log line and StatsD packet.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub version: String,
    pub environment: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        ServiceConfig {
            name: "orderpulse".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            environment: "development".to_string(),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct MetricsConfig {
    /// New label combinations beyond this count are rejected per metric.
    pub max_series_per_metric: usize,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        MetricsConfig {
            max_series_per_metric: 1000,
        }
    }
}

/// Knobs for the simulated order processing.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct SimulationConfig {
    /// Probability in [0, 1] that an order fails with a 500.
    pub failure_rate: f64,
    pub min_latency_ms: u64,
    pub max_latency_ms: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            failure_rate: 0.1,
            min_latency_ms: 10,
            max_latency_ms: 150,
        }
    }
}

/// Upstream service queried by `GET /api/orders/price/:item`.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct PriceServiceConfig {
    pub url: String,
    #[serde(default = "default_price_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
#[serde(default)]
pub struct SignupConfig {
    /// Email domains whose sign-ups are classified as "enterprise".
    pub enterprise_domains: Vec<String>,
}

impl Default for SignupConfig {
    fn default() -> Self {
        SignupConfig {
            enterprise_domains: vec!["company.com".to_string()],
        }
    }
}

fn default_price_timeout_ms() -> u64 {
    2000
}

fn default_client_routes() -> Vec<String> {
    ["/", "/orders", "/orders/new", "/signup"]
        .into_iter()
        .map(String::from)
        .collect()
}
