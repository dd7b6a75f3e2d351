//! Client for the upstream price service.

use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;
use tracing::debug;

use crate::config::PriceServiceConfig;

#[derive(Debug, thiserror::Error)]
pub enum PriceError {
    #[error("invalid price service URL: {0}")]
    InvalidUrl(String),

    #[error("price request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("price service answered {0}")]
    Status(reqwest::StatusCode),
}

#[derive(Deserialize)]
struct PriceResponse {
    price: f64,
}

#[derive(Clone)]
pub struct PriceClient {
    http: reqwest::Client,
    base_url: Url,
}

impl PriceClient {
    pub fn new(config: &PriceServiceConfig) -> Result<Self, PriceError> {
        let base_url =
            Url::parse(&config.url).map_err(|e| PriceError::InvalidUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(PriceError::InvalidUrl(config.url.clone()));
        }
        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(PriceClient { http, base_url })
    }

    /// `{base}/price/{item}` with the item percent-encoded as one segment.
    fn price_url(&self, item: &str) -> Result<Url, PriceError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| PriceError::InvalidUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .push("price")
            .push(item);
        Ok(url)
    }

    /// Queries the upstream price for `item`.
    pub async fn fetch(&self, item: &str) -> Result<f64, PriceError> {
        let url = self.price_url(item)?;
        debug!("Sending price request to: {}", url);

        let response = self.http.get(url).send().await?;
        if !response.status().is_success() {
            return Err(PriceError::Status(response.status()));
        }
        let body: PriceResponse = response.json().await?;
        Ok(body.price)
    }
}
