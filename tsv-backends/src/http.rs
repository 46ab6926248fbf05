//! Remote simulation service over HTTP
//!
//! The service exposes two endpoints:
//! - `POST /simulations` with an empty JSON object creates a simulation and
//!   answers with its `Location` and the initial `cars`
//! - `GET <Location>` answers with the current `cars`, advancing the
//!   simulation by one step

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tsv_core::{Provisioned, SimulationBackend, Snapshot, SyncError};

/// Default request timeout; a poll slower than this counts as a dropped tick
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_timeout(base_url, DEFAULT_TIMEOUT)
    }

    pub fn with_timeout(base_url: impl Into<String>, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(concat!("TrafficScope/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Resolve a location returned by the service against the base URL
    pub fn resolve(&self, location: &str) -> String {
        if location.starts_with("http://") || location.starts_with("https://") {
            location.to_string()
        } else if location.starts_with('/') {
            format!("{}{}", self.base_url, location)
        } else {
            format!("{}/{}", self.base_url, location)
        }
    }

    async fn read_json<T: DeserializeOwned>(
        url: &str,
        response: reqwest::Response,
    ) -> Result<T, SyncError> {
        let status = response.status();
        if !status.is_success() {
            return Err(SyncError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;
        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl SimulationBackend for HttpBackend {
    fn name(&self) -> &str {
        "HTTP"
    }

    async fn create_simulation(&self) -> Result<Provisioned, SyncError> {
        let url = format!("{}/simulations", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({}))
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        let provisioned: Provisioned = Self::read_json(&url, response).await?;
        tracing::debug!(
            "Created simulation at {} with {} cars",
            provisioned.location,
            provisioned.cars.len()
        );
        Ok(provisioned)
    }

    async fn fetch_snapshot(&self, location: &str) -> Result<Snapshot, SyncError> {
        let url = self.resolve(location);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| SyncError::Transport(e.to_string()))?;

        Self::read_json(&url, response).await
    }
}
