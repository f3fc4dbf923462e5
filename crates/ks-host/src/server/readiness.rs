//! Readiness polling against the server's ready endpoint.

use crate::server::{ServerError, ServerResult};

use std::panic::Location;
use std::time::{Duration, Instant};

use error_location::ErrorLocation;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const REQUEST_TIMEOUT: Duration = Duration::from_millis(1000);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Body of the ready endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReadyResponse {
    pub status: String,
    pub version: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessStatus {
    Ready { latency_ms: u64, version: String },
    NotReady { last_error: String },
}

impl ReadinessStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready { .. })
    }
}

pub struct ReadinessProbe {
    client: reqwest::Client,
    url: String,
    poll_interval: Duration,
}

impl ReadinessProbe {
    /// Probe `<base_url><ready_path>`.
    pub fn new(base_url: &str, ready_path: &str) -> ServerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .pool_max_idle_per_host(1)
            .build()?;

        Ok(Self {
            client,
            url: format!("{}{}", base_url.trim_end_matches('/'), ready_path),
            poll_interval: DEFAULT_POLL_INTERVAL,
        })
    }

    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Perform a single readiness check.
    pub async fn check(&self) -> ReadinessStatus {
        let start = Instant::now();

        let response = match self.client.get(&self.url).send().await {
            Ok(response) => response,
            Err(e) => {
                return ReadinessStatus::NotReady {
                    last_error: e.to_string(),
                };
            }
        };

        if !response.status().is_success() {
            return ReadinessStatus::NotReady {
                last_error: format!("HTTP {}", response.status()),
            };
        }

        match response.json::<ReadyResponse>().await {
            Ok(body) => ReadinessStatus::Ready {
                latency_ms: start.elapsed().as_millis() as u64,
                version: body.version,
            },
            Err(e) => ReadinessStatus::NotReady {
                last_error: format!("Invalid response: {e}"),
            },
        }
    }

    /// Poll until the server reports ready or `timeout` elapses.
    pub async fn wait_ready(&self, timeout: Duration) -> ServerResult<ReadinessStatus> {
        let start = Instant::now();

        loop {
            let status = self.check().await;
            match &status {
                ReadinessStatus::Ready { version, .. } => {
                    info!("Server ready at {} (version {version})", self.url);
                    return Ok(status);
                }
                ReadinessStatus::NotReady { last_error } => {
                    debug!("Server not ready yet: {last_error}");
                }
            }

            if start.elapsed() >= timeout {
                return Err(ServerError::StartupTimeout {
                    timeout_secs: timeout.as_secs(),
                    location: ErrorLocation::from(Location::caller()),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }
}
