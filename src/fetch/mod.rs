//! Remote image fetching
//!
//! [`ImageFetcher`] is the seam between the batch and the network. The
//! production [`HttpFetcher`] wraps a shared `reqwest::Client` with the
//! configured timeout; tests plug in fakes or point it at a mock server.

mod batch;

pub use batch::{BatchFetcher, FetchedBatch};

use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};
use async_trait::async_trait;
use std::time::Duration;

/// Retrieves the bytes behind an image URL
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the full body of `url`
    ///
    /// # Errors
    ///
    /// Returns a classified [`FetchError`] for malformed URLs, timeouts,
    /// connection failures, non-success statuses and body read failures.
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError>;

    /// Human-readable name for logging
    fn name(&self) -> &'static str;
}

/// Fetcher backed by a pooled HTTP client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Build a fetcher from configuration
    ///
    /// The timeout covers the whole request, body included.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| Error::Other(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            timeout: config.timeout,
        })
    }

    fn classify(&self, url: &str, e: reqwest::Error) -> FetchError {
        if e.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
                timeout_secs: self.timeout.as_secs(),
            }
        } else if e.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                reason: e.to_string(),
            }
        } else {
            FetchError::Transport {
                url: url.to_string(),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl ImageFetcher for HttpFetcher {
    async fn get(&self, url: &str) -> std::result::Result<Vec<u8>, FetchError> {
        let parsed = url::Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| {
            if e.is_timeout() {
                self.classify(url, e)
            } else {
                FetchError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        Ok(body.to_vec())
    }

    fn name(&self) -> &'static str {
        "http"
    }
}
