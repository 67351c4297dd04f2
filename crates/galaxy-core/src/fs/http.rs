//! HTTP fetch capability for API-backed adapters

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client as HttpClient;
use tracing::debug;

use crate::error::{Error, Result};

/// Default request timeout in seconds
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches JSON documents over HTTP
#[async_trait]
pub trait HttpFetcher: Send + Sync {
    /// GET `url` and decode the body as JSON
    ///
    /// Transport failures and non-2xx statuses are `SourceUnavailable`,
    /// an undecodable body is `InvalidSourceFormat`.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value>;
}

/// [`HttpFetcher`] backed by a shared `reqwest` client
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    http_client: HttpClient,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .build()
            .map_err(Error::NetworkError)?;
        Ok(Self { http_client })
    }
}

#[async_trait]
impl HttpFetcher for ReqwestFetcher {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value> {
        debug!(url = %url, "Fetching source");

        let response = self
            .http_client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::unavailable(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::unavailable(url, format!("HTTP {}", status)));
        }

        response
            .json()
            .await
            .map_err(|e| Error::InvalidSourceFormat(format!("Failed to parse response from {}: {}", url, e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetcher_builds() {
        assert!(ReqwestFetcher::new().is_ok());
        assert!(ReqwestFetcher::with_timeout(Duration::from_millis(50)).is_ok());
    }

    #[tokio::test]
    async fn test_unreachable_host_is_unavailable() {
        let fetcher = ReqwestFetcher::with_timeout(Duration::from_millis(500)).unwrap();
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let err = fetcher.get_json("http://127.0.0.1:9/config").await.unwrap_err();
        assert!(err.is_unavailable());
    }
}
