//! reqwest-backed fetcher implementation.

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;
use std::error::Error as _;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::{FetchError, Fetcher};

/// Production fetcher issuing plain HTTP GET requests.
///
/// A single `reqwest::Client` (and its connection pool) is shared by every
/// fetch; the configured timeout covers connect, headers and body.
#[derive(Debug, Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
}

impl ReqwestFetcher {
    /// Create a fetcher whose requests abort after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client, timeout })
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn classify(&self, url: &str, err: reqwest::Error) -> FetchError {
        if err.is_timeout() {
            return FetchError::Timeout {
                url: url.to_string(),
                timeout: self.timeout,
            };
        }
        if err.is_builder() {
            return FetchError::request_construction(url, err);
        }

        let reason = match err.source() {
            Some(source) => format!("{}: {}", err, source),
            None => err.to_string(),
        };
        FetchError::network(url, reason)
    }

    async fn exchange(&self, url: &str) -> Result<Value, FetchError> {
        let parsed = Url::parse(url).map_err(|e| FetchError::request_construction(url, e))?;
        let request = self
            .client
            .get(parsed)
            .build()
            .map_err(|e| FetchError::request_construction(url, e))?;

        let response = self
            .client
            .execute(request)
            .await
            .map_err(|e| self.classify(url, e))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| self.classify(url, e))?;

        debug!(
            url = url,
            status = status.as_u16(),
            body_len = body.len(),
            "Fetched response body"
        );

        serde_json::from_slice(&body).map_err(|e| FetchError::decode(url, e))
    }
}

#[async_trait]
impl Fetcher for ReqwestFetcher {
    fn name(&self) -> &str {
        "reqwest"
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Value, FetchError> {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(FetchError::cancelled(url)),
            result = self.exchange(url) => result,
        }
    }
}
