//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with a mock fetcher injected, so batches run without real endpoints.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use batchfetch_core::{
    testing::MockFetcher, AdmissionLimiter, Config, Downloader, DownloaderConfig, ServerConfig,
};
use batchfetch_server::state::AppState;

/// Re-export fixtures for test convenience
#[allow(unused_imports)]
pub use batchfetch_core::testing::fixtures;

/// Test fixture for API testing with a mock fetcher.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_download() {
///     let fixture = TestFixture::new();
///     fixture.fetcher.set_response("http://a", json!({"k": "v"})).await;
///
///     let response = fixture.post("/", json!(["http://a"])).await;
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock fetcher - configure per-URL responses
    pub fetcher: Arc<MockFetcher>,
    /// Admission limiter shared with the router
    pub limiter: AdmissionLimiter,
    /// Root token handed to every batch
    pub shutdown: CancellationToken,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

/// Knobs for the fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    pub workers: usize,
    pub max_concurrent_batches: usize,
    pub max_urls_per_batch: usize,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            max_concurrent_batches: 100,
            max_urls_per_batch: 20,
        }
    }
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with default settings.
    pub fn new() -> Self {
        Self::with_config(TestConfig::default())
    }

    /// Create a test fixture with custom configuration.
    pub fn with_config(test_config: TestConfig) -> Self {
        let fetcher = Arc::new(MockFetcher::new());

        let mut config = Config {
            server: ServerConfig {
                host: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
                port: 0, // Not used for in-process testing
                max_urls_per_batch: test_config.max_urls_per_batch,
            },
            downloader: DownloaderConfig {
                workers: test_config.workers,
                ..Default::default()
            },
            ..Default::default()
        };
        config.admission.max_concurrent_batches = test_config.max_concurrent_batches;

        let limiter = AdmissionLimiter::new(config.admission.max_concurrent_batches);
        let downloader = Downloader::new(fetcher.clone(), config.downloader.clone());
        let shutdown = CancellationToken::new();

        let state = Arc::new(AppState::new(
            config,
            limiter.clone(),
            downloader,
            shutdown.clone(),
        ));
        let router = batchfetch_server::api::create_router(state);

        Self {
            router,
            fetcher,
            limiter,
            shutdown,
        }
    }

    /// Send a GET request to the test server.
    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, Body::empty(), None).await
    }

    /// Send a POST request with JSON body.
    pub async fn post(&self, path: &str, body: Value) -> TestResponse {
        self.request(
            "POST",
            path,
            Body::from(body.to_string()),
            Some("application/json"),
        )
        .await
    }

    /// Send a POST request with raw string body (for testing malformed JSON).
    pub async fn post_raw(&self, path: &str, body: &str) -> TestResponse {
        self.request(
            "POST",
            path,
            Body::from(body.to_string()),
            Some("application/json"),
        )
        .await
    }

    /// Send a request with an arbitrary method and no body.
    pub async fn send_empty(&self, method: &str, path: &str) -> TestResponse {
        self.request(method, path, Body::empty(), None).await
    }

    /// Fetch the raw `/metrics` text.
    pub async fn metrics_text(&self) -> String {
        let request = Request::builder()
            .uri("/metrics")
            .body(Body::empty())
            .unwrap();
        let response = self.router.clone().oneshot(request).await.unwrap();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn request(
        &self,
        method: &str,
        path: &str,
        body: Body,
        content_type: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(content_type) = content_type {
            builder = builder.header("Content-Type", content_type);
        }
        let request = builder.body(body).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        TestResponse { status, body }
    }
}
