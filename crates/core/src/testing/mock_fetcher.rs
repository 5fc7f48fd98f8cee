//! Mock fetcher for testing.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

use crate::fetcher::{FetchError, Fetcher};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedFetch {
    /// The URL that was fetched.
    pub url: String,
    /// When the fetch started.
    pub started_at: Instant,
}

/// Configured behavior for one URL.
#[derive(Debug, Clone)]
struct Scripted {
    result: Result<Value, FetchError>,
    delay: Option<Duration>,
}

/// Mock implementation of the Fetcher trait.
///
/// Provides controllable behavior for testing:
/// - Return configured values or errors per URL
/// - Delay individual URLs (delays observe cancellation)
/// - Track started fetches and the peak number of concurrent fetches
///
/// URLs without a configured response resolve to `{"url": <url>}`.
///
/// # Example
///
/// ```rust,ignore
/// use batchfetch_core::testing::MockFetcher;
///
/// let fetcher = MockFetcher::new();
/// fetcher.set_response("http://a", json!({"k": "v"})).await;
/// fetcher.set_error("http://b", FetchError::network("http://b", "refused")).await;
///
/// let downloader = Downloader::new(Arc::new(fetcher), config);
/// ```
pub struct MockFetcher {
    scripted: Arc<RwLock<HashMap<String, Scripted>>>,
    default_delay: Arc<RwLock<Option<Duration>>>,
    calls: Arc<RwLock<Vec<RecordedFetch>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
}

impl std::fmt::Debug for MockFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockFetcher")
            .field("scripted", &"<scripted>")
            .field("calls", &"<calls>")
            .field("in_flight", &self.in_flight.load(Ordering::SeqCst))
            .field("max_in_flight", &self.max_in_flight.load(Ordering::SeqCst))
            .finish()
    }
}

impl Default for MockFetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockFetcher {
    pub fn new() -> Self {
        Self {
            scripted: Arc::new(RwLock::new(HashMap::new())),
            default_delay: Arc::new(RwLock::new(None)),
            calls: Arc::new(RwLock::new(Vec::new())),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Return `value` for `url`.
    pub async fn set_response(&self, url: &str, value: Value) {
        self.script(url, Ok(value), None).await;
    }

    /// Return `value` for `url` after `delay`.
    pub async fn set_response_with_delay(&self, url: &str, value: Value, delay: Duration) {
        self.script(url, Ok(value), Some(delay)).await;
    }

    /// Fail `url` with `error`.
    pub async fn set_error(&self, url: &str, error: FetchError) {
        self.script(url, Err(error), None).await;
    }

    /// Fail `url` with `error` after `delay`.
    pub async fn set_error_with_delay(&self, url: &str, error: FetchError, delay: Duration) {
        self.script(url, Err(error), Some(delay)).await;
    }

    /// Delay applied to URLs without their own delay.
    pub async fn set_default_delay(&self, delay: Duration) {
        *self.default_delay.write().await = Some(delay);
    }

    async fn script(&self, url: &str, result: Result<Value, FetchError>, delay: Option<Duration>) {
        self.scripted
            .write()
            .await
            .insert(url.to_string(), Scripted { result, delay });
    }

    /// Started fetches, in start order.
    pub async fn calls(&self) -> Vec<RecordedFetch> {
        self.calls.read().await.clone()
    }

    /// URLs of started fetches, in start order.
    pub async fn fetched_urls(&self) -> Vec<String> {
        self.calls
            .read()
            .await
            .iter()
            .map(|call| call.url.clone())
            .collect()
    }

    pub async fn fetch_count(&self) -> usize {
        self.calls.read().await.len()
    }

    /// Fetches currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    /// Highest number of fetches seen running at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

struct InFlightGuard {
    counter: Arc<AtomicUsize>,
}

impl InFlightGuard {
    fn enter(counter: &Arc<AtomicUsize>, peak: &AtomicUsize) -> Self {
        let now = counter.fetch_add(1, Ordering::SeqCst) + 1;
        peak.fetch_max(now, Ordering::SeqCst);
        Self {
            counter: Arc::clone(counter),
        }
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.counter.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Value, FetchError> {
        if cancel.is_cancelled() {
            return Err(FetchError::cancelled(url));
        }

        let _guard = InFlightGuard::enter(&self.in_flight, &self.max_in_flight);
        self.calls.write().await.push(RecordedFetch {
            url: url.to_string(),
            started_at: Instant::now(),
        });

        let scripted = self.scripted.read().await.get(url).cloned();
        let delay = match scripted.as_ref().and_then(|s| s.delay) {
            Some(delay) => Some(delay),
            None => *self.default_delay.read().await,
        };

        if let Some(delay) = delay {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(FetchError::cancelled(url)),
                _ = tokio::time::sleep(delay) => {}
            }
        }

        match scripted {
            Some(scripted) => scripted.result,
            None => Ok(json!({ "url": url })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_url_echoes_url() {
        let fetcher = MockFetcher::new();
        let value = fetcher
            .fetch("http://x", &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(value, json!({"url": "http://x"}));
        assert_eq!(fetcher.fetched_urls().await, vec!["http://x"]);
    }

    #[tokio::test]
    async fn test_scripted_error() {
        let fetcher = MockFetcher::new();
        fetcher
            .set_error("bad", FetchError::decode("bad", "trailing characters"))
            .await;

        let err = fetcher
            .fetch("bad", &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "decode");
    }

    #[tokio::test]
    async fn test_delay_observes_cancellation() {
        let fetcher = MockFetcher::new();
        fetcher
            .set_response_with_delay("slow", json!(1), Duration::from_secs(30))
            .await;
        let cancel = CancellationToken::new();

        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        let err = tokio::time::timeout(Duration::from_secs(1), fetcher.fetch("slow", &cancel))
            .await
            .expect("delay must end on cancellation")
            .unwrap_err();
        assert!(err.is_cancelled());
        assert_eq!(fetcher.in_flight(), 0);
        assert_eq!(fetcher.max_in_flight(), 1);
    }

    #[tokio::test]
    async fn test_already_cancelled_is_not_recorded() {
        let fetcher = MockFetcher::new();
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert!(fetcher.fetch("a", &cancel).await.is_err());
        assert_eq!(fetcher.fetch_count().await, 0);
    }
}
