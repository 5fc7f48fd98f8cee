//! Fetcher trait definition.

use async_trait::async_trait;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use super::FetchError;

/// Performs a single URL fetch and decodes the body as JSON.
///
/// Implementations must return promptly once `cancel` fires, with
/// [`FetchError::Cancelled`] and no partial value.
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Returns the fetcher name for logging.
    fn name(&self) -> &str;

    /// Fetch `url` and decode the response body as a generic JSON value.
    async fn fetch(&self, url: &str, cancel: &CancellationToken) -> Result<Value, FetchError>;
}
