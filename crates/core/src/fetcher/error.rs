//! Error types for single-URL fetches.

use std::time::Duration;
use thiserror::Error;

/// Errors that can occur while fetching one URL.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The URL could not be parsed or the request could not be built.
    #[error("invalid request for {url}: {reason}")]
    RequestConstruction { url: String, reason: String },

    /// Transport-level failure (DNS, connect, reset, body read).
    #[error("request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    /// The per-attempt timeout elapsed.
    #[error("request to {url} timed out after {timeout:?}")]
    Timeout { url: String, timeout: Duration },

    /// The response body is not valid JSON.
    #[error("response from {url} is not valid JSON: {reason}")]
    Decode { url: String, reason: String },

    /// The batch was cancelled before the response completed.
    #[error("request to {url} was cancelled")]
    Cancelled { url: String },
}

impl FetchError {
    pub fn request_construction(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::RequestConstruction {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn network(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn decode(url: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            url: url.into(),
            reason: reason.to_string(),
        }
    }

    pub fn cancelled(url: impl Into<String>) -> Self {
        Self::Cancelled { url: url.into() }
    }

    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::RequestConstruction { .. } => "request_construction",
            Self::Network { .. } => "network",
            Self::Timeout { .. } => "timeout",
            Self::Decode { .. } => "decode",
            Self::Cancelled { .. } => "cancelled",
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled { .. })
    }
}
