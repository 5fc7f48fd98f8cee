//! Types for the batch downloader.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::fetcher::FetchError;

/// Identifier of one batch, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BatchId(Uuid);

impl BatchId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for BatchId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for BatchId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One URL handed to exactly one worker.
#[derive(Debug)]
pub struct FetchTask {
    pub url: String,
    pub cancel: CancellationToken,
    /// Write end of the batch result channel.
    pub sink: mpsc::Sender<FetchOutcome>,
}

/// Result of fetching one URL, as produced by a worker.
#[derive(Debug)]
pub struct FetchOutcome {
    pub url: String,
    pub result: Result<Value, FetchError>,
}

/// A successfully fetched and decoded URL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FetchedResponse {
    pub url: String,
    pub value: Value,
}

/// Terminal error of a batch.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// One URL failed; the whole batch fails with its error.
    #[error("{source}")]
    Fetch {
        url: String,
        #[source]
        source: FetchError,
    },

    /// The caller's token was cancelled before every outcome arrived.
    #[error("request cancelled")]
    Cancelled,

    /// Every worker stopped before all outcomes were produced.
    #[error("batch ended after {received} of {expected} outcomes")]
    Incomplete { expected: usize, received: usize },
}

impl DownloadError {
    /// Label used for batch metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Fetch { .. } => "failed",
            Self::Cancelled => "cancelled",
            Self::Incomplete { .. } => "incomplete",
        }
    }

    /// URL whose failure ended the batch, if any.
    pub fn failed_url(&self) -> Option<&str> {
        match self {
            Self::Fetch { url, .. } => Some(url),
            _ => None,
        }
    }
}
