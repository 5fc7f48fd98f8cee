//! Testing utilities and mock implementations.
//!
//! [`MockFetcher`] stands in for the HTTP fetcher so downloader and server
//! tests run without real endpoints.
//!
//! # Example
//!
//! ```rust,ignore
//! use batchfetch_core::testing::{fixtures, MockFetcher};
//!
//! let fetcher = MockFetcher::new();
//! fetcher.set_default_delay(Duration::from_millis(10)).await;
//!
//! let downloader = Downloader::new(Arc::new(fetcher), fixtures::downloader_config(2));
//! ```

mod mock_fetcher;

pub use mock_fetcher::{MockFetcher, RecordedFetch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::config::{DispatchStrategy, DownloaderConfig};

    /// Downloader config with `workers` workers and round-robin dispatch.
    pub fn downloader_config(workers: usize) -> DownloaderConfig {
        DownloaderConfig {
            workers,
            ..Default::default()
        }
    }

    /// Downloader config with `workers` workers sharing one queue.
    pub fn shared_queue_config(workers: usize) -> DownloaderConfig {
        DownloaderConfig {
            workers,
            dispatch: DispatchStrategy::SharedQueue,
            ..Default::default()
        }
    }

    /// Owned URL list from string literals.
    pub fn urls(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }
}
