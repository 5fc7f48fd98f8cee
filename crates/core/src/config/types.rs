use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::time::Duration;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admission: AdmissionConfig,
    #[serde(default)]
    pub downloader: DownloaderConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Upper bound on the number of URLs accepted in one batch request.
    #[serde(default = "default_max_urls_per_batch")]
    pub max_urls_per_batch: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            max_urls_per_batch: default_max_urls_per_batch(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    8080
}

fn default_max_urls_per_batch() -> usize {
    20
}

/// Admission control configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AdmissionConfig {
    /// Maximum number of batches served at the same time.
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_concurrent_batches: default_max_concurrent_batches(),
        }
    }
}

fn default_max_concurrent_batches() -> usize {
    100
}

/// How the dispatcher hands URLs to the worker pool.
#[derive(Debug, Clone, Copy, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStrategy {
    /// One intake channel per worker, scanned round-robin with non-blocking handoffs.
    #[default]
    RoundRobin,
    /// A single bounded queue consumed by every worker.
    SharedQueue,
}

/// Per-batch downloader configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DownloaderConfig {
    /// Number of workers started for each batch.
    #[serde(default = "default_workers")]
    pub workers: usize,
    /// Timeout applied to every single fetch (milliseconds).
    #[serde(default = "default_fetch_timeout_ms")]
    pub fetch_timeout_ms: u64,
    #[serde(default)]
    pub dispatch: DispatchStrategy,
    /// Pause between two unsuccessful round-robin scans (milliseconds).
    #[serde(default = "default_dispatch_poll_interval_ms")]
    pub dispatch_poll_interval_ms: u64,
}

impl DownloaderConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    pub fn dispatch_poll_interval(&self) -> Duration {
        Duration::from_millis(self.dispatch_poll_interval_ms)
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            fetch_timeout_ms: default_fetch_timeout_ms(),
            dispatch: DispatchStrategy::default(),
            dispatch_poll_interval_ms: default_dispatch_poll_interval_ms(),
        }
    }
}

fn default_workers() -> usize {
    4
}

fn default_fetch_timeout_ms() -> u64 {
    1000
}

fn default_dispatch_poll_interval_ms() -> u64 {
    1
}
