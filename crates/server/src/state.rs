use batchfetch_core::{AdmissionLimiter, Config, Downloader};
use tokio_util::sync::CancellationToken;

/// Shared application state
pub struct AppState {
    config: Config,
    limiter: AdmissionLimiter,
    downloader: Downloader,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(
        config: Config,
        limiter: AdmissionLimiter,
        downloader: Downloader,
        shutdown: CancellationToken,
    ) -> Self {
        Self {
            config,
            limiter,
            downloader,
            shutdown,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn limiter(&self) -> &AdmissionLimiter {
        &self.limiter
    }

    pub fn downloader(&self) -> &Downloader {
        &self.downloader
    }

    /// Root token every batch derives from; cancelled on shutdown.
    pub fn shutdown_token(&self) -> &CancellationToken {
        &self.shutdown
    }
}
