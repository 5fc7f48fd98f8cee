pub mod admission;
pub mod config;
pub mod downloader;
pub mod fetcher;
pub mod metrics;
pub mod testing;

pub use admission::{AdmissionLimiter, AdmissionPermit, AdmissionStatus};
pub use config::{
    load_config, load_config_from_str, validate_config, AdmissionConfig, Config, ConfigError,
    DispatchStrategy, DownloaderConfig, ServerConfig,
};
pub use downloader::{BatchId, DownloadError, Downloader, FetchedResponse};
pub use fetcher::{FetchError, Fetcher, ReqwestFetcher};
