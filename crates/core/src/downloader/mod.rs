//! Batch downloader.
//!
//! A batch runs on its own worker pool:
//! - the dispatcher hands each URL to exactly one worker
//! - workers fetch and write outcomes to the batch result channel
//! - the aggregator returns on the first error or once every URL succeeded
//!
//! The batch token is derived from the caller's token and is cancelled on
//! every exit path, so no worker outlives its batch for longer than one fetch.

mod aggregator;
mod dispatcher;
mod pool;
mod runner;
mod types;

pub use runner::Downloader;
pub use types::{BatchId, DownloadError, FetchOutcome, FetchTask, FetchedResponse};
