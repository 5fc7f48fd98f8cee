//! Batch download orchestration.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};

use crate::config::DownloaderConfig;
use crate::fetcher::Fetcher;
use crate::metrics::{BATCHES_TOTAL, BATCH_DURATION, BATCH_SIZE};

use super::aggregator::collect;
use super::dispatcher::dispatch;
use super::pool::WorkerPool;
use super::types::{BatchId, DownloadError, FetchedResponse};

/// Runs batches of URL fetches on per-batch worker pools.
///
/// Cloning is cheap; every clone shares the same fetcher.
#[derive(Clone)]
pub struct Downloader {
    fetcher: Arc<dyn Fetcher>,
    config: DownloaderConfig,
}

impl std::fmt::Debug for Downloader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Downloader")
            .field("fetcher", &self.fetcher.name())
            .field("config", &self.config)
            .finish()
    }
}

impl Downloader {
    pub fn new(fetcher: Arc<dyn Fetcher>, config: DownloaderConfig) -> Self {
        Self { fetcher, config }
    }

    pub fn config(&self) -> &DownloaderConfig {
        &self.config
    }

    pub fn fetcher_name(&self) -> &str {
        self.fetcher.name()
    }

    /// Fetch every URL and return the decoded values in completion order.
    ///
    /// The first failing URL cancels the rest and its error is returned.
    /// Cancelling `parent` ends the batch with [`DownloadError::Cancelled`].
    /// Workers still busy when this returns are reaped in the background.
    pub async fn download(
        &self,
        parent: &CancellationToken,
        urls: Vec<String>,
    ) -> Result<Vec<FetchedResponse>, DownloadError> {
        let batch_id = BatchId::new();
        let expected = urls.len();
        let span = info_span!("batch", batch_id = %batch_id, urls = expected);

        if expected == 0 {
            return Ok(Vec::new());
        }

        let started = Instant::now();
        BATCH_SIZE.observe(expected as f64);

        let result = self
            .run(batch_id, parent, urls)
            .instrument(span.clone())
            .await;

        let label = match &result {
            Ok(_) => "success",
            Err(e) => e.kind(),
        };
        BATCHES_TOTAL.with_label_values(&[label]).inc();
        BATCH_DURATION
            .with_label_values(&[label])
            .observe(started.elapsed().as_secs_f64());

        let elapsed_ms = started.elapsed().as_millis() as u64;
        span.in_scope(|| match &result {
            Ok(responses) => info!(responses = responses.len(), elapsed_ms, "Batch complete"),
            Err(DownloadError::Cancelled) => info!(elapsed_ms, "Batch cancelled"),
            Err(e) => warn!(
                url = e.failed_url().unwrap_or("-"),
                error = %e,
                elapsed_ms,
                "Batch failed"
            ),
        });

        result
    }

    async fn run(
        &self,
        batch_id: BatchId,
        parent: &CancellationToken,
        urls: Vec<String>,
    ) -> Result<Vec<FetchedResponse>, DownloadError> {
        let expected = urls.len();
        let batch = parent.child_token();
        // Fires on every exit, including this future being dropped.
        let _guard = batch.clone().drop_guard();

        let (sink, results) = mpsc::channel(expected);
        let pool_size = self.config.workers.min(expected);
        let (pool, intake) = WorkerPool::start(
            batch_id,
            pool_size,
            self.config.dispatch,
            Arc::clone(&self.fetcher),
        );

        let dispatcher = tokio::spawn(
            dispatch(
                batch_id,
                intake,
                urls,
                sink,
                batch.clone(),
                self.config.dispatch_poll_interval(),
            )
            .in_current_span(),
        );
        debug!(workers = pool_size, strategy = ?self.config.dispatch, "Dispatching");

        let result = collect(&batch, expected, results).await;
        batch.cancel();

        tokio::spawn(
            async move {
                if let Err(e) = dispatcher.await {
                    if e.is_panic() {
                        warn!("Dispatcher panicked: {}", e);
                    }
                }
                pool.join().await;
            }
            .in_current_span(),
        );

        result
    }
}
