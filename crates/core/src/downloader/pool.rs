//! Per-batch worker pool.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::sync::Mutex;
use tokio::task::JoinSet;
use tracing::{debug, error, trace, warn};

use crate::config::DispatchStrategy;
use crate::fetcher::Fetcher;
use crate::metrics::{FETCHES_IN_FLIGHT, FETCHES_TOTAL, FETCH_DURATION, OUTCOMES_DISCARDED};

use super::types::{BatchId, FetchOutcome, FetchTask};

/// Write side of the pool's intake, handed to the dispatcher.
pub(crate) enum Intake {
    /// One hand-off slot per worker.
    Dedicated(Vec<WorkerSlot>),
    /// One queue shared by every worker.
    Shared(mpsc::Sender<FetchTask>),
}

/// Dispatcher end of a dedicated worker intake.
///
/// A task is only handed over while the worker is parked waiting for one,
/// so nothing ever queues behind a fetch in progress.
pub(crate) struct WorkerSlot {
    tx: mpsc::Sender<FetchTask>,
    waiting: Arc<AtomicBool>,
}

/// Worker end of a dedicated intake.
pub(crate) struct SlotReceiver {
    rx: mpsc::Receiver<FetchTask>,
    waiting: Arc<AtomicBool>,
}

/// Create a connected slot pair.
pub(crate) fn worker_slot() -> (WorkerSlot, SlotReceiver) {
    let (tx, rx) = mpsc::channel(1);
    let waiting = Arc::new(AtomicBool::new(false));
    (
        WorkerSlot {
            tx,
            waiting: Arc::clone(&waiting),
        },
        SlotReceiver { rx, waiting },
    )
}

impl WorkerSlot {
    /// Hand `task` to the worker if it is idle, otherwise give it back.
    pub(crate) fn try_hand_off(&self, task: FetchTask) -> Result<(), FetchTask> {
        if self
            .waiting
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(task);
        }
        match self.tx.try_send(task) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(task)) => {
                self.waiting.store(true, Ordering::Release);
                Err(task)
            }
            Err(TrySendError::Closed(task)) => Err(task),
        }
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    #[cfg(test)]
    pub(crate) fn is_waiting(&self) -> bool {
        self.waiting.load(Ordering::Acquire)
    }
}

impl SlotReceiver {
    /// Park until the dispatcher hands over a task or the slot closes.
    pub(crate) async fn recv(&mut self) -> Option<FetchTask> {
        self.waiting.store(true, Ordering::Release);
        let task = self.rx.recv().await;
        self.waiting.store(false, Ordering::Release);
        task
    }
}

/// Read side of a worker's intake.
enum TaskSource {
    Dedicated(SlotReceiver),
    Shared(Arc<Mutex<mpsc::Receiver<FetchTask>>>),
}

impl TaskSource {
    async fn next(&mut self) -> Option<FetchTask> {
        match self {
            Self::Dedicated(slot) => slot.recv().await,
            Self::Shared(rx) => rx.lock().await.recv().await,
        }
    }
}

/// A fixed set of workers serving one batch.
///
/// Workers exit once every intake sender is dropped. Dropping the pool
/// aborts any worker still running.
pub(crate) struct WorkerPool {
    batch_id: BatchId,
    workers: JoinSet<()>,
}

impl WorkerPool {
    /// Spawn `size` workers and return the pool with its intake.
    pub(crate) fn start(
        batch_id: BatchId,
        size: usize,
        strategy: DispatchStrategy,
        fetcher: Arc<dyn Fetcher>,
    ) -> (Self, Intake) {
        let size = size.max(1);
        let mut workers = JoinSet::new();

        let intake = match strategy {
            DispatchStrategy::RoundRobin => {
                let mut slots = Vec::with_capacity(size);
                for worker_id in 0..size {
                    let (slot, receiver) = worker_slot();
                    slots.push(slot);
                    workers.spawn(run_worker(
                        batch_id,
                        worker_id,
                        TaskSource::Dedicated(receiver),
                        Arc::clone(&fetcher),
                    ));
                }
                Intake::Dedicated(slots)
            }
            DispatchStrategy::SharedQueue => {
                let (tx, rx) = mpsc::channel(size);
                let rx = Arc::new(Mutex::new(rx));
                for worker_id in 0..size {
                    workers.spawn(run_worker(
                        batch_id,
                        worker_id,
                        TaskSource::Shared(Arc::clone(&rx)),
                        Arc::clone(&fetcher),
                    ));
                }
                Intake::Shared(tx)
            }
        };

        debug!(batch_id = %batch_id, workers = size, ?strategy, "Worker pool started");
        (Self { batch_id, workers }, intake)
    }

    /// Wait for every worker to exit.
    pub(crate) async fn join(mut self) {
        while let Some(joined) = self.workers.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    error!(batch_id = %self.batch_id, "Worker panicked: {}", e);
                }
            }
        }
        trace!(batch_id = %self.batch_id, "Worker pool drained");
    }
}

async fn run_worker(
    batch_id: BatchId,
    worker_id: usize,
    mut source: TaskSource,
    fetcher: Arc<dyn Fetcher>,
) {
    while let Some(task) = source.next().await {
        if task.cancel.is_cancelled() {
            trace!(batch_id = %batch_id, worker_id, url = %task.url, "Skipping task of cancelled batch");
            continue;
        }

        let outcome = execute(fetcher.as_ref(), &task).await;
        emit(batch_id, &task.sink, outcome);
    }
    trace!(batch_id = %batch_id, worker_id, "Worker exiting");
}

/// Decrements the in-flight gauge even if the fetch future is dropped.
struct InFlight;

impl InFlight {
    fn enter() -> Self {
        FETCHES_IN_FLIGHT.inc();
        Self
    }
}

impl Drop for InFlight {
    fn drop(&mut self) {
        FETCHES_IN_FLIGHT.dec();
    }
}

async fn execute(fetcher: &dyn Fetcher, task: &FetchTask) -> FetchOutcome {
    let started = Instant::now();
    let result = {
        let _in_flight = InFlight::enter();
        fetcher.fetch(&task.url, &task.cancel).await
    };

    let label = match &result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    FETCHES_TOTAL.with_label_values(&[label]).inc();
    FETCH_DURATION
        .with_label_values(&[label])
        .observe(started.elapsed().as_secs_f64());

    if let Err(e) = &result {
        if !e.is_cancelled() {
            debug!(url = %task.url, error = %e, "Fetch failed");
        }
    }

    FetchOutcome {
        url: task.url.clone(),
        result,
    }
}

/// Hand an outcome to the aggregator without ever blocking the worker.
fn emit(batch_id: BatchId, sink: &mpsc::Sender<FetchOutcome>, outcome: FetchOutcome) {
    match sink.try_send(outcome) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Closed(outcome)) => {
            OUTCOMES_DISCARDED.inc();
            debug!(batch_id = %batch_id, url = %outcome.url, "Discarding outcome of finished batch");
        }
        Err(mpsc::error::TrySendError::Full(outcome)) => {
            // The channel holds one slot per URL, so this means a task was run twice.
            OUTCOMES_DISCARDED.inc();
            warn!(batch_id = %batch_id, url = %outcome.url, "Result channel full, discarding outcome");
        }
    }
}
