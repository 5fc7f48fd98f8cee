//! Hands the batch's URLs to the worker pool.

use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace, warn};

use super::pool::{Intake, WorkerSlot};
use super::types::{BatchId, FetchOutcome, FetchTask};

/// What the dispatcher managed to do before it stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct DispatchReport {
    pub assigned: usize,
    pub total: usize,
    pub cancelled: bool,
}

/// Assign every URL to exactly one worker, or stop early on cancellation.
///
/// Consumes the intake, so every worker channel is closed on return.
pub(crate) async fn dispatch(
    batch_id: BatchId,
    intake: Intake,
    urls: Vec<String>,
    sink: mpsc::Sender<FetchOutcome>,
    cancel: CancellationToken,
    poll_interval: Duration,
) -> DispatchReport {
    let report = match intake {
        Intake::Dedicated(slots) => {
            let mut scanner = RoundRobin::new(slots);
            dispatch_round_robin(&mut scanner, urls, &sink, &cancel, poll_interval).await
        }
        Intake::Shared(queue) => dispatch_shared(&queue, urls, &sink, &cancel).await,
    };

    if report.cancelled {
        debug!(
            batch_id = %batch_id,
            assigned = report.assigned,
            total = report.total,
            "Dispatch stopped by cancellation"
        );
    } else if report.assigned < report.total {
        warn!(
            batch_id = %batch_id,
            assigned = report.assigned,
            total = report.total,
            "Dispatch stopped, no worker left"
        );
    } else {
        debug!(batch_id = %batch_id, assigned = report.assigned, "All URLs assigned, draining");
    }
    report
}

/// Cyclic scan over the per-worker slots.
struct RoundRobin {
    slots: Vec<WorkerSlot>,
    next: usize,
}

impl RoundRobin {
    fn new(slots: Vec<WorkerSlot>) -> Self {
        Self { slots, next: 0 }
    }

    /// One pass over all slots. Returns the idle worker that took the task,
    /// or the task back if every worker is busy or gone.
    fn offer(&mut self, mut task: FetchTask) -> Result<usize, FetchTask> {
        for _ in 0..self.slots.len() {
            let worker = self.next;
            self.next = (self.next + 1) % self.slots.len();
            match self.slots[worker].try_hand_off(task) {
                Ok(()) => return Ok(worker),
                Err(returned) => task = returned,
            }
        }
        Err(task)
    }

    fn all_closed(&self) -> bool {
        self.slots.iter().all(|slot| slot.is_closed())
    }
}

async fn dispatch_round_robin(
    scanner: &mut RoundRobin,
    urls: Vec<String>,
    sink: &mpsc::Sender<FetchOutcome>,
    cancel: &CancellationToken,
    poll_interval: Duration,
) -> DispatchReport {
    let total = urls.len();
    let mut assigned = 0;

    for url in urls {
        let mut task = FetchTask {
            url,
            cancel: cancel.clone(),
            sink: sink.clone(),
        };

        loop {
            if cancel.is_cancelled() {
                return DispatchReport {
                    assigned,
                    total,
                    cancelled: true,
                };
            }

            match scanner.offer(task) {
                Ok(worker) => {
                    trace!(worker, "Task assigned");
                    assigned += 1;
                    break;
                }
                Err(returned) => {
                    if scanner.all_closed() {
                        return DispatchReport {
                            assigned,
                            total,
                            cancelled: false,
                        };
                    }
                    task = returned;
                    idle(cancel, poll_interval).await;
                }
            }
        }
    }

    DispatchReport {
        assigned,
        total,
        cancelled: false,
    }
}

/// Pause between two full scans that placed nothing.
async fn idle(cancel: &CancellationToken, poll_interval: Duration) {
    if poll_interval.is_zero() {
        tokio::task::yield_now().await;
        return;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => {}
        _ = tokio::time::sleep(poll_interval) => {}
    }
}

async fn dispatch_shared(
    queue: &mpsc::Sender<FetchTask>,
    urls: Vec<String>,
    sink: &mpsc::Sender<FetchOutcome>,
    cancel: &CancellationToken,
) -> DispatchReport {
    let total = urls.len();
    let mut assigned = 0;

    for url in urls {
        let task = FetchTask {
            url,
            cancel: cancel.clone(),
            sink: sink.clone(),
        };

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return DispatchReport { assigned, total, cancelled: true };
            }
            sent = queue.send(task) => {
                if sent.is_err() {
                    return DispatchReport { assigned, total, cancelled: false };
                }
                assigned += 1;
            }
        }
    }

    DispatchReport {
        assigned,
        total,
        cancelled: false,
    }
}
