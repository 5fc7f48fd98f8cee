//! Non-blocking admission limiter for concurrently served batches.

use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use tracing::{debug, warn};

/// Snapshot of the limiter counters.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AdmissionStatus {
    pub current: usize,
    pub max: usize,
}

#[derive(Debug)]
struct Counter {
    current: usize,
    max: usize,
}

/// Caps the number of batches in flight across the whole service.
///
/// This is admission control, not rate limiting: it bounds how many batches
/// are outstanding at once, and never waits for capacity to free up.
/// Cloning is cheap and every clone shares the same counter.
#[derive(Debug, Clone)]
pub struct AdmissionLimiter {
    inner: Arc<Mutex<Counter>>,
}

impl AdmissionLimiter {
    /// Create a limiter admitting at most `max` concurrent batches.
    ///
    /// A `max` of 0 is raised to 1.
    pub fn new(max: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Counter {
                current: 0,
                max: max.max(1),
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Counter> {
        // The counter stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Register a batch if there is room for it.
    ///
    /// Returns `false` (and changes nothing) when the limiter is at capacity.
    pub fn admit(&self) -> bool {
        let mut counter = self.lock();
        if counter.current >= counter.max {
            debug!(
                current = counter.current,
                max = counter.max,
                "Admission rejected"
            );
            return false;
        }
        counter.current += 1;
        true
    }

    /// Unregister a batch. Releasing an empty limiter is a no-op.
    pub fn release(&self) {
        let mut counter = self.lock();
        if counter.current > 0 {
            counter.current -= 1;
        } else {
            warn!("Admission released with no batch admitted");
        }
    }

    /// Like [`admit`](Self::admit), but returns a permit that releases on drop.
    pub fn try_admit(&self) -> Option<AdmissionPermit> {
        self.admit().then(|| AdmissionPermit {
            limiter: self.clone(),
        })
    }

    pub fn current(&self) -> usize {
        self.lock().current
    }

    pub fn max(&self) -> usize {
        self.lock().max
    }

    pub fn status(&self) -> AdmissionStatus {
        let counter = self.lock();
        AdmissionStatus {
            current: counter.current,
            max: counter.max,
        }
    }
}

/// An admitted batch slot, released exactly once when dropped.
#[derive(Debug)]
#[must_use = "dropping the permit releases the admission slot immediately"]
pub struct AdmissionPermit {
    limiter: AdmissionLimiter,
}

impl Drop for AdmissionPermit {
    fn drop(&mut self) {
        self.limiter.release();
    }
}
