//! Service-wide admission control.
//!
//! The request layer must call [`AdmissionLimiter::admit`] before starting a
//! batch and [`AdmissionLimiter::release`] exactly once afterwards, whatever
//! the outcome. [`AdmissionLimiter::try_admit`] wraps that pairing in a permit.

mod limiter;

pub use limiter::{AdmissionLimiter, AdmissionPermit, AdmissionStatus};
