//! Single-URL fetching.
//!
//! This module provides the `Fetcher` trait used by the worker pool, and a
//! reqwest-based implementation that issues a timed GET bound to the batch
//! cancellation token and decodes the body as an arbitrary JSON value.

mod error;
mod http;
mod traits;

pub use error::FetchError;
pub use http::ReqwestFetcher;
pub use traits::Fetcher;
