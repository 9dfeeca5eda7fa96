//! Pipeline entry points.
//!
//! - `DocumentFetcher`: search, follow detail pages, download PDFs
//! - `RetryPolicy`: retry state machine shared by every request

pub mod fetch;
pub mod retry;

pub use fetch::DocumentFetcher;
pub use retry::{RetryPolicy, RetryState};
