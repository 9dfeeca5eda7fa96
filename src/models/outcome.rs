//! Summary of one search-and-download run.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Counters and failures collected by
/// [`DocumentFetcher::process_search_and_download`](crate::pipeline::DocumentFetcher::process_search_and_download).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FetchResult {
    pub search_query: String,
    pub businesses_found: usize,
    pub documents_downloaded: usize,
    pub downloaded_files: Vec<PathBuf>,
    /// Human-readable failure descriptions, in the order they occurred
    pub failures: Vec<String>,
}

impl FetchResult {
    pub fn new(search_query: impl Into<String>) -> Self {
        Self {
            search_query: search_query.into(),
            ..Self::default()
        }
    }

    /// Record a successfully saved document.
    pub fn record_download(&mut self, path: PathBuf) {
        self.documents_downloaded += 1;
        self.downloaded_files.push(path);
    }

    /// Record a per-item failure.
    pub fn record_failure(&mut self, context: &str, error: impl std::fmt::Display) {
        self.failures.push(format!("{context}: {error}"));
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}
