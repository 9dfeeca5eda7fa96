// src/error.rs

//! Unified error handling for the document fetcher.

use std::fmt;

use thiserror::Error;

/// Result type alias for fetcher operations.
pub type Result<T> = std::result::Result<T, AppError>;

/// Unified application error type.
///
/// `Transient`, `Fatal`, `Parse` and `Download` are per-item failures that the
/// orchestrator records and moves past. `Config`, `Validation`, `Io` and
/// `Closed` are setup-level and abort the run.
#[derive(Error, Debug)]
pub enum AppError {
    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP client could not be built or a request could not be prepared
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML parsing failed
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    /// URL parsing failed
    #[error("URL parse error: {0}")]
    Url(#[from] url::ParseError),

    /// CSS selector parsing failed
    #[error("Invalid selector '{selector}': {message}")]
    Selector { selector: String, message: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Configuration value out of range
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network failure expected to clear up on retry
    #[error("Transient failure for {url}: {message}")]
    Transient { url: String, message: String },

    /// Request failure that retrying will not fix
    #[error("Request to {url} failed: {message}")]
    Fatal { url: String, message: String },

    /// Page markup did not have the expected shape
    #[error("Parse error: {0}")]
    Parse(String),

    /// Document could not be fetched, validated or written
    #[error("Download of {url} failed: {message}")]
    Download { url: String, message: String },

    /// The HTTP session was already released with `close()`
    #[error("Fetcher session is closed")]
    Closed,
}

impl AppError {
    /// Create a selector parsing error.
    pub fn selector(selector: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Selector {
            selector: selector.into(),
            message: message.to_string(),
        }
    }

    /// Create a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transient request error.
    pub fn transient(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Transient {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a fatal request error.
    pub fn fatal(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Fatal {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Create a parse error.
    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Create a download error.
    pub fn download(url: impl Into<String>, message: impl fmt::Display) -> Self {
        Self::Download {
            url: url.into(),
            message: message.to_string(),
        }
    }

    /// Whether the failure is worth retrying.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Whether the failure should abort the whole run rather than one item.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::Config(_) | Self::Validation(_) | Self::Io(_) | Self::Closed
        )
    }
}
