//! Fetcher configuration.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{AppError, Result};

/// Settings for one fetcher instance.
///
/// Built once at startup (defaults, TOML file, then CLI overrides) and handed
/// to [`DocumentFetcher`](crate::pipeline::DocumentFetcher), which keeps it
/// read-only for its whole lifetime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScraperConfiguration {
    /// Registry site root
    #[serde(default = "defaults::target_base_url")]
    pub target_base_url: String,

    /// Path of the search page, relative to `target_base_url`
    #[serde(default = "defaults::search_endpoint")]
    pub search_endpoint: String,

    /// Query-string key carrying the business name
    #[serde(default = "defaults::search_query_param")]
    pub search_query_param: String,

    /// Where downloaded PDFs are written
    #[serde(default = "defaults::storage_directory")]
    pub storage_directory: PathBuf,

    /// Pause before every outbound request, in seconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_seconds: f64,

    /// Whether the first request of a session also waits
    #[serde(default = "defaults::delay_first_request")]
    pub delay_first_request: bool,

    /// Per-attempt request timeout, in seconds
    #[serde(default = "defaults::connection_timeout")]
    pub connection_timeout: u64,

    /// Retries after the first attempt for transient failures
    #[serde(default = "defaults::max_retry_attempts")]
    pub max_retry_attempts: u32,

    /// Linear backoff step between retries, in seconds
    #[serde(default = "defaults::retry_backoff")]
    pub retry_backoff_seconds: f64,

    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub http_user_agent: String,
}

impl ScraperConfiguration {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration or return default if loading fails.
    pub fn load_or_default(path: impl AsRef<Path>) -> Self {
        Self::load(&path).unwrap_or_else(|e| {
            log::warn!(
                "Config load failed from {:?}: {}. Using defaults.",
                path.as_ref(),
                e
            );
            Self::default()
        })
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        let base = Url::parse(&self.target_base_url)
            .map_err(|e| AppError::validation(format!("target_base_url is invalid: {e}")))?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(AppError::validation(
                "target_base_url must use http or https",
            ));
        }
        if self.search_query_param.trim().is_empty() {
            return Err(AppError::validation("search_query_param is empty"));
        }
        if self.storage_directory.as_os_str().is_empty() {
            return Err(AppError::validation("storage_directory is empty"));
        }
        self.request_delay()?;
        if self.connection_timeout == 0 {
            return Err(AppError::validation("connection_timeout must be > 0"));
        }
        self.retry_backoff()?;
        if self.http_user_agent.trim().is_empty() {
            return Err(AppError::validation("http_user_agent is empty"));
        }
        Ok(())
    }

    /// Full search URL for a business name query.
    pub fn search_url(&self, query: &str) -> Result<Url> {
        let base = Url::parse(&self.target_base_url)?;
        let mut url = base.join(&self.search_endpoint)?;
        url.query_pairs_mut()
            .clear()
            .append_pair(&self.search_query_param, query);
        Ok(url)
    }

    /// `request_delay_seconds` as a duration.
    pub fn request_delay(&self) -> Result<Duration> {
        seconds("request_delay_seconds", self.request_delay_seconds)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.connection_timeout)
    }

    /// `retry_backoff_seconds` as a duration.
    pub fn retry_backoff(&self) -> Result<Duration> {
        seconds("retry_backoff_seconds", self.retry_backoff_seconds)
    }
}

impl Default for ScraperConfiguration {
    fn default() -> Self {
        Self {
            target_base_url: defaults::target_base_url(),
            search_endpoint: defaults::search_endpoint(),
            search_query_param: defaults::search_query_param(),
            storage_directory: defaults::storage_directory(),
            request_delay_seconds: defaults::request_delay(),
            delay_first_request: defaults::delay_first_request(),
            connection_timeout: defaults::connection_timeout(),
            max_retry_attempts: defaults::max_retry_attempts(),
            retry_backoff_seconds: defaults::retry_backoff(),
            http_user_agent: defaults::user_agent(),
        }
    }
}

/// Negative, non-finite and out-of-range values are rejected.
fn seconds(field: &str, value: f64) -> Result<Duration> {
    Duration::try_from_secs_f64(value).map_err(|e| {
        AppError::validation(format!(
            "{field} must be a usable number of seconds ({value}): {e}"
        ))
    })
}

mod defaults {
    use std::path::PathBuf;

    pub fn target_base_url() -> String {
        "https://www.sosnc.gov".into()
    }
    pub fn search_endpoint() -> String {
        "/online_services/search/by_title/_Business_Registration".into()
    }
    pub fn search_query_param() -> String {
        "Words".into()
    }
    pub fn storage_directory() -> PathBuf {
        PathBuf::from("./fetched_documents")
    }
    pub fn request_delay() -> f64 {
        1.5
    }
    pub fn delay_first_request() -> bool {
        true
    }
    pub fn connection_timeout() -> u64 {
        30
    }
    pub fn max_retry_attempts() -> u32 {
        3
    }
    pub fn retry_backoff() -> f64 {
        2.0
    }
    pub fn user_agent() -> String {
        "NCBusinessDocFetcher/1.0".into()
    }
}
