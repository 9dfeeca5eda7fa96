// src/services/client.rs

//! Rate-limited HTTP client for the registry.

use std::error::Error as _;
use std::time::Duration;

use reqwest::{Client, Response, StatusCode};

use crate::error::{AppError, Result};
use crate::models::ScraperConfiguration;
use crate::pipeline::RetryPolicy;
use crate::utils::http::create_async_client;

/// GET-only client that paces requests and retries transient failures.
///
/// Requests are issued one at a time; every method takes `&mut self`.
pub struct RegistryClient {
    client: Client,
    policy: RetryPolicy,
    request_delay: Duration,
    page_timeout: Duration,
    delay_first_request: bool,
    requests_sent: u64,
}

impl RegistryClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &ScraperConfiguration) -> Result<Self> {
        Ok(Self {
            client: create_async_client(config)?,
            policy: RetryPolicy::from_config(config)?,
            request_delay: config.request_delay()?,
            page_timeout: config.timeout(),
            delay_first_request: config.delay_first_request,
            requests_sent: 0,
        })
    }

    /// Number of logical requests issued so far (retries not counted).
    pub fn requests_sent(&self) -> u64 {
        self.requests_sent
    }

    /// GET `url`, returning the response once its status is 2xx.
    ///
    /// The body is left unread so callers can stream it. Only idle gaps are
    /// bounded; a large body may take as long as it needs.
    pub async fn get(&mut self, url: &str) -> Result<Response> {
        self.pace().await;
        let client = &self.client;
        self.policy
            .run(|attempt| async move { send_once(client, url, attempt, None).await })
            .await
    }

    /// GET `url` and read the body as text.
    ///
    /// Body read failures are retried along with the request. Each attempt,
    /// body included, must finish within `connection_timeout`.
    pub async fn get_text(&mut self, url: &str) -> Result<(StatusCode, String)> {
        self.pace().await;
        let client = &self.client;
        let deadline = Some(self.page_timeout);
        self.policy
            .run(|attempt| async move {
                let response = send_once(client, url, attempt, deadline).await?;
                let status = response.status();
                let body = response
                    .text()
                    .await
                    .map_err(|e| classify_request_error(url, &e))?;
                Ok((status, body))
            })
            .await
    }

    /// Observe the inter-request delay.
    async fn pace(&mut self) {
        let first = self.requests_sent == 0;
        self.requests_sent += 1;

        if self.request_delay.is_zero() || (first && !self.delay_first_request) {
            return;
        }
        log::debug!(
            "Waiting {:.2}s before request",
            self.request_delay.as_secs_f64()
        );
        tokio::time::sleep(self.request_delay).await;
    }
}

async fn send_once(
    client: &Client,
    url: &str,
    attempt: u32,
    deadline: Option<Duration>,
) -> Result<Response> {
    log::debug!("GET {} (attempt {})", url, attempt);
    let mut request = client.get(url);
    if let Some(deadline) = deadline {
        request = request.timeout(deadline);
    }
    let response = request
        .send()
        .await
        .map_err(|e| classify_request_error(url, &e))?;

    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        Err(classify_status(url, status))
    }
}

/// 5xx and 429 are worth retrying; every other non-2xx status is final.
fn classify_status(url: &str, status: StatusCode) -> AppError {
    let message = format!("HTTP {status}");
    if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
        AppError::transient(url, message)
    } else {
        AppError::fatal(url, message)
    }
}

fn classify_request_error(url: &str, error: &reqwest::Error) -> AppError {
    if is_dns_failure(error) {
        AppError::fatal(url, format!("DNS resolution failed: {error}"))
    } else if error.is_timeout() {
        AppError::transient(url, format!("request timed out: {error}"))
    } else if error.is_builder() || error.is_redirect() {
        AppError::fatal(url, error)
    } else if error.is_connect() {
        AppError::transient(url, format!("connection failed: {error}"))
    } else {
        AppError::transient(url, error)
    }
}

// reqwest 0.12 (hyper-util's GaiResolver) reports resolver failures as
// "dns error: failed to lookup address information: ...". The error types are
// private, so the source chain text is all there is to match on.
fn is_dns_failure(error: &reqwest::Error) -> bool {
    let mut source = std::error::Error::source(error);
    while let Some(cause) = source {
        let text = cause.to_string().to_ascii_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return true;
        }
        source = cause.source();
    }
    false
}
