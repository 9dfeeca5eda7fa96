// src/utils/http.rs

//! HTTP client utilities.

use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue};

use crate::error::Result;
use crate::models::ScraperConfiguration;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
const ACCEPT_LANGUAGE_EN: &str = "en-US,en;q=0.5";

/// Create a configured asynchronous HTTP client.
///
/// `connection_timeout` bounds connecting and every idle gap while reading,
/// so a slow body that keeps arriving is never cut off. Page fetches add a
/// whole-request deadline per attempt in
/// [`RegistryClient`](crate::services::RegistryClient).
pub fn create_async_client(config: &ScraperConfiguration) -> Result<reqwest::Client> {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_EN));

    let client = reqwest::Client::builder()
        .user_agent(&config.http_user_agent)
        .default_headers(headers)
        .connect_timeout(config.timeout())
        .read_timeout(config.timeout())
        .build()?;
    Ok(client)
}
