// src/services/downloader.rs

//! PDF downloader.
//!
//! A download counts as successful only when the body is non-empty and
//! carries the `%PDF-` signature within its first 1024 bytes. The declared
//! `Content-Type` is logged when it disagrees but never decides the outcome;
//! registries routinely serve filings as `application/octet-stream`.

use std::path::{Path, PathBuf};

use chrono::Local;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::{AppError, Result};
use crate::models::DocumentLink;
use crate::services::RegistryClient;
use crate::storage::{LocalStorage, PartialDocument};
use crate::utils::filename::document_file_name;

const PDF_MAGIC: &[u8] = b"%PDF-";

/// Fetches PDF links and stores them under unique names.
#[derive(Debug, Default)]
pub struct Downloader;

impl Downloader {
    pub fn new() -> Self {
        Self
    }

    /// Download `link` into `storage_directory`.
    ///
    /// Every failure, including a rejected body or a disk error, comes back
    /// as [`AppError::Download`] and leaves no file behind.
    pub async fn download(
        &self,
        client: &mut RegistryClient,
        link: &DocumentLink,
        storage_directory: &Path,
    ) -> Result<PathBuf> {
        let url = Url::parse(&link.url)
            .map_err(|e| AppError::download(&link.url, format!("URL is not absolute: {e}")))?;

        let response = client
            .get(url.as_str())
            .await
            .map_err(|e| Self::as_download_error(&link.url, e))?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_string();

        let storage = LocalStorage::new(storage_directory);
        let file_name = document_file_name(&link.business_name, &link.url, Local::now());
        let mut partial = storage
            .begin_document(&file_name)
            .await
            .map_err(|e| Self::as_download_error(&link.url, e))?;

        let written = Self::stream_body(&mut partial, response, &link.url)
            .await
            .and_then(|()| Self::validate(&partial, &link.url, &content_type));

        match written {
            Ok(()) => partial
                .commit()
                .await
                .map_err(|e| Self::as_download_error(&link.url, e)),
            Err(e) => {
                partial.discard().await;
                Err(e)
            }
        }
    }

    async fn stream_body(
        partial: &mut PartialDocument,
        response: reqwest::Response,
        url: &str,
    ) -> Result<()> {
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| {
                if e.is_timeout() {
                    AppError::download(url, format!("body read timed out: {e}"))
                } else {
                    AppError::download(url, format!("body read failed: {e}"))
                }
            })?;
            partial
                .write_chunk(&chunk)
                .await
                .map_err(|e| Self::as_download_error(url, e))?;
        }
        Ok(())
    }

    fn validate(partial: &PartialDocument, url: &str, content_type: &str) -> Result<()> {
        if partial.bytes_written() == 0 {
            return Err(AppError::download(url, "empty response body"));
        }
        if !looks_like_pdf(partial.head()) {
            return Err(AppError::download(
                url,
                format!(
                    "response is not a PDF (content-type: {})",
                    if content_type.is_empty() { "none" } else { content_type }
                ),
            ));
        }
        if !content_type.is_empty() && !content_type.to_ascii_lowercase().contains("pdf") {
            log::debug!("{url} is a PDF served as '{content_type}'");
        }
        Ok(())
    }

    fn as_download_error(url: &str, error: AppError) -> AppError {
        match error {
            AppError::Download { .. } => error,
            AppError::Transient { message, .. } | AppError::Fatal { message, .. } => {
                AppError::download(url, message)
            }
            other => AppError::download(url, other),
        }
    }
}

/// Whether `head` carries the PDF signature.
pub fn looks_like_pdf(head: &[u8]) -> bool {
    head.windows(PDF_MAGIC.len()).any(|w| w == PDF_MAGIC)
}
