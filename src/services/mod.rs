//! Service layer for the document fetcher.
//!
//! This module contains the building blocks of a fetch run:
//! - Rate-limited, retrying HTTP access (`RegistryClient`)
//! - Search results parsing (`SearchResultParser`)
//! - PDF link discovery on detail pages (`DocumentLinkExtractor`)
//! - Validated document downloads (`Downloader`)

mod client;
mod documents;
mod downloader;
mod search;

pub use client::RegistryClient;
pub use documents::DocumentLinkExtractor;
pub use downloader::{Downloader, looks_like_pdf};
pub use search::SearchResultParser;

use scraper::Selector;

use crate::error::{AppError, Result};

/// Compile a CSS selector, reporting failures as [`AppError::Selector`].
pub(crate) fn parse_selector(s: &str) -> Result<Selector> {
    Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
}
