// src/services/documents.rs

//! PDF link extraction from business detail pages.

use std::collections::HashSet;

use scraper::{Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::DocumentLink;
use crate::services::parse_selector;
use crate::utils::url::{has_pdf_extension, is_non_navigational, resolve_url};

const PDF_MIME: &str = "application/pdf";

/// Finds PDF filings linked from a detail page.
pub struct DocumentLinkExtractor {
    anchor_sel: Selector,
}

impl DocumentLinkExtractor {
    pub fn new() -> Result<Self> {
        Ok(Self {
            anchor_sel: parse_selector("a[href]")?,
        })
    }

    /// Absolute, de-duplicated PDF links on the page, in document order.
    ///
    /// An anchor qualifies when its resolved path ends in `.pdf` (any case)
    /// or it declares `type="application/pdf"`. Links differing only in their
    /// fragment are the same document.
    pub fn extract(&self, html: &str, base_url: &str, business_name: &str) -> Vec<DocumentLink> {
        self.try_extract(html, base_url, business_name)
            .unwrap_or_else(|e| {
                log::debug!("{e}; no documents for '{business_name}'");
                Vec::new()
            })
    }

    pub fn try_extract(
        &self,
        html: &str,
        base_url: &str,
        business_name: &str,
    ) -> Result<Vec<DocumentLink>> {
        let base = Url::parse(base_url)
            .map_err(|e| AppError::parse(format!("detail page URL {base_url} is invalid: {e}")))?;
        let document = Html::parse_document(html);

        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for anchor in document.select(&self.anchor_sel) {
            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            if is_non_navigational(href) {
                continue;
            }
            let Some(mut url) = resolve_url(&base, href) else {
                log::debug!("Skipping unresolvable link '{href}'");
                continue;
            };

            let declared_pdf = anchor
                .value()
                .attr("type")
                .is_some_and(|t| t.trim().eq_ignore_ascii_case(PDF_MIME));
            if !declared_pdf && !has_pdf_extension(&url) {
                continue;
            }

            url.set_fragment(None);
            if seen.insert(url.to_string()) {
                links.push(DocumentLink::new(url, business_name));
            }
        }

        log::info!("Located {} PDF documents", links.len());
        Ok(links)
    }
}
