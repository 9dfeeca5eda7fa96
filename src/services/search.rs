// src/services/search.rs

//! Search results page parser.
//!
//! The registry renders matches as a table whose `class` mentions "result"
//! (older layouts use an `id` containing "search"). Each data row carries the
//! business name as a link to its detail page, followed by optional
//! identifier, status and registration date cells.

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::BusinessRecord;
use crate::services::parse_selector;
use crate::utils::url::{is_non_navigational, resolve_url};

/// Turns a results page into [`BusinessRecord`]s.
pub struct SearchResultParser {
    base_url: Url,
    table_sel: Selector,
    row_sel: Selector,
    cell_sel: Selector,
    anchor_sel: Selector,
    class_pattern: Regex,
    id_pattern: Regex,
}

impl SearchResultParser {
    /// Create a parser resolving detail links against `base_url`.
    pub fn new(base_url: &str) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(base_url)?,
            table_sel: parse_selector("table")?,
            row_sel: parse_selector("tr")?,
            cell_sel: parse_selector("td")?,
            anchor_sel: parse_selector("a[href]")?,
            class_pattern: Self::pattern(r"(?i)result")?,
            id_pattern: Self::pattern(r"(?i)search")?,
        })
    }

    /// Parse a results page.
    ///
    /// Pages without a results table, and tables without usable rows, yield
    /// an empty vector.
    pub fn parse(&self, html: &str, query: &str) -> Vec<BusinessRecord> {
        self.try_parse(html).unwrap_or_else(|e| {
            log::debug!("{e}; treating search for '{query}' as no results");
            Vec::new()
        })
    }

    /// Parse a results page, reporting a missing results table as an error.
    pub fn try_parse(&self, html: &str) -> Result<Vec<BusinessRecord>> {
        let document = Html::parse_document(html);
        let table = self
            .find_results_table(&document)
            .ok_or_else(|| AppError::parse("no results table found in response"))?;

        let records: Vec<BusinessRecord> = table
            .select(&self.row_sel)
            .filter_map(|row| self.parse_row(row))
            .collect();

        log::info!("Found {} business records", records.len());
        Ok(records)
    }

    fn find_results_table<'a>(&self, document: &'a Html) -> Option<ElementRef<'a>> {
        let tables: Vec<_> = document.select(&self.table_sel).collect();
        let by_attr = |attr: &str, pattern: &Regex| {
            tables
                .iter()
                .copied()
                .find(|t| t.value().attr(attr).is_some_and(|v| pattern.is_match(v)))
        };

        by_attr("class", &self.class_pattern).or_else(|| by_attr("id", &self.id_pattern))
    }

    fn parse_row(&self, row: ElementRef) -> Option<BusinessRecord> {
        let cells: Vec<ElementRef> = row.select(&self.cell_sel).collect();
        // Header rows use <th> only.
        let name_cell = cells.first()?;

        let Some(anchor) = name_cell.select(&self.anchor_sel).next() else {
            log::debug!("Skipping row without a detail link");
            return None;
        };
        let name = Self::clean_text(anchor);
        let href = anchor.value().attr("href").unwrap_or("");
        if name.is_empty() || is_non_navigational(href) {
            log::debug!("Skipping malformed row (name: '{name}', href: '{href}')");
            return None;
        }
        let detail_url = resolve_url(&self.base_url, href)?;

        let cell_text = |index: usize| {
            cells
                .get(index)
                .map(|cell| Self::clean_text(*cell))
                .unwrap_or_default()
        };

        Some(BusinessRecord {
            name,
            identifier: cell_text(1),
            status: cell_text(2),
            date_registered: cell_text(3),
            detail_url: detail_url.to_string(),
        })
    }

    fn clean_text(element: ElementRef) -> String {
        let text: String = element.text().collect();
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn pattern(source: &str) -> Result<Regex> {
        Regex::new(source).map_err(|e| AppError::parse(format!("invalid pattern {source}: {e}")))
    }
}
