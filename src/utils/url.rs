// src/utils/url.rs

//! URL manipulation utilities.

use url::Url;

/// Resolve a potentially relative `href` against `base`.
///
/// A trailing slash on the base path is not significant: `/filings` and
/// `/filings/` resolve relative references identically. Returns `None` when
/// the base is not an absolute URL or the reference cannot be joined.
///
/// # Examples
/// ```
/// use doc_fetcher::utils::url::resolve;
///
/// assert_eq!(
///     resolve("https://example.com/detail/123", "/docs/a.pdf").as_deref(),
///     Some("https://example.com/docs/a.pdf")
/// );
/// ```
pub fn resolve(base: &str, href: &str) -> Option<String> {
    let base = Url::parse(base).ok()?;
    resolve_url(&base, href).map(String::from)
}

/// Resolve `href` against an already parsed base.
pub fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    normalize_base(base).join(href.trim()).ok()
}

fn normalize_base(base: &Url) -> Url {
    let mut base = base.clone();
    let path = base.path();
    if path.len() > 1 && path.ends_with('/') {
        let trimmed = path.trim_end_matches('/').to_string();
        let trimmed = if trimmed.is_empty() { "/".to_string() } else { trimmed };
        base.set_path(&trimmed);
    }
    base
}

/// Whether an `href` can never point at a document.
pub fn is_non_navigational(href: &str) -> bool {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return true;
    }
    let lower = href.to_ascii_lowercase();
    ["javascript:", "mailto:", "tel:", "data:"]
        .iter()
        .any(|scheme| lower.starts_with(scheme))
}

/// Whether the URL path names a PDF file (case-insensitive).
pub fn has_pdf_extension(url: &Url) -> bool {
    url.path().to_ascii_lowercase().ends_with(".pdf")
}
