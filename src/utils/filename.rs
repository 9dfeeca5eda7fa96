//! Download file naming.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use sha2::{Digest, Sha256};
use unicode_segmentation::UnicodeSegmentation;

/// Maximum length, in graphemes, of the business-name part of a file name.
pub const FILENAME_MAX_LENGTH: usize = 50;

const FALLBACK_NAME: &str = "document";

/// Strip a business name down to characters safe in a file name.
///
/// Keeps word characters, whitespace and `-`, collapses whitespace runs, and
/// caps the result at [`FILENAME_MAX_LENGTH`] graphemes.
pub fn sanitize_business_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '_' | '-'))
        .collect();
    let collapsed = kept.split_whitespace().collect::<Vec<_>>().join(" ");
    let truncated: String = collapsed
        .graphemes(true)
        .take(FILENAME_MAX_LENGTH)
        .collect();
    let truncated = truncated.trim();

    if truncated.is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        truncated.to_string()
    }
}

/// First 8 hex characters of the SHA-256 of `url`.
pub fn url_hash(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(digest)[..8].to_string()
}

/// `{business}_{hash}_{YYYYmmdd_HHMMSS}.pdf`
pub fn document_file_name(business_name: &str, url: &str, timestamp: DateTime<Local>) -> String {
    format!(
        "{}_{}_{}.pdf",
        sanitize_business_name(business_name),
        url_hash(url),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Path for `file_name` in `dir` that does not exist yet.
///
/// Appends `_2`, `_3`, ... to the stem until a free name is found.
pub fn unique_path(dir: &Path, file_name: &str) -> PathBuf {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return candidate;
    }

    let (stem, extension) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, format!(".{ext}")),
        None => (file_name, String::new()),
    };

    (2u32..)
        .map(|n| dir.join(format!("{stem}_{n}{extension}")))
        .find(|path| !path.exists())
        .unwrap_or(candidate)
}
