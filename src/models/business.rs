//! Registry records and document links.

use serde::{Deserialize, Serialize};

/// One search-result entry identifying a registered business.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BusinessRecord {
    /// Registered business name
    pub name: String,

    /// Registry identifier (empty when the row omits it)
    pub identifier: String,

    /// Status text such as "Current-Active" (may be empty)
    pub status: String,

    /// Registration date as printed by the registry (may be empty)
    pub date_registered: String,

    /// Absolute URL of the business detail page
    pub detail_url: String,
}

/// An absolute URL to a PDF filing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DocumentLink {
    pub url: String,
    pub business_name: String,
}

impl DocumentLink {
    pub fn new(url: impl Into<String>, business_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            business_name: business_name.into(),
        }
    }
}
