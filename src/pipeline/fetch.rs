// src/pipeline/fetch.rs

//! Search-and-download pipeline.

use std::path::Path;

use crate::error::{AppError, Result};
use crate::models::{BusinessRecord, FetchResult, ScraperConfiguration};
use crate::services::{DocumentLinkExtractor, Downloader, RegistryClient, SearchResultParser};
use crate::storage::LocalStorage;

/// Runs `search -> parse -> detail pages -> PDF downloads` against a registry.
///
/// The fetcher owns a single HTTP session. Requests go out strictly one after
/// another, each preceded by the configured delay.
///
/// Call [`close`](Self::close) when done. Dropping an unclosed fetcher still
/// releases the session but logs a warning.
///
/// ```no_run
/// use doc_fetcher::models::ScraperConfiguration;
/// use doc_fetcher::pipeline::DocumentFetcher;
///
/// # async fn example() -> doc_fetcher::error::Result<()> {
/// let mut fetcher = DocumentFetcher::new(ScraperConfiguration::default())?;
/// let result = fetcher.process_search_and_download("Acme Inc").await?;
/// println!("{} documents", result.documents_downloaded);
/// fetcher.close();
/// # Ok(())
/// # }
/// ```
pub struct DocumentFetcher {
    config: ScraperConfiguration,
    storage: LocalStorage,
    session: Option<RegistryClient>,
    search_parser: SearchResultParser,
    link_extractor: DocumentLinkExtractor,
    downloader: Downloader,
}

impl DocumentFetcher {
    /// Validate `config`, create the storage directory and open the session.
    pub fn new(config: ScraperConfiguration) -> Result<Self> {
        config.validate()?;

        let storage = LocalStorage::new(&config.storage_directory);
        storage.ensure_root_blocking().map_err(|e| {
            AppError::config(format!(
                "cannot create storage directory {}: {e}",
                config.storage_directory.display()
            ))
        })?;
        let shown = std::path::absolute(storage.root()).unwrap_or_else(|_| storage.root().into());
        log::info!("Document storage: {}", shown.display());

        Ok(Self {
            session: Some(RegistryClient::new(&config)?),
            search_parser: SearchResultParser::new(&config.target_base_url)?,
            link_extractor: DocumentLinkExtractor::new()?,
            downloader: Downloader::new(),
            storage,
            config,
        })
    }

    pub fn is_closed(&self) -> bool {
        self.session.is_none()
    }

    /// Search the registry and return matching businesses.
    pub async fn search_businesses(&mut self, query: &str) -> Result<Vec<BusinessRecord>> {
        let client = self.session.as_mut().ok_or(AppError::Closed)?;
        let search_url = self.config.search_url(query)?;

        log::info!("Searching for businesses: '{query}'");
        let (_, body) = client.get_text(search_url.as_str()).await?;
        Ok(self.search_parser.parse(&body, query))
    }

    /// Search for `query` and download every PDF linked from each match.
    ///
    /// Per-business and per-document failures are collected in the returned
    /// [`FetchResult`]. Only setup problems (closed session, unusable storage
    /// directory, unbuildable search URL) return `Err`.
    pub async fn process_search_and_download(&mut self, query: &str) -> Result<FetchResult> {
        if self.is_closed() {
            return Err(AppError::Closed);
        }
        self.storage.ensure_root().await.map_err(|e| {
            AppError::config(format!(
                "storage directory {} is unavailable: {e}",
                self.storage.root().display()
            ))
        })?;

        let mut result = FetchResult::new(query);

        let businesses = match self.search_businesses(query).await {
            Ok(businesses) => businesses,
            Err(e) if e.is_setup_failure() || matches!(e, AppError::Url(_)) => return Err(e),
            Err(e) => {
                log::error!("Search operation failed: {e}");
                result.record_failure(&format!("search '{query}'"), &e);
                return Ok(result);
            }
        };
        result.businesses_found = businesses.len();

        let client = self.session.as_mut().ok_or(AppError::Closed)?;
        for business in &businesses {
            Self::fetch_business_documents(
                client,
                &self.link_extractor,
                &self.downloader,
                self.storage.root(),
                business,
                &mut result,
            )
            .await;
        }

        log::info!(
            "Finished '{}': {} businesses, {} documents, {} failures",
            query,
            result.businesses_found,
            result.documents_downloaded,
            result.failures.len()
        );
        Ok(result)
    }

    async fn fetch_business_documents(
        client: &mut RegistryClient,
        extractor: &DocumentLinkExtractor,
        downloader: &Downloader,
        storage_dir: &Path,
        business: &BusinessRecord,
        result: &mut FetchResult,
    ) {
        log::info!("Fetching documents for: {}", business.name);

        let body = match client.get_text(&business.detail_url).await {
            Ok((_, body)) => body,
            Err(e) => {
                log::error!("Document fetch failed for {}: {e}", business.name);
                result.record_failure(&format!("detail page for '{}'", business.name), &e);
                return;
            }
        };

        let links = extractor.extract(&body, &business.detail_url, &business.name);
        for link in &links {
            match downloader.download(client, link, storage_dir).await {
                Ok(path) => {
                    log::info!("Saved document: {}", path.display());
                    result.record_download(path);
                }
                Err(e) => {
                    log::error!("Failed to download PDF: {e}");
                    result.record_failure(&format!("document for '{}'", business.name), &e);
                }
            }
        }
    }

    /// Release the HTTP session. Safe to call more than once.
    pub fn close(&mut self) {
        if self.session.take().is_some() {
            log::debug!("HTTP session closed");
        }
    }
}

impl Drop for DocumentFetcher {
    fn drop(&mut self) {
        if self.session.is_some() {
            log::warn!("DocumentFetcher dropped without close(); releasing HTTP session");
            self.close();
        }
    }
}
