//! Document fetcher for EDGAR filings.

use async_trait::async_trait;
use fundamentals_core::{
    DocumentCache, DocumentFetcher, DocumentSource, FetchError, FilingReference, RawDocument,
};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

use crate::client::EdgarClient;
use crate::summary::{parse_reports, statement_reports};

/// SEC EDGAR document fetcher.
///
/// With [`DocumentSource::StatementReports`] the fetcher reads the filing's
/// `FilingSummary.xml` and concatenates the rendered statement pages it lists,
/// falling back to the primary document for filings without a usable summary.
/// An optional [`DocumentCache`] is consulted before every request.
#[derive(Debug, Clone)]
pub struct EdgarFetcher {
    client: EdgarClient,
    source: DocumentSource,
    cache: Option<Arc<dyn DocumentCache>>,
}

impl EdgarFetcher {
    /// Create a fetcher sharing `client`.
    #[must_use]
    pub const fn new(client: EdgarClient, source: DocumentSource) -> Self {
        Self {
            client,
            source,
            cache: None,
        }
    }

    /// Attach a document cache.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn DocumentCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn get_cached(&self, url: &str) -> Result<String, FetchError> {
        if let Some(cache) = &self.cache {
            if let Some(body) = cache.get(url).await {
                return Ok(body);
            }
        }

        let body = self.client.get_text(url).await?;
        if let Some(cache) = &self.cache {
            cache.put(url, &body).await;
        }
        Ok(body)
    }

    /// Fetches and concatenates the statement report pages, `None` when the
    /// filing has no summary or the summary lists no statements.
    async fn fetch_statement_reports(
        &self,
        reference: &FilingReference,
    ) -> Result<Option<String>, FetchError> {
        let summary_url = format!("{}/FilingSummary.xml", reference.index_url);
        let summary = match self.get_cached(&summary_url).await {
            Ok(summary) => summary,
            Err(FetchError::NotFound { .. }) => {
                debug!("No filing summary");
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        let reports = match parse_reports(&summary) {
            Ok(reports) => statement_reports(&reports),
            Err(reason) => {
                warn!(%reason, "Unreadable filing summary");
                return Ok(None);
            }
        };
        if reports.is_empty() {
            return Ok(None);
        }

        let mut content = String::new();
        for report in &reports {
            let url = format!("{}/{}", reference.index_url, report.file_name);
            match self.get_cached(&url).await {
                Ok(page) => {
                    content.push_str(&page);
                    content.push('\n');
                }
                Err(FetchError::NotFound { .. }) => {
                    warn!(report = %report.file_name, "Statement report missing");
                }
                Err(e) => return Err(e),
            }
        }

        Ok((!content.is_empty()).then_some(content))
    }
}

#[async_trait]
impl DocumentFetcher for EdgarFetcher {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    #[instrument(skip(self, reference), fields(accession = %reference.accession_number, form = %reference.filing_type))]
    async fn fetch(&self, reference: &FilingReference) -> Result<RawDocument, FetchError> {
        if self.source == DocumentSource::StatementReports {
            if let Some(content) = self.fetch_statement_reports(reference).await? {
                info!(bytes = content.len(), "Fetched statement reports");
                return Ok(RawDocument::new(
                    reference.clone(),
                    content,
                    DocumentSource::StatementReports,
                ));
            }
            debug!("Falling back to primary document");
        }

        let content = self.get_cached(&reference.document_url).await?;
        info!(bytes = content.len(), "Fetched primary document");
        Ok(RawDocument::new(
            reference.clone(),
            content,
            DocumentSource::PrimaryDocument,
        ))
    }
}
