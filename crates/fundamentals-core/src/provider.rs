//! Component traits for the network-facing pipeline stages.
//!
//! - [`FilerLocator`] - Resolves a ticker to its annual filings
//! - [`DocumentFetcher`] - Retrieves the raw content of one filing
//!
//! The pipeline only sees these traits, so any stage can be replaced by an
//! in-memory fake in tests.

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    error::{FetchError, Result},
    types::{FilingReference, RawDocument, Ticker},
};

/// Resolves a ticker to the statement-bearing filings in a lookback window.
#[async_trait]
pub trait FilerLocator: Send + Sync + Debug {
    /// Returns the name of this locator (e.g., "SEC EDGAR").
    fn name(&self) -> &str;

    /// Locates annual filings for `ticker` covering the `years_back` most
    /// recent fiscal years.
    ///
    /// References are returned newest first and are unique per
    /// `(filer, filing type, period end)`.
    ///
    /// # Errors
    /// - [`PipelineError::UnknownTicker`](crate::PipelineError::UnknownTicker)
    ///   if no filer is registered for the ticker
    /// - [`PipelineError::IndexUnavailable`](crate::PipelineError::IndexUnavailable)
    ///   if the filing index cannot be retrieved
    /// - [`PipelineError::NoFilings`](crate::PipelineError::NoFilings) if the
    ///   window holds no statement-bearing filing
    async fn locate(&self, ticker: &Ticker, years_back: u32) -> Result<Vec<FilingReference>>;
}

/// Retrieves raw filing content.
///
/// Implementations must be safe to call concurrently for different references.
#[async_trait]
pub trait DocumentFetcher: Send + Sync + Debug {
    /// Returns the name of this fetcher.
    fn name(&self) -> &str;

    /// Fetches the document of one filing.
    ///
    /// # Errors
    /// Returns a classified [`FetchError`] once retries (if any) are spent.
    async fn fetch(&self, reference: &FilingReference) -> std::result::Result<RawDocument, FetchError>;
}
