//! Error types for pipeline operations.
//!
//! This module defines one error enum per failure class:
//!
//! - [`FetchError`] - network retrieval failures, classified as retryable or not
//! - [`ExtractionError`] - a document held no recognizable statement section
//! - [`ConflictError`] - two equally authoritative filings disagree on a value
//! - [`PipelineError`] - errors that end a run for a ticker
//!
//! Only [`PipelineError`] is ever returned from a run. The other three are
//! recorded in [`Diagnostics`](crate::table::Diagnostics) and degrade the run to
//! a partial result instead of failing it.

use chrono::NaiveDate;
use thiserror::Error;

use crate::statement::{CanonicalKey, StatementType};
use crate::table::Diagnostics;
use crate::types::FilingReference;

/// Errors that can occur while retrieving a document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The resource does not exist (404/410). Never retried.
    #[error("Not found: {url}")]
    NotFound {
        /// The requested URL.
        url: String,
    },

    /// Timeouts, connection failures, rate limiting or 5xx responses that
    /// persisted after the retry budget was spent.
    #[error("Transient failure for {url} after {attempts} attempt(s): {reason}")]
    Transient {
        /// The requested URL.
        url: String,
        /// Number of attempts made.
        attempts: u32,
        /// Description of the last failure.
        reason: String,
    },

    /// Failures that retrying cannot fix (malformed URL, other 4xx, undecodable body).
    #[error("Permanent failure for {url}: {reason}")]
    Permanent {
        /// The requested URL.
        url: String,
        /// Description of the failure.
        reason: String,
    },
}

impl FetchError {
    /// Returns true if the failure class is worth retrying.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    /// Returns the URL the failure refers to.
    #[must_use]
    pub fn url(&self) -> &str {
        match self {
            Self::NotFound { url } | Self::Transient { url, .. } | Self::Permanent { url, .. } => {
                url
            }
        }
    }
}

/// Errors raised by the statement extractor for a single document.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// None of the expected statement sections could be located.
    #[error("No recognizable statement section found (expected {expected:?})")]
    NoStatementFound {
        /// Statement types that were searched for.
        expected: Vec<StatementType>,
    },

    /// A statement section was located but held no numeric rows.
    #[error("Statement section {statement_type} contains no numeric rows")]
    EmptySection {
        /// The statement type of the empty section.
        statement_type: StatementType,
    },
}

/// Two filings with the same filed date report different values for one cell.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("Conflicting values for {key} FY{fiscal_year} from filings filed {filed_date}: {values:?}")]
pub struct ConflictError {
    /// Canonical line item of the cell.
    pub key: CanonicalKey,
    /// Fiscal year of the cell.
    pub fiscal_year: i32,
    /// The shared filed date of the disagreeing filings.
    pub filed_date: NaiveDate,
    /// The distinct values reported, ascending.
    pub values: Vec<f64>,
}

/// Errors that end a pipeline run.
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The ticker is syntactically invalid.
    #[error("Invalid ticker {ticker:?}: {reason}")]
    InvalidTicker {
        /// The rejected input.
        ticker: String,
        /// Why the input was rejected.
        reason: String,
    },

    /// The filer registry has no entry for this ticker.
    #[error("Unknown ticker: {ticker}")]
    UnknownTicker {
        /// The ticker that was looked up.
        ticker: String,
    },

    /// The filing index (or ticker registry) could not be retrieved.
    #[error("Filing index unavailable for {ticker}: {cause}")]
    IndexUnavailable {
        /// The ticker being located.
        ticker: String,
        /// The underlying fetch failure.
        cause: FetchError,
    },

    /// The ticker registry could not be loaded up front.
    #[error("Ticker registry unavailable: {0}")]
    RegistryUnavailable(FetchError),

    /// The filer has no statement-bearing filings in the lookback window.
    #[error("No annual filings found for {ticker}")]
    NoFilings {
        /// The ticker being located.
        ticker: String,
    },

    /// Every fetch failed, leaving zero usable years.
    #[error("Fetch failed for {} ({}): {cause}", reference.accession_number, reference.filing_type)]
    FetchFailure {
        /// The last filing whose fetch failed.
        reference: Box<FilingReference>,
        /// The fetch failure.
        cause: FetchError,
    },

    /// Documents were fetched but no usable year could be extracted.
    #[error("No usable financial data extracted for {ticker}")]
    NoUsableData {
        /// The ticker of the run.
        ticker: String,
        /// Everything that was recorded during the run.
        diagnostics: Box<Diagnostics>,
    },

    /// The run was cancelled by the caller.
    #[error("Pipeline run cancelled")]
    Cancelled,

    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using [`PipelineError`].
pub type Result<T> = std::result::Result<T, PipelineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_classification() {
        let transient = FetchError::Transient {
            url: "https://example.com/a".to_string(),
            attempts: 3,
            reason: "HTTP 503".to_string(),
        };
        let missing = FetchError::NotFound {
            url: "https://example.com/b".to_string(),
        };

        assert!(transient.is_retryable());
        assert!(!missing.is_retryable());
        assert_eq!(missing.url(), "https://example.com/b");
    }

    #[test]
    fn test_conflict_error_display() {
        let err = ConflictError {
            key: CanonicalKey::Revenue,
            fiscal_year: 2020,
            filed_date: NaiveDate::from_ymd_opt(2021, 3, 1).unwrap(),
            values: vec![100.0, 105.0],
        };
        let msg = err.to_string();
        assert!(msg.contains("Revenue"));
        assert!(msg.contains("FY2020"));
    }
}
