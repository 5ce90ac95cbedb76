//! Core data types for the extraction pipeline.
//!
//! This module defines the values that flow between pipeline stages:
//!
//! - [`Ticker`] - Validated trading symbol
//! - [`FilerId`] - SEC Central Index Key
//! - [`FilingType`] - Statement-bearing annual form types
//! - [`FilingReference`] - One located filing
//! - [`RawDocument`] - Fetched filing content
//! - [`RawLineItem`] - Extracted label/value pair for one period
//! - [`CanonicalLineItem`] - Normalized line item

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::PipelineError;
use crate::statement::{CanonicalKey, StatementType, Unit};

/// Maximum ticker length accepted by [`Ticker::parse`].
const MAX_TICKER_LEN: usize = 10;

/// A validated trading symbol.
///
/// Tickers are trimmed and uppercased on creation. Valid tickers are 1-10
/// characters long, start with a letter and contain only ASCII letters,
/// digits, `.` or `-` (e.g. `BRK.B`, `BF-B`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Ticker(String);

impl Ticker {
    /// Parses and validates a ticker.
    ///
    /// # Errors
    /// Returns [`PipelineError::InvalidTicker`] if the input is empty, too long
    /// or contains unsupported characters.
    ///
    /// # Example
    /// ```
    /// use fundamentals_core::Ticker;
    ///
    /// let ticker = Ticker::parse(" msft ").unwrap();
    /// assert_eq!(ticker.as_str(), "MSFT");
    /// assert!(Ticker::parse("not a ticker").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self, PipelineError> {
        let normalized = input.trim().to_uppercase();
        let invalid = |reason: &str| PipelineError::InvalidTicker {
            ticker: input.to_string(),
            reason: reason.to_string(),
        };

        if normalized.is_empty() {
            return Err(invalid("ticker is empty"));
        }
        if normalized.len() > MAX_TICKER_LEN {
            return Err(invalid("ticker is longer than 10 characters"));
        }
        if !normalized.starts_with(|c: char| c.is_ascii_alphabetic()) {
            return Err(invalid("ticker must start with a letter"));
        }
        if !normalized
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '.' || c == '-')
        {
            return Err(invalid("ticker may only contain letters, digits, '.' or '-'"));
        }

        Ok(Self(normalized))
    }

    /// Returns the ticker as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Ticker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Ticker {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// SEC Central Index Key identifying a filer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FilerId(u64);

impl FilerId {
    /// Creates a filer id from its numeric CIK.
    #[must_use]
    pub const fn new(cik: u64) -> Self {
        Self(cik)
    }

    /// Returns the numeric CIK.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }

    /// Returns the CIK zero-padded to 10 digits, as EDGAR URLs require.
    ///
    /// # Example
    /// ```
    /// use fundamentals_core::FilerId;
    ///
    /// assert_eq!(FilerId::new(320193).padded(), "0000320193");
    /// ```
    #[must_use]
    pub fn padded(&self) -> String {
        format!("{:010}", self.0)
    }
}

impl fmt::Display for FilerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.padded())
    }
}

impl FromStr for FilerId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().trim_start_matches("CIK").parse().map(Self)
    }
}

/// Statement-bearing annual filing forms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FilingType {
    /// Annual report (domestic filer).
    Form10K,
    /// Amended annual report.
    Form10KA,
    /// Annual report (foreign private issuer).
    Form20F,
    /// Amended 20-F.
    Form20FA,
    /// Annual report (Canadian issuer, MJDS).
    Form40F,
    /// Amended 40-F.
    Form40FA,
}

impl FilingType {
    /// Parses an EDGAR form string, returning `None` for forms that do not
    /// carry annual financial statements.
    #[must_use]
    pub fn from_form(form: &str) -> Option<Self> {
        match form.trim().to_uppercase().as_str() {
            "10-K" | "10-K405" => Some(Self::Form10K),
            "10-K/A" | "10-K405/A" => Some(Self::Form10KA),
            "20-F" => Some(Self::Form20F),
            "20-F/A" => Some(Self::Form20FA),
            "40-F" => Some(Self::Form40F),
            "40-F/A" => Some(Self::Form40FA),
            _ => None,
        }
    }

    /// Returns true for amended filings.
    #[must_use]
    pub const fn is_amendment(&self) -> bool {
        matches!(self, Self::Form10KA | Self::Form20FA | Self::Form40FA)
    }

    /// Returns the EDGAR form string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Form10K => "10-K",
            Self::Form10KA => "10-K/A",
            Self::Form20F => "20-F",
            Self::Form20FA => "20-F/A",
            Self::Form40F => "40-F",
            Self::Form40FA => "40-F/A",
        }
    }
}

impl fmt::Display for FilingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A located filing. Immutable once produced by a locator.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FilingReference {
    /// The filer.
    pub filer_id: FilerId,
    /// Form type.
    pub filing_type: FilingType,
    /// EDGAR accession number (e.g. "0000320193-23-000106").
    pub accession_number: String,
    /// Fiscal year the filing reports on.
    pub fiscal_year: i32,
    /// End of the reporting period.
    pub period_end: NaiveDate,
    /// Date the filing was accepted.
    pub filed_date: NaiveDate,
    /// URL of the primary document.
    pub document_url: String,
    /// URL of the filing folder (no trailing slash).
    pub index_url: String,
}

impl FilingReference {
    /// Returns the de-duplication key of this reference.
    #[must_use]
    pub fn identity(&self) -> (FilerId, FilingType, NaiveDate) {
        (self.filer_id, self.filing_type, self.period_end)
    }
}

/// What a [`RawDocument`] was assembled from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    /// The filing's individual statement report pages (`R*.htm`) listed in
    /// `FilingSummary.xml`, falling back to the primary document.
    #[default]
    StatementReports,
    /// The filing's primary document only.
    PrimaryDocument,
}

/// Raw content fetched for one filing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RawDocument {
    /// The filing the content belongs to.
    pub reference: FilingReference,
    /// Document body (HTML).
    pub content: String,
    /// What the content was assembled from.
    pub source: DocumentSource,
}

impl RawDocument {
    /// Creates a new raw document.
    #[must_use]
    pub fn new(reference: FilingReference, content: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            reference,
            content: content.into(),
            source,
        }
    }
}

/// The reporting period of an extracted value column.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReportingPeriod {
    /// Fiscal year of the period.
    pub fiscal_year: i32,
    /// Exact period end, when the column header carried a full date.
    pub end_date: Option<NaiveDate>,
}

impl ReportingPeriod {
    /// Period known only by its fiscal year.
    #[must_use]
    pub const fn year(fiscal_year: i32) -> Self {
        Self {
            fiscal_year,
            end_date: None,
        }
    }

    /// Period ending on a date; the fiscal year is the year of the end date.
    #[must_use]
    pub fn ending(end_date: NaiveDate) -> Self {
        use chrono::Datelike;
        Self {
            fiscal_year: end_date.year(),
            end_date: Some(end_date),
        }
    }
}

/// A label/value pair extracted from a statement table for one period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RawLineItem {
    /// Row label as printed (footnote markers removed).
    pub source_label: String,
    /// Period of the value column.
    pub period: ReportingPeriod,
    /// Reported value, sign from parentheses applied, not unit-scaled.
    pub value: f64,
    /// Declared unit of the value.
    pub unit: Unit,
    /// Statement the row was found in.
    pub statement_type: StatementType,
}

/// A normalized line item.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CanonicalLineItem {
    /// Canonical taxonomy key.
    pub canonical_key: CanonicalKey,
    /// Fiscal year of the value.
    pub fiscal_year: i32,
    /// Value in whole units, sign-normalized.
    pub value: f64,
    /// Statement of the key.
    pub statement_type: StatementType,
}
