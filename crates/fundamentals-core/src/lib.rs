#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundamentals/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Core traits and types for the financial statement extraction pipeline.
//!
//! This crate provides the foundational abstractions shared by every stage:
//!
//! - [`FilerLocator`](provider::FilerLocator) - Resolves a ticker to filing references
//! - [`DocumentFetcher`](provider::DocumentFetcher) - Retrieves raw filing documents
//! - [`DocumentCache`](cache::DocumentCache) - Caching abstraction for fetched documents
//! - [`FinancialTable`](table::FinancialTable) - The multi-year output table
//! - [`PipelineConfig`](config::PipelineConfig) - Run configuration

/// Cache trait for storing fetched documents.
pub mod cache;
/// Pipeline configuration.
pub mod config;
/// Error types for pipeline operations.
pub mod error;
/// Component traits for locating and fetching filings.
pub mod provider;
/// Statement types, units and the canonical line-item taxonomy.
pub mod statement;
/// The assembled multi-year table and run diagnostics.
pub mod table;
/// Core data types (Ticker, FilingReference, RawLineItem, etc.).
pub mod types;

// Re-export commonly used items at crate root
pub use cache::DocumentCache;
pub use config::{PeriodScope, PipelineConfig};
pub use error::{ConflictError, ExtractionError, FetchError, PipelineError, Result};
pub use provider::{DocumentFetcher, FilerLocator};
pub use statement::{CanonicalKey, SignRule, StatementType, Unit};
pub use table::{
    Diagnostics, FinancialReport, FinancialTable, PartialDataWarning, TableCell, lookback_window,
};
pub use types::{
    CanonicalLineItem, DocumentSource, FilerId, FilingReference, FilingType, RawDocument,
    RawLineItem, ReportingPeriod, Ticker,
};
