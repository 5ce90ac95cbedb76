#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundamentals/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Financial statement extraction pipeline.
//!
//! This crate re-exports the core types and every pipeline stage, and provides
//! [`FinancialPipeline`] which runs them end to end with bounded fetch
//! concurrency and cancellation.
//!
//! # Features
//!
//! - `edgar` - SEC EDGAR locator and fetcher, used by [`FinancialPipeline::new`]

// Core types and traits
pub use fundamentals_core::*;

// Cache implementations
pub use fundamentals_cache::{InMemoryCache, NoopCache};

// EDGAR
#[cfg(feature = "edgar")]
pub use fundamentals_edgar::{EdgarClient, EdgarFetcher, EdgarLocator, TickerRegistry};

// Statement extraction and label normalization
pub use fundamentals_extract::{StatementExtractor, detect_units, parse_value};
pub use fundamentals_normalize::{LabelMatch, LabelNormalizer, NormalizedItems};

/// Merging of normalized filings into a multi-year table.
pub mod assembler;
/// The end-to-end pipeline.
pub mod pipeline;

pub use assembler::{Assembler, NormalizedFiling};
pub use pipeline::FinancialPipeline;
