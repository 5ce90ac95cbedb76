#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundamentals/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! SEC EDGAR filer locator and document fetcher.
//!
//! # Example
//!
//! ```no_run
//! use fundamentals_core::{DocumentFetcher, FilerLocator, PipelineConfig, Ticker};
//! use fundamentals_edgar::{EdgarClient, EdgarFetcher, EdgarLocator};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = PipelineConfig::new().with_user_agent("MyApp/1.0 (contact@example.com)");
//!     let client = EdgarClient::new(&config)?;
//!
//!     let locator = EdgarLocator::new(client.clone(), &config);
//!     let fetcher = EdgarFetcher::new(client, config.document_source);
//!
//!     let filings = locator.locate(&Ticker::parse("AAPL")?, 3).await?;
//!     for filing in &filings {
//!         let doc = fetcher.fetch(filing).await?;
//!         println!("FY{} {}: {} bytes", filing.fiscal_year, filing.filing_type, doc.content.len());
//!     }
//!
//!     Ok(())
//! }
//! ```

/// Rate-limited HTTP transport.
pub mod client;
/// Document fetcher.
pub mod fetcher;
/// Filer locator.
pub mod locator;
/// Ticker to CIK registry.
pub mod registry;
/// `FilingSummary.xml` parsing.
pub mod summary;

pub use client::{EdgarClient, RetryPolicy};
pub use fetcher::EdgarFetcher;
pub use locator::EdgarLocator;
pub use registry::TickerRegistry;
pub use summary::{ReportEntry, StatementReport};
