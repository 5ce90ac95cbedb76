#![doc = include_str!("../README.md")]
#![doc(issue_tracker_base_url = "https://github.com/factordynamics/fundamentals/issues/")]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

//! Statement extraction from filing HTML.
//!
//! # Example
//!
//! ```
//! use chrono::NaiveDate;
//! use fundamentals_core::{
//!     DocumentSource, FilerId, FilingReference, FilingType, RawDocument, StatementType, Unit,
//! };
//! use fundamentals_extract::StatementExtractor;
//!
//! let reference = FilingReference {
//!     filer_id: FilerId::new(320193),
//!     filing_type: FilingType::Form10K,
//!     accession_number: "0000320193-23-000106".into(),
//!     fiscal_year: 2023,
//!     period_end: NaiveDate::from_ymd_opt(2023, 9, 30).unwrap(),
//!     filed_date: NaiveDate::from_ymd_opt(2023, 11, 3).unwrap(),
//!     document_url: "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106/aapl-20230930.htm".into(),
//!     index_url: "https://www.sec.gov/Archives/edgar/data/320193/000032019323000106".into(),
//! };
//! let html = r#"<table>
//!     <tr><th>CONSOLIDATED BALANCE SHEETS - USD ($) $ in Millions</th><th>Sep. 30, 2023</th></tr>
//!     <tr><td>Total assets</td><td>$ 352,583</td></tr>
//! </table>"#;
//! let document = RawDocument::new(reference, html, DocumentSource::StatementReports);
//!
//! let items = StatementExtractor::new()
//!     .extract(&document, &[StatementType::Balance])
//!     .unwrap();
//! assert_eq!(items[0].source_label, "Total assets");
//! assert_eq!(items[0].value, 352_583.0);
//! assert_eq!(items[0].unit, Unit::Millions);
//! ```

/// Section detection strategies and parsed sections.
pub mod detect;
/// The statement extractor.
pub mod extractor;
/// HTML table grids.
pub mod html;
/// Column header period parsing.
pub mod periods;
/// Unit declarations.
pub mod units;
/// Cell values and row labels.
pub mod values;

pub use detect::{
    CaptionDetector, HeadingDetector, ParsedSection, PeriodColumn, RowSignatureDetector,
    SectionDetector, StatementRow, StatementTable, TableContext, default_detectors,
};
pub use extractor::StatementExtractor;
pub use html::{GridCell, GridRow, TableGrid};
pub use periods::parse_period;
pub use units::{UnitDeclaration, detect_units};
pub use values::{clean_label, is_per_share_label, is_share_count_label, parse_value};
