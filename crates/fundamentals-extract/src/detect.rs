//! Statement section detection.
//!
//! A [`SectionDetector`] looks at one table in its document context and says
//! which primary statement, if any, the table is. Detectors are tried in a
//! fixed priority order by [`StatementExtractor`](crate::StatementExtractor).

use fundamentals_core::{ReportingPeriod, StatementType};
use std::fmt::Debug;

use crate::html::TableGrid;
use crate::units::UnitDeclaration;
use crate::values::parse_value;

/// Headings longer than this are prose, not statement titles.
pub(crate) const MAX_HEADING_LEN: usize = 160;

/// A table together with the document text around it.
#[derive(Debug, Clone, Copy)]
pub struct TableContext<'a> {
    /// The table.
    pub grid: &'a TableGrid,
    /// Text blocks preceding the table, nearest first.
    pub preceding_text: &'a [String],
}

impl<'a> TableContext<'a> {
    /// Creates a context.
    #[must_use]
    pub const fn new(grid: &'a TableGrid, preceding_text: &'a [String]) -> Self {
        Self {
            grid,
            preceding_text,
        }
    }

    /// The title carried by the table itself: its `<caption>`, or the text of
    /// a leading row holding no numbers.
    #[must_use]
    pub fn title(&self) -> Option<&'a str> {
        if let Some(caption) = self.grid.caption.as_deref() {
            return Some(caption);
        }
        let first = self.grid.rows.first()?;
        if first.cells.iter().skip(1).any(|c| parse_value(&c.text).is_some()) {
            return None;
        }
        self.grid.first_header_text()
    }
}

/// Strategy for recognizing a statement table.
pub trait SectionDetector: Send + Sync + Debug {
    /// Returns the name of this detector.
    fn name(&self) -> &'static str;

    /// Returns the statement type of the table, if recognized.
    fn detect(&self, context: &TableContext<'_>) -> Option<StatementType>;
}

/// Recognizes a statement title inside the table (EDGAR R pages put it in the
/// first header cell).
#[derive(Debug, Clone, Copy, Default)]
pub struct CaptionDetector;

impl SectionDetector for CaptionDetector {
    fn name(&self) -> &'static str {
        "caption"
    }

    fn detect(&self, context: &TableContext<'_>) -> Option<StatementType> {
        context.title().and_then(StatementType::classify_title)
    }
}

/// Recognizes a statement title in the headings preceding the table.
#[derive(Debug, Clone, Copy)]
pub struct HeadingDetector {
    max_blocks: usize,
}

impl HeadingDetector {
    /// Creates a detector looking at most `max_blocks` blocks back.
    #[must_use]
    pub const fn new(max_blocks: usize) -> Self {
        Self { max_blocks }
    }
}

impl Default for HeadingDetector {
    fn default() -> Self {
        Self::new(8)
    }
}

impl SectionDetector for HeadingDetector {
    fn name(&self) -> &'static str {
        "heading"
    }

    fn detect(&self, context: &TableContext<'_>) -> Option<StatementType> {
        context
            .preceding_text
            .iter()
            .take(self.max_blocks)
            .filter(|block| block.len() <= MAX_HEADING_LEN)
            .find_map(|block| StatementType::classify_title(block))
    }
}

const INCOME_SIGNATURES: &[&str] = &[
    "net sales",
    "revenue",
    "cost of sales",
    "cost of revenue",
    "gross profit",
    "gross margin",
    "operating income",
    "income from operations",
    "income before",
    "provision for income taxes",
    "earnings per share",
    "per share",
];

const BALANCE_SIGNATURES: &[&str] = &[
    "total assets",
    "total current assets",
    "total liabilities",
    "total current liabilities",
    "stockholders' equity",
    "shareholders' equity",
    "accounts payable",
    "retained earnings",
];

const CASH_FLOW_SIGNATURES: &[&str] = &[
    "operating activities",
    "investing activities",
    "financing activities",
    "depreciation",
    "cash paid for",
    "beginning of",
    "end of period",
    "end of year",
];

/// Recognizes a statement by its characteristic row labels.
#[derive(Debug, Clone, Copy)]
pub struct RowSignatureDetector {
    min_hits: usize,
}

impl RowSignatureDetector {
    /// Creates a detector requiring `min_hits` distinct signature labels.
    #[must_use]
    pub const fn new(min_hits: usize) -> Self {
        Self { min_hits }
    }

    fn hits(labels: &[String], signatures: &[&str]) -> usize {
        signatures
            .iter()
            .filter(|s| labels.iter().any(|l| l.contains(*s)))
            .count()
    }
}

impl Default for RowSignatureDetector {
    fn default() -> Self {
        Self::new(2)
    }
}

impl SectionDetector for RowSignatureDetector {
    fn name(&self) -> &'static str {
        "row_signature"
    }

    fn detect(&self, context: &TableContext<'_>) -> Option<StatementType> {
        let labels: Vec<String> = context
            .grid
            .rows
            .iter()
            .map(|r| r.label().to_lowercase().replace('\u{2019}', "'"))
            .filter(|l| !l.is_empty())
            .collect();

        let scores = [
            (StatementType::Income, Self::hits(&labels, INCOME_SIGNATURES)),
            (StatementType::Balance, Self::hits(&labels, BALANCE_SIGNATURES)),
            (StatementType::CashFlow, Self::hits(&labels, CASH_FLOW_SIGNATURES)),
        ];
        let best = scores.iter().map(|(_, n)| *n).max()?;
        if best < self.min_hits {
            return None;
        }
        let mut winners = scores.iter().filter(|(_, n)| *n == best);
        match (winners.next(), winners.next()) {
            (Some((statement, _)), None) => Some(*statement),
            _ => None,
        }
    }
}

/// The default detectors in priority order.
#[must_use]
pub fn default_detectors() -> Vec<Box<dyn SectionDetector>> {
    vec![
        Box::new(CaptionDetector),
        Box::new(HeadingDetector::default()),
        Box::new(RowSignatureDetector::default()),
    ]
}

/// One labelled row of a statement table.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementRow {
    /// Cleaned label, prefixed with its section heading when the label alone
    /// is generic ("Earnings per share - Basic").
    pub label: String,
    /// One value per period column of the table. `None` for blank cells.
    pub values: Vec<Option<f64>>,
}

/// One value column of a statement table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodColumn {
    /// Period the column reports.
    pub period: ReportingPeriod,
    /// Combined header text of the column.
    pub header: String,
}

impl PeriodColumn {
    /// Returns true for quarter and other sub-annual columns.
    #[must_use]
    pub fn is_interim(&self) -> bool {
        let lower = self.header.to_lowercase();
        ["3 months", "three months", "6 months", "six months", "9 months", "nine months", "quarter"]
            .iter()
            .any(|m| lower.contains(m))
    }
}

/// A statement table with periods and units resolved.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementTable {
    /// Title found in or above the table.
    pub title: Option<String>,
    /// Declared units.
    pub units: UnitDeclaration,
    /// Value columns in table order.
    pub columns: Vec<PeriodColumn>,
    /// Rows holding at least one value, in document order.
    pub rows: Vec<StatementRow>,
}

impl StatementTable {
    /// Returns true if no row holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// A detected statement section.
#[derive(Debug, Clone, PartialEq)]
pub enum ParsedSection {
    /// Income statement.
    Income(StatementTable),
    /// Balance sheet.
    Balance(StatementTable),
    /// Cash flow statement.
    CashFlow(StatementTable),
}

impl ParsedSection {
    /// Wraps a table in the variant for `statement_type`.
    #[must_use]
    pub fn new(statement_type: StatementType, table: StatementTable) -> Self {
        match statement_type {
            StatementType::Income => Self::Income(table),
            StatementType::Balance => Self::Balance(table),
            StatementType::CashFlow => Self::CashFlow(table),
        }
    }

    /// Returns the statement type.
    #[must_use]
    pub const fn statement_type(&self) -> StatementType {
        match self {
            Self::Income(_) => StatementType::Income,
            Self::Balance(_) => StatementType::Balance,
            Self::CashFlow(_) => StatementType::CashFlow,
        }
    }

    /// Returns the table.
    #[must_use]
    pub const fn table(&self) -> &StatementTable {
        match self {
            Self::Income(t) | Self::Balance(t) | Self::CashFlow(t) => t,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    fn grid(html: &str) -> TableGrid {
        let doc = Html::parse_document(html);
        let selector = Selector::parse("table").unwrap();
        TableGrid::from_element(doc.select(&selector).next().unwrap())
    }

    #[test]
    fn test_caption_detector_uses_first_header_cell() {
        let grid = grid(
            r#"<table>
                <tr><th>CONSOLIDATED BALANCE SHEETS - USD ($) $ in Millions</th><th>Sep. 30, 2023</th></tr>
                <tr><td>Total assets</td><td>352,583</td></tr>
            </table>"#,
        );
        let ctx = TableContext::new(&grid, &[]);
        assert_eq!(CaptionDetector.detect(&ctx), Some(StatementType::Balance));
    }

    #[test]
    fn test_caption_detector_ignores_table_of_contents() {
        let grid = grid(
            r#"<table>
                <tr><td>Consolidated Statements of Operations</td><td>28</td></tr>
                <tr><td>Consolidated Balance Sheets</td><td>30</td></tr>
            </table>"#,
        );
        let ctx = TableContext::new(&grid, &[]);
        assert_eq!(CaptionDetector.detect(&ctx), None);
    }

    #[test]
    fn test_heading_detector_skips_prose() {
        let grid = grid("<table><tr><td>Net sales</td><td>1</td></tr></table>");
        let prose = "The following table shows amounts recorded in the consolidated statements of \
                     operations for each of the three years ended December 31, 2023, together with \
                     the related tax effects and reclassifications."
            .to_string();
        let blocks = vec![prose, "CONSOLIDATED STATEMENTS OF CASH FLOWS".to_string()];
        let ctx = TableContext::new(&grid, &blocks);
        assert_eq!(HeadingDetector::default().detect(&ctx), Some(StatementType::CashFlow));
    }

    #[test]
    fn test_row_signature_detector() {
        let grid = grid(
            r#"<table>
                <tr><td>Net cash provided by operating activities</td><td>10</td></tr>
                <tr><td>Net cash used in investing activities</td><td>(4)</td></tr>
                <tr><td>Net income</td><td>3</td></tr>
            </table>"#,
        );
        let ctx = TableContext::new(&grid, &[]);
        assert_eq!(RowSignatureDetector::default().detect(&ctx), Some(StatementType::CashFlow));
    }

    #[test]
    fn test_row_signature_needs_two_hits() {
        let grid = grid("<table><tr><td>Total assets</td><td>10</td></tr></table>");
        let ctx = TableContext::new(&grid, &[]);
        assert_eq!(RowSignatureDetector::default().detect(&ctx), None);
    }

    #[test]
    fn test_interim_columns() {
        let column = PeriodColumn {
            period: ReportingPeriod::year(2023),
            header: "3 Months Ended Dec. 31, 2023".into(),
        };
        assert!(column.is_interim());
    }
}
