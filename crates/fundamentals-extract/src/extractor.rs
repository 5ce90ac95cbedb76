//! Statement extraction from filing HTML.

use fundamentals_core::{
    ExtractionError, FilingReference, PeriodScope, RawDocument, RawLineItem, ReportingPeriod,
    StatementType, Unit,
};
use once_cell::sync::Lazy;
use scraper::{Html, Selector};
use std::collections::BTreeSet;
use tracing::{debug, instrument, trace};

use crate::detect::{
    MAX_HEADING_LEN, ParsedSection, PeriodColumn, SectionDetector, StatementRow, StatementTable,
    TableContext, default_detectors,
};
use crate::html::{GridRow, TableGrid, preceding_text};
use crate::periods::parse_period;
use crate::units::{UnitDeclaration, detect_units};
use crate::values::{clean_label, is_per_share_label, is_share_count_label, parse_value};

static TABLE: Lazy<Selector> = Lazy::new(|| Selector::parse("table").expect("valid selector"));

/// Preceding text blocks considered for headings and unit declarations.
const CONTEXT_BLOCKS: usize = 8;

/// A recognized table before the per-statement choice is made.
struct Candidate {
    statement_type: StatementType,
    /// Index of the detector that recognized the table (lower is stronger).
    rank: usize,
    detector: &'static str,
    table: StatementTable,
}

/// Outcome of scanning one document.
#[derive(Debug, Default)]
struct Scan {
    sections: Vec<ParsedSection>,
    /// Statement types recognized only in tables without numeric rows.
    empty: BTreeSet<StatementType>,
}

/// Locates primary statements in filing HTML and emits their raw line items.
///
/// Each table is offered to the detectors in priority order and tagged with
/// the first statement type reported. When several tables are tagged with the
/// same type, a table recognized by a stronger detector wins over one
/// recognized by a weaker one, then the first in document order.
#[derive(Debug)]
pub struct StatementExtractor {
    detectors: Vec<Box<dyn SectionDetector>>,
    period_scope: PeriodScope,
}

impl Default for StatementExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl StatementExtractor {
    /// Creates an extractor with the default detectors, extracting the
    /// current period only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            detectors: default_detectors(),
            period_scope: PeriodScope::default(),
        }
    }

    /// Replaces the detectors. Order is priority order.
    #[must_use]
    pub fn with_detectors(mut self, detectors: Vec<Box<dyn SectionDetector>>) -> Self {
        self.detectors = detectors;
        self
    }

    /// Sets which period columns are extracted.
    #[must_use]
    pub fn with_period_scope(mut self, scope: PeriodScope) -> Self {
        self.period_scope = scope;
        self
    }

    /// Returns the configured period scope.
    #[must_use]
    pub const fn period_scope(&self) -> PeriodScope {
        self.period_scope
    }

    /// Extracts the raw line items of the `expected` statements. An empty
    /// slice means every statement type.
    ///
    /// Statements that are expected but absent are skipped as long as one
    /// statement yields items.
    ///
    /// # Errors
    /// - [`ExtractionError::EmptySection`] if a statement was located but none
    ///   of its rows holds a value for the selected periods.
    /// - [`ExtractionError::NoStatementFound`] if no expected statement was
    ///   located.
    #[instrument(skip(self, document, expected), fields(accession = %document.reference.accession_number))]
    pub fn extract(
        &self,
        document: &RawDocument,
        expected: &[StatementType],
    ) -> Result<Vec<RawLineItem>, ExtractionError> {
        let expected = if expected.is_empty() { &StatementType::ALL[..] } else { expected };
        let scan = self.scan(document);

        let mut items = Vec::new();
        let mut empty = scan.empty;
        for section in scan.sections.iter().filter(|s| expected.contains(&s.statement_type())) {
            let emitted = self.line_items(section, &document.reference);
            if emitted.is_empty() {
                empty.insert(section.statement_type());
            }
            items.extend(emitted);
        }

        if !items.is_empty() {
            debug!(items = items.len(), "Extracted line items");
            return Ok(items);
        }
        if let Some(statement_type) = expected.iter().find(|t| empty.contains(t)) {
            return Err(ExtractionError::EmptySection {
                statement_type: *statement_type,
            });
        }
        Err(ExtractionError::NoStatementFound {
            expected: expected.to_vec(),
        })
    }

    /// Returns the statement sections of a document, at most one per type,
    /// in [`StatementType::ALL`] order.
    #[must_use]
    pub fn sections(&self, document: &RawDocument) -> Vec<ParsedSection> {
        self.scan(document).sections
    }

    fn scan(&self, document: &RawDocument) -> Scan {
        let html = Html::parse_document(&document.content);
        let fallback = ReportingPeriod {
            fiscal_year: document.reference.fiscal_year,
            end_date: Some(document.reference.period_end),
        };

        let mut scan = Scan::default();
        let mut candidates: Vec<Candidate> = Vec::new();

        for element in html.select(&TABLE) {
            let grid = TableGrid::from_element(element);
            if grid.is_empty() {
                continue;
            }
            let blocks = preceding_text(element, CONTEXT_BLOCKS);
            let context = TableContext::new(&grid, &blocks);

            let Some((rank, detector, statement_type)) =
                self.detectors.iter().enumerate().find_map(|(rank, d)| {
                    d.detect(&context).map(|t| (rank, d.name(), t))
                })
            else {
                continue;
            };

            let table = build_table(&context, fallback);
            if table.is_empty() {
                trace!(%statement_type, detector, "Ignoring table without numeric rows");
                scan.empty.insert(statement_type);
                continue;
            }
            candidates.push(Candidate {
                statement_type,
                rank,
                detector,
                table,
            });
        }

        for statement_type in StatementType::ALL {
            // min_by_key keeps the first of equal ranks, i.e. document order
            let chosen = candidates
                .iter()
                .enumerate()
                .filter(|(_, c)| c.statement_type == statement_type)
                .min_by_key(|(_, c)| c.rank)
                .map(|(i, _)| i);
            if let Some(i) = chosen {
                let candidate = candidates.remove(i);
                debug!(
                    %statement_type,
                    detector = candidate.detector,
                    rows = candidate.table.rows.len(),
                    columns = candidate.table.columns.len(),
                    "Located statement"
                );
                scan.empty.remove(&statement_type);
                scan.sections.push(ParsedSection::new(statement_type, candidate.table));
            }
        }
        scan
    }

    fn line_items(&self, section: &ParsedSection, reference: &FilingReference) -> Vec<RawLineItem> {
        let table = section.table();
        let columns = self.selected_columns(table, reference);
        if columns.is_empty() {
            debug!(
                statement_type = %section.statement_type(),
                period_end = %reference.period_end,
                "No column for the filing period"
            );
        }

        let mut items = Vec::new();
        for row in &table.rows {
            let unit = row_unit(&row.label, table.units);
            for &i in &columns {
                let Some(Some(value)) = row.values.get(i) else {
                    continue;
                };
                items.push(RawLineItem {
                    source_label: row.label.clone(),
                    period: table.columns[i].period,
                    value: *value,
                    unit,
                    statement_type: section.statement_type(),
                });
            }
        }
        items
    }

    /// Indices of the columns to emit. Interim columns are skipped whenever
    /// an annual column exists. For the current period only a column dated at
    /// the filing's period end or in its fiscal year qualifies; a table
    /// without one emits nothing rather than filing another year's figures.
    fn selected_columns(&self, table: &StatementTable, reference: &FilingReference) -> Vec<usize> {
        let annual: Vec<usize> = (0..table.columns.len())
            .filter(|&i| !table.columns[i].is_interim())
            .collect();
        let candidates = if annual.is_empty() {
            (0..table.columns.len()).collect()
        } else {
            annual
        };

        match self.period_scope {
            PeriodScope::AllPeriods => candidates,
            PeriodScope::CurrentPeriod => {
                let period = |i: usize| table.columns[i].period;
                candidates
                    .iter()
                    .find(|&&i| period(i).end_date == Some(reference.period_end))
                    .or_else(|| {
                        candidates
                            .iter()
                            .find(|&&i| period(i).fiscal_year == reference.fiscal_year)
                    })
                    .copied()
                    .into_iter()
                    .collect()
            }
        }
    }
}

fn row_unit(label: &str, units: UnitDeclaration) -> Unit {
    if is_per_share_label(label) {
        Unit::Ones
    } else if is_share_count_label(label) {
        units.share_unit()
    } else {
        units.amount_unit()
    }
}

fn is_bare_year(text: &str) -> bool {
    let text = text.trim();
    text.len() == 4
        && text.bytes().all(|b| b.is_ascii_digit())
        && (text.starts_with("19") || text.starts_with("20"))
}

/// A row with a label and at least one number that is not a year heading.
fn is_data_row(row: &GridRow) -> bool {
    !row.is_header()
        && !clean_label(row.label()).is_empty()
        && row
            .cells
            .iter()
            .skip(1)
            .any(|c| c.is_origin && !is_bare_year(&c.text) && parse_value(&c.text).is_some())
}

/// Labels that only make sense under their section heading.
fn is_generic_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    lower.starts_with("basic") || lower.starts_with("diluted")
}

/// Period of one column from its header texts, top to bottom.
///
/// The lowest header row that names a period decides; a bare year there is
/// completed with a full date from the rows above when the years agree
/// ("December 31," over "2023").
fn column_period(texts: &[&str]) -> Option<ReportingPeriod> {
    let nearest = texts.iter().rev().find_map(|t| parse_period(t))?;
    if nearest.end_date.is_some() {
        return Some(nearest);
    }
    match parse_period(&texts.join(" ")) {
        Some(combined) if combined.fiscal_year == nearest.fiscal_year => Some(combined),
        _ => Some(nearest),
    }
}

fn build_table(context: &TableContext<'_>, fallback: ReportingPeriod) -> StatementTable {
    let grid = context.grid;
    let header_len = grid.rows.iter().take_while(|r| !is_data_row(r)).count();
    let (header, body) = grid.rows.split_at(header_len);
    let title = context.title().map(str::to_string);

    // consecutive columns with the same header form one value column
    let mut columns: Vec<(PeriodColumn, Vec<usize>)> = Vec::new();
    for col in 1..grid.width {
        let mut texts: Vec<&str> = Vec::new();
        for row in header {
            let text = row.cells[col].text.as_str();
            if !text.is_empty() && texts.last() != Some(&text) && Some(text) != title.as_deref() {
                texts.push(text);
            }
        }
        let Some(period) = column_period(&texts) else {
            continue;
        };
        let column = PeriodColumn {
            period,
            header: texts.join(" "),
        };
        match columns.last_mut() {
            Some((last, cols)) if *last == column && cols.last() == Some(&(col - 1)) => cols.push(col),
            _ => columns.push((column, vec![col])),
        }
    }

    if columns.is_empty() {
        let first_value_column = (1..grid.width).find(|&col| {
            body.iter()
                .any(|r| parse_value(&r.cells[col].text).is_some())
        });
        if let Some(col) = first_value_column {
            columns.push((
                PeriodColumn {
                    period: fallback,
                    header: String::new(),
                },
                vec![col],
            ));
        }
    }

    let mut rows = Vec::new();
    let mut section: Option<String> = None;
    for row in body {
        let label = clean_label(row.label());
        if label.is_empty() {
            continue;
        }
        let values: Vec<Option<f64>> = columns
            .iter()
            .map(|(_, cols)| cols.iter().find_map(|&c| parse_value(&row.cells[c].text)))
            .collect();
        if values.iter().all(Option::is_none) {
            section = Some(label);
            continue;
        }
        let label = match &section {
            Some(heading) if is_generic_label(&label) => format!("{heading} - {label}"),
            _ => label,
        };
        rows.push(StatementRow { label, values });
    }

    let header_text = header
        .iter()
        .flat_map(|r| r.cells.iter().filter(|c| c.is_origin))
        .map(|c| c.text.as_str())
        .collect::<Vec<_>>()
        .join(" ");
    let mut units = title.as_deref().map(detect_units).unwrap_or_default();
    units = units.or(detect_units(&header_text));
    for block in context.preceding_text.iter().filter(|b| b.len() <= MAX_HEADING_LEN) {
        units = units.or(detect_units(block));
    }

    StatementTable {
        title,
        units,
        columns: columns.into_iter().map(|(column, _)| column).collect(),
        rows,
    }
}
