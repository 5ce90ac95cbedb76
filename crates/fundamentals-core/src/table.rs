//! The assembled multi-year table and run diagnostics.

use polars::prelude::{Column, DataFrame, PlSmallStr, PolarsResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::ops::RangeInclusive;

use crate::error::{ConflictError, ExtractionError, FetchError};
use crate::statement::CanonicalKey;
use crate::types::{FilerId, Ticker};

/// The fiscal years of a lookback of `years_back` years ending at
/// `newest_fiscal_year`, without gaps. A lookback of zero still covers the
/// newest year.
///
/// # Example
/// ```
/// use fundamentals_core::lookback_window;
///
/// assert_eq!(lookback_window(2020, 3), 2018..=2020);
/// assert_eq!(lookback_window(2020, 0), 2020..=2020);
/// ```
#[must_use]
pub fn lookback_window(newest_fiscal_year: i32, years_back: u32) -> RangeInclusive<i32> {
    let span = i32::try_from(years_back.max(1)).unwrap_or(i32::MAX);
    newest_fiscal_year.saturating_sub(span - 1)..=newest_fiscal_year
}

/// One cell of a [`FinancialTable`].
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum TableCell {
    /// An extracted, normalized value.
    Value(f64),
    /// No value was extracted for this year. Never represented as zero.
    Missing,
    /// Equally authoritative filings disagreed; see [`Diagnostics::conflicts`].
    Unresolved,
}

impl TableCell {
    /// Returns the value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<f64> {
        match self {
            Self::Value(v) => Some(*v),
            Self::Missing | Self::Unresolved => None,
        }
    }

    /// Returns true for [`TableCell::Missing`].
    #[must_use]
    pub const fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }
}

/// Canonical line items by fiscal year.
///
/// Rows are ordered by [`CanonicalKey`] declaration order and every row holds
/// exactly one cell per fiscal year of the table, in ascending year order. A
/// row is present only when at least one of its cells is not
/// [`TableCell::Missing`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FinancialTable {
    ticker: Ticker,
    filer_id: FilerId,
    fiscal_years: Vec<i32>,
    rows: BTreeMap<CanonicalKey, Vec<(i32, TableCell)>>,
}

impl FinancialTable {
    /// Builds a table over `fiscal_years` from sparse cells.
    ///
    /// Years are sorted and de-duplicated. Cells for years outside the window
    /// are ignored; window years without a cell become [`TableCell::Missing`].
    #[must_use]
    pub fn from_cells(
        ticker: Ticker,
        filer_id: FilerId,
        fiscal_years: impl IntoIterator<Item = i32>,
        cells: &BTreeMap<(CanonicalKey, i32), TableCell>,
    ) -> Self {
        let fiscal_years: Vec<i32> = fiscal_years
            .into_iter()
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();

        let keys: BTreeSet<CanonicalKey> = cells
            .iter()
            .filter(|((_, year), cell)| !cell.is_missing() && fiscal_years.contains(year))
            .map(|((key, _), _)| *key)
            .collect();

        let rows = keys
            .into_iter()
            .map(|key| {
                let row = fiscal_years
                    .iter()
                    .map(|year| {
                        let cell = cells.get(&(key, *year)).copied().unwrap_or(TableCell::Missing);
                        (*year, cell)
                    })
                    .collect();
                (key, row)
            })
            .collect();

        Self {
            ticker,
            filer_id,
            fiscal_years,
            rows,
        }
    }

    /// Returns the ticker of the table.
    #[must_use]
    pub const fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    /// Returns the filer of the table.
    #[must_use]
    pub const fn filer_id(&self) -> FilerId {
        self.filer_id
    }

    /// Fiscal years of the table window, ascending.
    #[must_use]
    pub fn fiscal_years(&self) -> &[i32] {
        &self.fiscal_years
    }

    /// Iterates rows in display order.
    pub fn rows(&self) -> impl Iterator<Item = (CanonicalKey, &[(i32, TableCell)])> {
        self.rows.iter().map(|(key, row)| (*key, row.as_slice()))
    }

    /// Returns the cells of one row.
    #[must_use]
    pub fn row(&self, key: CanonicalKey) -> Option<&[(i32, TableCell)]> {
        self.rows.get(&key).map(Vec::as_slice)
    }

    /// Returns the cell for a key and year, `None` if the key has no row or the
    /// year is outside the window.
    #[must_use]
    pub fn cell(&self, key: CanonicalKey, fiscal_year: i32) -> Option<TableCell> {
        self.rows
            .get(&key)?
            .iter()
            .find(|(year, _)| *year == fiscal_year)
            .map(|(_, cell)| *cell)
    }

    /// Returns the value for a key and year.
    #[must_use]
    pub fn value(&self, key: CanonicalKey, fiscal_year: i32) -> Option<f64> {
        self.cell(key, fiscal_year).and_then(|cell| cell.value())
    }

    /// Years for which at least one value was extracted.
    #[must_use]
    pub fn covered_years(&self) -> BTreeSet<i32> {
        self.rows
            .values()
            .flatten()
            .filter(|(_, cell)| cell.value().is_some())
            .map(|(year, _)| *year)
            .collect()
    }

    /// Window years without any extracted value.
    #[must_use]
    pub fn missing_years(&self) -> BTreeSet<i32> {
        let covered = self.covered_years();
        self.fiscal_years
            .iter()
            .filter(|year| !covered.contains(year))
            .copied()
            .collect()
    }

    /// Returns true if no row holds a value.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.covered_years().is_empty()
    }

    /// Number of rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Converts the table to a DataFrame with a `line_item` column and one
    /// nullable `f64` column per fiscal year. Missing and unresolved cells are
    /// null.
    ///
    /// # Errors
    /// Returns an error if polars rejects the column layout.
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let labels: Vec<&str> = self.rows.keys().map(CanonicalKey::label).collect();
        let mut columns = Vec::with_capacity(self.fiscal_years.len() + 1);
        columns.push(Column::new(PlSmallStr::from("line_item"), labels));

        for (idx, year) in self.fiscal_years.iter().enumerate() {
            let values: Vec<Option<f64>> = self
                .rows
                .values()
                .map(|row| row.get(idx).and_then(|(_, cell)| cell.value()))
                .collect();
            columns.push(Column::new(PlSmallStr::from(year.to_string()), values));
        }

        DataFrame::new(columns)
    }
}

impl fmt::Display for FinancialTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        const LABEL_WIDTH: usize = 32;
        const CELL_WIDTH: usize = 18;

        writeln!(f, "{} (CIK {})", self.ticker, self.filer_id)?;
        write!(f, "{:<LABEL_WIDTH$}", "")?;
        for year in &self.fiscal_years {
            write!(f, "{:>CELL_WIDTH$}", format!("FY{year}"))?;
        }
        writeln!(f)?;

        for (key, row) in &self.rows {
            write!(f, "{:<LABEL_WIDTH$}", key.label())?;
            for (_, cell) in row {
                let text = match cell {
                    TableCell::Value(v) => format!("{v:.2}"),
                    TableCell::Missing => "-".to_string(),
                    TableCell::Unresolved => "?".to_string(),
                };
                write!(f, "{text:>CELL_WIDTH$}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Non-fatal findings of a run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Diagnostics {
    /// Window years for which no value was extracted.
    pub missing_years: BTreeSet<i32>,
    /// Labels that matched no canonical key.
    pub unrecognized_labels: BTreeSet<String>,
    /// Fetch failures by accession number.
    pub fetch_failures: Vec<(String, FetchError)>,
    /// Extraction failures by accession number.
    pub extraction_failures: Vec<(String, ExtractionError)>,
    /// Cells left unresolved because filings disagreed.
    pub conflicts: Vec<ConflictError>,
}

impl Diagnostics {
    /// Returns true if nothing was recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.missing_years.is_empty()
            && self.unrecognized_labels.is_empty()
            && self.fetch_failures.is_empty()
            && self.extraction_failures.is_empty()
            && self.conflicts.is_empty()
    }

    /// Sorts the failure lists so diagnostics do not depend on completion order.
    pub fn sort(&mut self) {
        self.fetch_failures.sort_by(|a, b| a.0.cmp(&b.0));
        self.extraction_failures.sort_by(|a, b| a.0.cmp(&b.0));
        self.conflicts
            .sort_by(|a, b| (a.key, a.fiscal_year).cmp(&(b.key, b.fiscal_year)));
    }

    /// Returns the partial-data warning, if any year or label is missing.
    #[must_use]
    pub fn partial_data_warning(&self) -> Option<PartialDataWarning> {
        if self.missing_years.is_empty() && self.unrecognized_labels.is_empty() {
            return None;
        }
        Some(PartialDataWarning {
            missing_years: self.missing_years.clone(),
            unrecognized_labels: self.unrecognized_labels.clone(),
        })
    }
}

/// Warning returned alongside a non-empty table when data is incomplete.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartialDataWarning {
    /// Window years for which no value was extracted.
    pub missing_years: BTreeSet<i32>,
    /// Labels that matched no canonical key.
    pub unrecognized_labels: BTreeSet<String>,
}

/// The result of a successful run: a (possibly partial) table plus diagnostics.
#[derive(Clone, Debug, PartialEq)]
pub struct FinancialReport {
    /// The assembled table.
    pub table: FinancialTable,
    /// Everything recorded during the run.
    pub diagnostics: Diagnostics,
}

impl FinancialReport {
    /// Returns the partial-data warning, if any.
    #[must_use]
    pub fn warning(&self) -> Option<PartialDataWarning> {
        self.diagnostics.partial_data_warning()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_table() -> FinancialTable {
        let mut cells = BTreeMap::new();
        cells.insert((CanonicalKey::Revenue, 2018), TableCell::Value(100.0));
        cells.insert((CanonicalKey::Revenue, 2020), TableCell::Value(120.0));
        cells.insert((CanonicalKey::NetIncome, 2020), TableCell::Unresolved);
        cells.insert((CanonicalKey::TotalAssets, 2019), TableCell::Missing);

        FinancialTable::from_cells(
            Ticker::parse("TEST").unwrap(),
            FilerId::new(42),
            [2020, 2018, 2019],
            &cells,
        )
    }

    #[test]
    fn test_lookback_window_has_no_gaps() {
        let years: Vec<i32> = lookback_window(2021, 4).collect();
        assert_eq!(years, vec![2018, 2019, 2020, 2021]);
        assert_eq!(lookback_window(2021, u32::MAX).end(), &2021);
    }

    #[test]
    fn test_from_cells_fills_missing() {
        let table = sample_table();

        assert_eq!(table.fiscal_years(), &[2018, 2019, 2020]);
        assert_eq!(table.cell(CanonicalKey::Revenue, 2019), Some(TableCell::Missing));
        assert_eq!(table.value(CanonicalKey::Revenue, 2020), Some(120.0));
        assert_eq!(table.cell(CanonicalKey::NetIncome, 2020), Some(TableCell::Unresolved));
        // A row made only of missing cells is not kept.
        assert!(table.row(CanonicalKey::TotalAssets).is_none());
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn test_covered_and_missing_years() {
        let table = sample_table();
        assert_eq!(table.covered_years(), BTreeSet::from([2018, 2020]));
        assert_eq!(table.missing_years(), BTreeSet::from([2019]));
        assert!(!table.is_empty());
    }

    #[test]
    fn test_row_order_follows_taxonomy() {
        let table = sample_table();
        let keys: Vec<_> = table.rows().map(|(key, _)| key).collect();
        assert_eq!(keys, vec![CanonicalKey::Revenue, CanonicalKey::NetIncome]);
    }

    #[test]
    fn test_to_dataframe_layout() {
        let df = sample_table().to_dataframe().unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(df.width(), 4);
        let fy2019 = df.column("2019").unwrap();
        assert_eq!(fy2019.null_count(), 2);
    }

    #[test]
    fn test_serialization_is_stable() {
        let a = serde_json::to_string(&sample_table()).unwrap();
        let b = serde_json::to_string(&sample_table()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_partial_data_warning() {
        let mut diagnostics = Diagnostics::default();
        assert!(diagnostics.partial_data_warning().is_none());

        diagnostics.missing_years.insert(2019);
        let warning = diagnostics.partial_data_warning().unwrap();
        assert_eq!(warning.missing_years, BTreeSet::from([2019]));
        assert!(warning.unrecognized_labels.is_empty());
    }

    #[test]
    fn test_display_marks_missing() {
        let text = sample_table().to_string();
        assert!(text.contains("FY2019"));
        assert!(text.contains("Revenue"));
        assert!(text.contains('?'));
    }
}
