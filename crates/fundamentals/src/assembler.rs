//! Multi-year assembly of normalized filings.

use chrono::NaiveDate;
use fundamentals_core::{
    CanonicalKey, CanonicalLineItem, ConflictError, FilerId, FilingReference, FinancialTable,
    TableCell, Ticker,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::warn;

/// The normalized items of one filing.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedFiling {
    /// The filing the items came from.
    pub reference: FilingReference,
    /// Canonical items of the filing.
    pub items: Vec<CanonicalLineItem>,
}

/// Merges normalized filings into one [`FinancialTable`].
///
/// For every `(key, fiscal_year)` the value of the latest filed filing wins,
/// so an amendment replaces its original and a restated comparative replaces
/// the figure first reported. Filings filed on the same day that disagree
/// leave the cell [`TableCell::Unresolved`] and produce a [`ConflictError`].
///
/// The merge only depends on the set of inputs, never on their order.
#[derive(Debug, Clone, Copy, Default)]
pub struct Assembler;

impl Assembler {
    /// Assembles `filings` over the fiscal years in `window`.
    #[must_use]
    pub fn assemble(
        ticker: &Ticker,
        filer_id: FilerId,
        window: &BTreeSet<i32>,
        filings: &[NormalizedFiling],
    ) -> (FinancialTable, Vec<ConflictError>) {
        let mut reported: BTreeMap<(CanonicalKey, i32), Vec<(NaiveDate, f64)>> = BTreeMap::new();
        for filing in filings {
            for item in &filing.items {
                if !window.contains(&item.fiscal_year) {
                    continue;
                }
                reported
                    .entry((item.canonical_key, item.fiscal_year))
                    .or_default()
                    .push((filing.reference.filed_date, item.value));
            }
        }

        let mut cells = BTreeMap::new();
        let mut conflicts = Vec::new();
        for ((key, fiscal_year), values) in reported {
            let Some(filed_date) = values.iter().map(|(date, _)| *date).max() else {
                continue;
            };
            let mut latest: Vec<f64> = values
                .iter()
                .filter(|(date, _)| *date == filed_date)
                .map(|(_, value)| *value)
                .collect();
            latest.sort_by(f64::total_cmp);
            latest.dedup();

            let cell = match latest.as_slice() {
                [value] => TableCell::Value(*value),
                _ => {
                    warn!(%key, fiscal_year, %filed_date, values = ?latest, "Conflicting values");
                    conflicts.push(ConflictError {
                        key,
                        fiscal_year,
                        filed_date,
                        values: latest,
                    });
                    TableCell::Unresolved
                }
            };
            cells.insert((key, fiscal_year), cell);
        }

        let table = FinancialTable::from_cells(ticker.clone(), filer_id, window.iter().copied(), &cells);
        (table, conflicts)
    }
}
