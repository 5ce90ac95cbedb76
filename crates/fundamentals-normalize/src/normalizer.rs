//! Mapping of raw line items onto the canonical taxonomy.

use fundamentals_core::{CanonicalKey, CanonicalLineItem, RawLineItem, StatementType};
use fundamentals_extract::{is_per_share_label, is_share_count_label};
use once_cell::sync::Lazy;
use std::collections::{BTreeSet, HashMap, HashSet};
use tracing::{debug, trace};

use crate::fuzzy::{FUZZY_THRESHOLD, normalize_label, score, tokens};
use crate::synonyms::SYNONYMS;

struct Synonym {
    key: CanonicalKey,
    normalized: String,
    tokens: Vec<String>,
}

static TABLE: Lazy<Vec<Synonym>> = Lazy::new(|| {
    SYNONYMS
        .iter()
        .flat_map(|(key, labels)| {
            labels.iter().map(move |label| {
                let normalized = normalize_label(label);
                Synonym {
                    key: *key,
                    tokens: tokens(&normalized),
                    normalized,
                }
            })
        })
        .collect()
});

/// What a row measures. Decides which keys its label may map to, so that
/// "Basic" under earnings per share never lands on a share count.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum LabelKind {
    Amount,
    PerShare,
    ShareCount,
}

impl LabelKind {
    fn of(label: &str) -> Self {
        if is_share_count_label(label) {
            Self::ShareCount
        } else if is_per_share_label(label) {
            Self::PerShare
        } else {
            Self::Amount
        }
    }

    const fn admits(self, key: CanonicalKey) -> bool {
        match self {
            Self::PerShare => key.is_per_share(),
            Self::ShareCount => key.is_share_count(),
            Self::Amount => !key.is_per_share() && !key.is_share_count(),
        }
    }
}

/// Outcome of matching one label.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum LabelMatch {
    /// The normalized label equals a synonym.
    Exact(CanonicalKey),
    /// The best fuzzy candidate scored at or above the threshold.
    Fuzzy {
        /// The matched key.
        key: CanonicalKey,
        /// Similarity score (0-1).
        score: f64,
    },
    /// Two different keys share the best score.
    Ambiguous,
    /// Nothing scored at or above the threshold.
    Unrecognized,
}

impl LabelMatch {
    /// Returns the matched key, if any.
    #[must_use]
    pub const fn key(&self) -> Option<CanonicalKey> {
        match self {
            Self::Exact(key) | Self::Fuzzy { key, .. } => Some(*key),
            Self::Ambiguous | Self::Unrecognized => None,
        }
    }
}

/// Canonical items of one filing plus the labels that matched nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NormalizedItems {
    /// Canonical items, first occurrence per key and year, in input order.
    pub items: Vec<CanonicalLineItem>,
    /// Source labels that were not mapped.
    pub unrecognized_labels: BTreeSet<String>,
}

/// Maps raw line items onto [`CanonicalKey`]s, scales them to whole units and
/// applies each key's sign rule.
///
/// # Example
/// ```
/// use fundamentals_core::{CanonicalKey, RawLineItem, ReportingPeriod, StatementType, Unit};
/// use fundamentals_normalize::LabelNormalizer;
///
/// let item = RawLineItem {
///     source_label: "Total net sales".into(),
///     period: ReportingPeriod::year(2023),
///     value: 1_234.0,
///     unit: Unit::Thousands,
///     statement_type: StatementType::Income,
/// };
/// let normalized = LabelNormalizer::new().normalize(&[item]);
/// assert_eq!(normalized.items[0].canonical_key, CanonicalKey::Revenue);
/// assert_eq!(normalized.items[0].value, 1_234_000.0);
/// ```
#[derive(Clone, Copy, Debug)]
pub struct LabelNormalizer {
    threshold: f64,
}

impl Default for LabelNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl LabelNormalizer {
    /// Creates a normalizer with the default fuzzy threshold.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            threshold: FUZZY_THRESHOLD,
        }
    }

    /// Sets the minimum fuzzy score, clamped to 0-1.
    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold.clamp(0.0, 1.0);
        self
    }

    /// Returns the fuzzy threshold.
    #[must_use]
    pub const fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Matches a label against the synonyms of one statement's keys.
    #[must_use]
    pub fn match_label(&self, label: &str, statement: StatementType) -> LabelMatch {
        let kind = LabelKind::of(label);
        let normalized = normalize_label(label);
        let candidates = || {
            TABLE
                .iter()
                .filter(move |s| s.key.statement() == statement && kind.admits(s.key))
        };

        if let Some(synonym) = candidates().find(|s| s.normalized == normalized) {
            return LabelMatch::Exact(synonym.key);
        }

        let label_tokens = tokens(&normalized);
        let mut best: Option<(CanonicalKey, f64)> = None;
        let mut tied = false;
        for synonym in candidates() {
            let s = score(&label_tokens, &synonym.tokens);
            match best {
                Some((key, top)) if (s - top).abs() < f64::EPSILON => {
                    tied |= key != synonym.key;
                }
                Some((_, top)) if s < top => {}
                _ => {
                    best = Some((synonym.key, s));
                    tied = false;
                }
            }
        }

        match best {
            Some((_, s)) if s >= self.threshold && tied => LabelMatch::Ambiguous,
            Some((key, s)) if s >= self.threshold => LabelMatch::Fuzzy { key, score: s },
            _ => LabelMatch::Unrecognized,
        }
    }

    /// Normalizes the raw items of one filing.
    ///
    /// Values are multiplied by their unit (per-share amounts excepted) and
    /// signed by the key's [`SignRule`](fundamentals_core::SignRule). Within
    /// the filing the first item for a `(key, fiscal_year)` wins.
    #[must_use]
    pub fn normalize(&self, items: &[RawLineItem]) -> NormalizedItems {
        let mut out = NormalizedItems::default();
        let mut seen: HashSet<(CanonicalKey, i32)> = HashSet::new();
        let mut resolved: HashMap<(StatementType, &str), Option<CanonicalKey>> = HashMap::new();

        for item in items {
            let key = *resolved
                .entry((item.statement_type, item.source_label.as_str()))
                .or_insert_with(|| {
                    let matched = self.match_label(&item.source_label, item.statement_type);
                    match matched {
                        LabelMatch::Fuzzy { key, score } => {
                            debug!(label = %item.source_label, %key, score, "Fuzzy label match");
                        }
                        LabelMatch::Ambiguous => {
                            debug!(label = %item.source_label, "Ambiguous label left unmapped");
                        }
                        _ => {}
                    }
                    matched.key()
                });

            let Some(key) = key else {
                out.unrecognized_labels.insert(item.source_label.clone());
                continue;
            };
            let fiscal_year = item.period.fiscal_year;
            if !seen.insert((key, fiscal_year)) {
                trace!(%key, fiscal_year, label = %item.source_label, "Later occurrence ignored");
                continue;
            }

            let value = if key.is_per_share() {
                item.value
            } else {
                item.value * item.unit.multiplier()
            };
            out.items.push(CanonicalLineItem {
                canonical_key: key,
                fiscal_year,
                value: key.sign_rule().apply(value),
                statement_type: key.statement(),
            });
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fundamentals_core::{ReportingPeriod, Unit};
    use rstest::rstest;

    fn item(label: &str, value: f64, unit: Unit, statement_type: StatementType) -> RawLineItem {
        RawLineItem {
            source_label: label.to_string(),
            period: ReportingPeriod::year(2023),
            value,
            unit,
            statement_type,
        }
    }

    #[rstest]
    #[case("Net sales", StatementType::Income, CanonicalKey::Revenue)]
    #[case("Total cost of sales", StatementType::Income, CanonicalKey::CostOfRevenue)]
    #[case("Income before provision for income taxes", StatementType::Income, CanonicalKey::IncomeBeforeTax)]
    #[case("Net income (loss)", StatementType::Income, CanonicalKey::NetIncome)]
    #[case("Earnings per share - Basic", StatementType::Income, CanonicalKey::EpsBasic)]
    #[case("Basic (in shares)", StatementType::Income, CanonicalKey::SharesBasic)]
    #[case("Total shareholders\u{2019} equity", StatementType::Balance, CanonicalKey::StockholdersEquity)]
    #[case("Cash generated by/(used in) investing activities", StatementType::CashFlow, CanonicalKey::InvestingCashFlow)]
    fn test_exact_matches(
        #[case] label: &str,
        #[case] statement: StatementType,
        #[case] expected: CanonicalKey,
    ) {
        assert_eq!(
            LabelNormalizer::new().match_label(label, statement),
            LabelMatch::Exact(expected)
        );
    }

    #[rstest]
    #[case("Earnings per share - Basic (in dollars per share)", CanonicalKey::EpsBasic)]
    #[case("Shares used in computing earnings per share - Diluted (in shares)", CanonicalKey::SharesDiluted)]
    #[case("Selling, general and administrative expenses, net", CanonicalKey::SellingGeneralAdministrative)]
    fn test_fuzzy_matches(#[case] label: &str, #[case] expected: CanonicalKey) {
        let matched = LabelNormalizer::new().match_label(label, StatementType::Income);
        assert!(matches!(matched, LabelMatch::Fuzzy { .. }), "{matched:?}");
        assert_eq!(matched.key(), Some(expected));
    }

    #[test]
    fn test_matching_is_restricted_to_statement() {
        let normalizer = LabelNormalizer::new();
        assert_eq!(
            normalizer.match_label("Net income", StatementType::CashFlow),
            LabelMatch::Unrecognized
        );
    }

    #[rstest]
    #[case("Income from continuing operations")]
    #[case("Loss from continuing operations")]
    #[case("General and administrative")]
    #[case("Selling and marketing")]
    fn test_distinct_line_items_stay_unmapped(#[case] label: &str) {
        let normalizer = LabelNormalizer::new();
        assert_eq!(
            normalizer.match_label(label, StatementType::Income),
            LabelMatch::Unrecognized
        );

        let normalized =
            normalizer.normalize(&[item(label, 10.0, Unit::Millions, StatementType::Income)]);
        assert!(normalized.items.is_empty());
        assert!(normalized.unrecognized_labels.contains(label));
    }

    #[test]
    fn test_unrecognized_label_is_reported() {
        let normalized = LabelNormalizer::new().normalize(&[item(
            "Total selling, G&A, and other opex",
            10.0,
            Unit::Millions,
            StatementType::Income,
        )]);
        assert!(normalized.items.is_empty());
        assert!(
            normalized
                .unrecognized_labels
                .contains("Total selling, G&A, and other opex")
        );
    }

    #[test]
    fn test_unit_scaling() {
        let normalized = LabelNormalizer::new().normalize(&[
            item("Net sales", 1_234.0, Unit::Thousands, StatementType::Income),
            item("Earnings per share - Basic", 6.16, Unit::Ones, StatementType::Income),
            item("Basic (in shares)", 15_744.0, Unit::Millions, StatementType::Income),
        ]);
        let values: Vec<f64> = normalized.items.iter().map(|i| i.value).collect();
        assert_eq!(values, vec![1_234_000.0, 6.16, 15_744_000_000.0]);
    }

    #[test]
    fn test_sign_rules() {
        let normalized = LabelNormalizer::new().normalize(&[
            item("Cost of sales", 500.0, Unit::Ones, StatementType::Income),
            item("Net loss", -500.0, Unit::Ones, StatementType::Income),
            item("Purchases of property and equipment", -75.0, Unit::Ones, StatementType::CashFlow),
            item("Dividends paid", 20.0, Unit::Ones, StatementType::CashFlow),
        ]);
        let values: Vec<(CanonicalKey, f64)> = normalized
            .items
            .iter()
            .map(|i| (i.canonical_key, i.value))
            .collect();
        assert_eq!(
            values,
            vec![
                (CanonicalKey::CostOfRevenue, -500.0),
                (CanonicalKey::NetIncome, -500.0),
                (CanonicalKey::CapitalExpenditures, -75.0),
                (CanonicalKey::DividendsPaid, -20.0),
            ]
        );
    }

    #[test]
    fn test_first_occurrence_wins() {
        let normalized = LabelNormalizer::new().normalize(&[
            item("Total revenues", 100.0, Unit::Ones, StatementType::Income),
            item("Net sales", 90.0, Unit::Ones, StatementType::Income),
        ]);
        assert_eq!(normalized.items.len(), 1);
        assert_eq!(normalized.items[0].value, 100.0);
    }
}
