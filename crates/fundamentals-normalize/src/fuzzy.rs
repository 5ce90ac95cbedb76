//! Token-based label similarity.

use once_cell::sync::Lazy;
use regex::Regex;

/// Default minimum score for a fuzzy match.
pub const FUZZY_THRESHOLD: f64 = 0.80;

/// Minimum Jaro-Winkler similarity for two tokens to count as equal
/// ("expense" / "expenses").
pub const TOKEN_SIMILARITY: f64 = 0.92;

const STOP_WORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "by", "for", "from", "in", "of", "on", "or", "per", "the", "to",
    "with",
];

/// Tokens that change what a label measures. A label and a synonym only
/// match if they carry the same qualifiers.
const QUALIFIERS: &[&str] = &[
    "selling",
    "marketing",
    "other",
    "noncontrolling",
    "continuing",
    "discontinued",
    "comprehensive",
    "restricted",
    "current",
    "non",
    "noncurrent",
];

static FOOTNOTE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\[\s*[0-9a-z]{1,3}\s*\]|\(\s*(?:\d{1,2}|[a-z])\s*\)").expect("valid regex")
});

/// Normalizes a label for comparison: lower-cased, footnote markers removed,
/// `&` spelled out, punctuation dropped, whitespace collapsed and a leading
/// "total" removed.
///
/// # Example
/// ```
/// use fundamentals_normalize::normalize_label;
///
/// assert_eq!(normalize_label("Total Selling, General & Administrative (1)"), "selling general and administrative");
/// assert_eq!(normalize_label("Stockholders\u{2019} equity"), "stockholders equity");
/// ```
#[must_use]
pub fn normalize_label(label: &str) -> String {
    let lower = label
        .to_lowercase()
        .replace(['\'', '\u{2019}', '\u{2018}'], "")
        .replace('&', " and ");
    let lower = FOOTNOTE.replace_all(&lower, " ");
    let cleaned: String = lower
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let words: Vec<&str> = cleaned.split_whitespace().collect();
    let words = match words.split_first() {
        Some((&"total", rest)) if !rest.is_empty() => rest,
        _ => &words[..],
    };
    words.join(" ")
}

/// Splits a normalized label into distinct non-stop-word tokens.
#[must_use]
pub fn tokens(normalized: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for word in normalized.split_whitespace() {
        if !STOP_WORDS.contains(&word) && !out.iter().any(|t| t == word) {
            out.push(word.to_string());
        }
    }
    out
}

fn unmatched_qualifier(a: &[String], b: &[String]) -> bool {
    a.iter()
        .filter(|t| QUALIFIERS.contains(&t.as_str()))
        .any(|q| !b.contains(q))
}

fn tokens_match(a: &str, b: &str) -> bool {
    a == b || strsim::jaro_winkler(a, b) >= TOKEN_SIMILARITY
}

/// Dice coefficient of two token sets, where tokens pair up one-to-one if
/// they are equal or nearly so.
///
/// Returns 0 when either side is empty or when one side carries a qualifier
/// the other lacks.
///
/// # Example
/// ```
/// use fundamentals_normalize::{score, tokens};
///
/// let label = tokens("research and development expenses");
/// let synonym = tokens("research and development expense");
/// assert_eq!(score(&label, &synonym), 1.0);
/// ```
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn score(label: &[String], synonym: &[String]) -> f64 {
    if label.is_empty() || synonym.is_empty() {
        return 0.0;
    }
    if unmatched_qualifier(label, synonym) || unmatched_qualifier(synonym, label) {
        return 0.0;
    }

    let mut used = vec![false; synonym.len()];
    let mut matched = 0usize;
    for token in label {
        // exact pairs first so a near match cannot steal an exact partner
        let partner = (0..synonym.len())
            .find(|&i| !used[i] && synonym[i] == *token)
            .or_else(|| (0..synonym.len()).find(|&i| !used[i] && tokens_match(token, &synonym[i])));
        if let Some(i) = partner {
            used[i] = true;
            matched += 1;
        }
    }

    (2 * matched) as f64 / (label.len() + synonym.len()) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("Net sales", "net sales")]
    #[case("Total net sales", "net sales")]
    #[case("Total", "total")]
    #[case("Selling, general & administrative", "selling general and administrative")]
    #[case("Total stockholders' equity (deficit)", "stockholders equity deficit")]
    #[case("Net income (loss) [1]", "net income loss")]
    #[case("Cash generated by/(used in) investing activities", "cash generated by used in investing activities")]
    #[case("Revenue (a)", "revenue")]
    fn test_normalize_label(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(normalize_label(input), expected);
    }

    #[test]
    fn test_tokens_drop_stop_words_and_duplicates() {
        assert_eq!(
            tokens("shares used in computing earnings per share basic in shares"),
            vec!["shares", "used", "computing", "earnings", "share", "basic"]
        );
    }

    #[test]
    fn test_score_near_tokens() {
        let label = tokens("selling general and administrative expenses");
        let synonym = tokens("selling general and administrative expense");
        assert!((score(&label, &synonym) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_score_partial_overlap() {
        let label = tokens("selling g and a and other opex");
        let synonym = tokens("selling general and administrative");
        assert!(score(&label, &synonym) < FUZZY_THRESHOLD);
    }

    #[test]
    fn test_qualifier_must_agree() {
        let label = tokens("other operating income");
        let synonym = tokens("operating income");
        assert_eq!(score(&label, &synonym), 0.0);
    }

    #[test]
    fn test_synonym_qualifier_must_agree() {
        let label = tokens("general and administrative");
        let synonym = tokens("selling general and administrative");
        assert_eq!(score(&label, &synonym), 0.0);
    }

    #[test]
    fn test_continuing_operations_is_a_qualifier() {
        let label = tokens(&normalize_label("Income from continuing operations"));
        let synonym = tokens(&normalize_label("Income from operations"));
        assert_eq!(score(&label, &synonym), 0.0);
    }

    #[test]
    fn test_empty_tokens_score_zero() {
        assert_eq!(score(&[], &tokens("revenue")), 0.0);
    }
}
