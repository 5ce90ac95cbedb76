//! Cell value and row label parsing.

use once_cell::sync::Lazy;
use regex::Regex;

/// Bracketed footnote references: `[1]`, `[a]`.
static BRACKET_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\[\s*[0-9a-zA-Z]{1,3}\s*\]").expect("valid regex"));

/// Trailing parenthesised footnote markers on labels: `(1)`, `(a)`, `(iv)`.
static TRAILING_NOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\s*\((?:\d{1,2}|[a-z]|[ivx]{1,4})\))+\s*$").expect("valid regex"));

const DASHES: &[&str] = &["-", "\u{2013}", "\u{2014}", "--", "\u{2014}\u{2014}", "n/a", "N/A", "nm", "NM"];

/// Parses a statement cell into a number.
///
/// Currency symbols, thousands separators, spaces and footnote markers are
/// ignored. Parenthesised values are negative, also when the closing
/// parenthesis sits in the next cell. Blank cells, dashes and non-numeric text
/// yield `None`, never zero.
///
/// # Example
/// ```
/// use fundamentals_extract::parse_value;
///
/// assert_eq!(parse_value("$ 1,234"), Some(1234.0));
/// assert_eq!(parse_value("(500)"), Some(-500.0));
/// assert_eq!(parse_value("\u{2014}"), None);
/// ```
#[must_use]
pub fn parse_value(text: &str) -> Option<f64> {
    let stripped = BRACKET_NOTE.replace_all(text, "");
    let mut cleaned: String = stripped
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '*' | '\u{2020}' | '\u{2021}' | '\u{a0}') && !c.is_whitespace())
        .collect();

    if cleaned.is_empty() || DASHES.contains(&cleaned.as_str()) || cleaned.contains('%') {
        return None;
    }

    let mut negative = false;
    if let Some(rest) = cleaned.strip_prefix('(') {
        negative = true;
        cleaned = rest.trim_end_matches(')').to_string();
    } else if cleaned.ends_with(')') {
        // "(1,234" + ")" split across cells leaves a lone ")" here
        return None;
    }
    if let Some(rest) = cleaned.strip_prefix(['-', '\u{2212}']) {
        negative = !negative;
        cleaned = rest.to_string();
    }

    // plain decimal notation only; "1e400" or "inf" are not amounts
    if !cleaned.starts_with(|c: char| c.is_ascii_digit() || c == '.')
        || !cleaned.bytes().all(|b| b.is_ascii_digit() || b == b'.')
    {
        return None;
    }
    let value: f64 = cleaned.parse().ok().filter(|v: &f64| v.is_finite())?;
    Some(if negative { -value } else { value })
}

/// Cleans a row label: footnote markers removed, whitespace collapsed,
/// trailing colon dropped.
#[must_use]
pub fn clean_label(text: &str) -> String {
    let text = BRACKET_NOTE.replace_all(text, "");
    let text: String = text
        .chars()
        .filter(|c| !matches!(c, '*' | '\u{2020}' | '\u{2021}'))
        .collect();
    let text = crate::html::normalize_text(&text);
    let text = TRAILING_NOTE.replace(&text, "");
    text.trim().trim_end_matches(':').trim().to_string()
}

/// Returns true for labels of share counts.
#[must_use]
pub fn is_share_count_label(label: &str) -> bool {
    let lower = label.to_lowercase();
    if lower.contains("(in shares)")
        || lower.starts_with("shares used")
        || (lower.starts_with("weighted") && lower.contains("share"))
    {
        return true;
    }
    !mentions_per_share(&lower)
        && lower.contains("shares")
        && (lower.contains("outstanding") || lower.contains("used in"))
}

/// Returns true for labels of per-share amounts.
#[must_use]
pub fn is_per_share_label(label: &str) -> bool {
    !is_share_count_label(label) && mentions_per_share(&label.to_lowercase())
}

fn mentions_per_share(lower: &str) -> bool {
    ["per share", "per common share", "per diluted share", "per basic share", "earnings per", "dollars per"]
        .iter()
        .any(|p| lower.contains(p))
}
