//! Reporting unit declarations.

use fundamentals_core::Unit;
use once_cell::sync::Lazy;
use regex::Regex;

/// "shares in Thousands", "number of shares, which are reflected in thousands".
static SHARES_IN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bshares\b[^.;$]{0,40}?\bin\s+(thousands|millions)\b").expect("valid regex")
});

/// "$ in Millions", "(In thousands, except per share data)".
static AMOUNTS_IN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bin\s+(thousands|millions)\b").expect("valid regex"));

/// "(000s)", "(000's)", "(000)".
static THOUSANDS_ABBREV: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(\s*000(?:'?s)?\s*\)").expect("valid regex"));

/// Units declared for one statement table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UnitDeclaration {
    /// Unit of monetary amounts.
    pub amounts: Option<Unit>,
    /// Unit of share counts, when declared separately.
    pub shares: Option<Unit>,
}

impl UnitDeclaration {
    /// Unit of monetary amounts, `Ones` when nothing was declared.
    #[must_use]
    pub fn amount_unit(&self) -> Unit {
        self.amounts.unwrap_or_default()
    }

    /// Unit of share counts, falling back to the amount unit.
    #[must_use]
    pub fn share_unit(&self) -> Unit {
        self.shares.or(self.amounts).unwrap_or_default()
    }

    /// Fills undeclared units from `other`.
    #[must_use]
    pub fn or(self, other: Self) -> Self {
        Self {
            amounts: self.amounts.or(other.amounts),
            shares: self.shares.or(other.shares),
        }
    }
}

fn unit_word(word: &str) -> Unit {
    if word.eq_ignore_ascii_case("millions") {
        Unit::Millions
    } else {
        Unit::Thousands
    }
}

/// Detects unit declarations in a title, header or heading text.
///
/// # Example
/// ```
/// use fundamentals_core::Unit;
/// use fundamentals_extract::detect_units;
///
/// let units = detect_units("USD ($) shares in Thousands, $ in Millions");
/// assert_eq!(units.amounts, Some(Unit::Millions));
/// assert_eq!(units.shares, Some(Unit::Thousands));
/// ```
#[must_use]
pub fn detect_units(text: &str) -> UnitDeclaration {
    let shares = SHARES_IN.captures(text).map(|c| unit_word(&c[1]));
    let remainder = SHARES_IN.replace_all(text, " ");

    let amounts = AMOUNTS_IN
        .captures(&remainder)
        .map(|c| unit_word(&c[1]))
        .or_else(|| THOUSANDS_ABBREV.is_match(&remainder).then_some(Unit::Thousands));

    UnitDeclaration { amounts, shares }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("CONSOLIDATED BALANCE SHEETS - USD ($) $ in Millions", Some(Unit::Millions), None)]
    #[case("(In thousands, except per share data)", Some(Unit::Thousands), None)]
    #[case(
        "(In millions, except number of shares, which are reflected in thousands, and per-share amounts)",
        Some(Unit::Millions),
        Some(Unit::Thousands)
    )]
    #[case("shares in Millions, $ in Millions", Some(Unit::Millions), Some(Unit::Millions))]
    #[case("Amounts in $ (000s)", Some(Unit::Thousands), None)]
    #[case("Year Ended December 31,", None, None)]
    fn test_detect_units(
        #[case] text: &str,
        #[case] amounts: Option<Unit>,
        #[case] shares: Option<Unit>,
    ) {
        let units = detect_units(text);
        assert_eq!(units.amounts, amounts);
        assert_eq!(units.shares, shares);
    }

    #[test]
    fn test_share_unit_falls_back_to_amounts() {
        let units = detect_units("(In thousands)");
        assert_eq!(units.share_unit(), Unit::Thousands);
        assert_eq!(UnitDeclaration::default().amount_unit(), Unit::Ones);
    }
}
