//! Reporting period parsing from column headers.

use chrono::NaiveDate;
use fundamentals_core::ReportingPeriod;
use once_cell::sync::Lazy;
use regex::Regex;

/// "Sep. 30, 2023", "September 30, 2023", "Sept 30 2023".
static MONTH_DAY_YEAR: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b(jan|feb|mar|apr|may|jun|jul|aug|sep|oct|nov|dec)[a-z]*\.?\s+(\d{1,2}),?\s+(\d{4})\b")
        .expect("valid regex")
});

/// "12/31/2023".
static US_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4})\b").expect("valid regex"));

/// "2023-12-31".
static ISO_DATE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{4})-(\d{2})-(\d{2})\b").expect("valid regex"));

/// "2023", "Fiscal 2023", "FY2023".
static YEAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:\b|FY)((?:19|20)\d{2})\b").expect("valid regex"));

fn month_number(name: &str) -> Option<u32> {
    let month = match name.to_ascii_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

/// Parses the reporting period of a column header.
///
/// Full dates win over bare years; when a header holds several dates the last
/// one is used ("Jan. 1, 2023 - Dec. 31, 2023" ends on Dec. 31). The fiscal
/// year is the year of the period end.
///
/// # Example
/// ```
/// use fundamentals_extract::parse_period;
///
/// let period = parse_period("12 Months Ended Sep. 30, 2023").unwrap();
/// assert_eq!(period.fiscal_year, 2023);
/// assert!(parse_period("Net sales").is_none());
/// ```
#[must_use]
pub fn parse_period(text: &str) -> Option<ReportingPeriod> {
    if let Some(date) = last_date(text) {
        return Some(ReportingPeriod::ending(date));
    }
    YEAR.captures_iter(text)
        .last()
        .and_then(|c| c[1].parse().ok())
        .map(ReportingPeriod::year)
}

fn last_date(text: &str) -> Option<NaiveDate> {
    let ymd = |y: &str, m: u32, d: &str| NaiveDate::from_ymd_opt(y.parse().ok()?, m, d.parse().ok()?);

    let month_day_year = MONTH_DAY_YEAR.captures_iter(text).filter_map(|c| {
        let date = ymd(&c[3], month_number(&c[1])?, &c[2])?;
        Some((c.get(0)?.start(), date))
    });
    let us = US_DATE.captures_iter(text).filter_map(|c| {
        let date = ymd(&c[3], c[1].parse().ok()?, &c[2])?;
        Some((c.get(0)?.start(), date))
    });
    let iso = ISO_DATE.captures_iter(text).filter_map(|c| {
        let date = ymd(&c[1], c[2].parse().ok()?, &c[3])?;
        Some((c.get(0)?.start(), date))
    });

    month_day_year
        .chain(us)
        .chain(iso)
        .max_by_key(|(pos, _)| *pos)
        .map(|(_, date)| date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(y, m, d)
    }

    #[rstest]
    #[case("Sep. 30, 2023", 2023, date(2023, 9, 30))]
    #[case("September 30, 2023", 2023, date(2023, 9, 30))]
    #[case("Sept 30 2023", 2023, date(2023, 9, 30))]
    #[case("12 Months Ended Dec. 31, 2022", 2022, date(2022, 12, 31))]
    #[case("12/31/2021", 2021, date(2021, 12, 31))]
    #[case("2020-06-30", 2020, date(2020, 6, 30))]
    #[case("2019", 2019, None)]
    #[case("Fiscal 2018", 2018, None)]
    #[case("FY2017", 2017, None)]
    #[case("December 31, 2023 2022", 2023, date(2023, 12, 31))]
    fn test_parse_period(
        #[case] input: &str,
        #[case] fiscal_year: i32,
        #[case] end_date: Option<NaiveDate>,
    ) {
        let period = parse_period(input).unwrap();
        assert_eq!(period.fiscal_year, fiscal_year);
        assert_eq!(period.end_date, end_date);
    }

    #[rstest]
    #[case("")]
    #[case("Net sales")]
    #[case("12 Months Ended")]
    #[case("USD ($) $ in Millions")]
    fn test_no_period(#[case] input: &str) {
        assert!(parse_period(input).is_none());
    }
}
