//! `FilingSummary.xml` parsing.
//!
//! XBRL filings since 2009 ship a `FilingSummary.xml` listing every rendered
//! report (`R1.htm`, `R2.htm`, ...) with its title. The primary statements are
//! the reports whose short name is a statement title, which makes them far
//! easier to extract than the full primary document.

use fundamentals_core::StatementType;
use quick_xml::Reader;
use quick_xml::events::Event;

/// One `<Report>` entry of a filing summary.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportEntry {
    /// `<ShortName>`, e.g. "CONSOLIDATED BALANCE SHEETS".
    pub short_name: String,
    /// `<HtmlFileName>`, e.g. "R4.htm".
    pub html_file_name: Option<String>,
    /// `<MenuCategory>`, e.g. "Statements" or "Details".
    pub menu_category: Option<String>,
    /// `<Position>` within the summary.
    pub position: Option<u32>,
}

/// A report identified as one of the primary statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatementReport {
    /// The statement the report renders.
    pub statement_type: StatementType,
    /// Report title.
    pub title: String,
    /// HTML file name relative to the filing folder.
    pub file_name: String,
}

/// Parses every `<Report>` entry of a filing summary.
///
/// # Errors
/// Returns a description of the XML error.
pub fn parse_reports(xml: &str) -> Result<Vec<ReportEntry>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut reports = Vec::new();
    let mut current: Option<ReportEntry> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).into_owned();
                if name == "Report" {
                    current = Some(ReportEntry::default());
                } else if current.is_some() {
                    field = Some(name);
                }
            }
            Ok(Event::Text(t)) => {
                let (Some(report), Some(field)) = (current.as_mut(), field.as_deref()) else {
                    continue;
                };
                let text = t.unescape().map_err(|e| e.to_string())?.trim().to_string();
                match field {
                    "ShortName" => report.short_name = text,
                    "HtmlFileName" => report.html_file_name = Some(text),
                    "MenuCategory" => report.menu_category = Some(text),
                    "Position" => report.position = text.parse().ok(),
                    _ => {}
                }
            }
            Ok(Event::End(e)) => {
                if e.name().as_ref() == b"Report" {
                    if let Some(report) = current.take() {
                        reports.push(report);
                    }
                }
                field = None;
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(format!(
                    "XML error at position {}: {e}",
                    reader.buffer_position()
                ));
            }
            _ => {}
        }
    }

    Ok(reports)
}

/// Selects the primary statement reports, at most one per statement type.
///
/// Reports outside the "Statements" menu category, parenthetical and detail
/// reports and reports without an HTML rendering are skipped. The lowest
/// position wins when several reports render the same statement.
#[must_use]
pub fn statement_reports(reports: &[ReportEntry]) -> Vec<StatementReport> {
    let mut ordered: Vec<&ReportEntry> = reports.iter().collect();
    ordered.sort_by_key(|r| r.position.unwrap_or(u32::MAX));

    let mut selected: Vec<StatementReport> = Vec::new();
    for report in ordered {
        let in_statements = report
            .menu_category
            .as_deref()
            .is_none_or(|c| c.eq_ignore_ascii_case("statements"));
        if !in_statements {
            continue;
        }
        let Some(file_name) = report.html_file_name.as_ref() else {
            continue;
        };
        let Some(statement_type) = StatementType::classify_title(&report.short_name) else {
            continue;
        };
        if selected.iter().any(|s| s.statement_type == statement_type) {
            continue;
        }
        selected.push(StatementReport {
            statement_type,
            title: report.short_name.clone(),
            file_name: file_name.clone(),
        });
    }
    selected
}

#[cfg(test)]
mod tests {
    use super::*;

    const SUMMARY: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<FilingSummary>
  <Version>3.23.3</Version>
  <MyReports>
    <Report instance="aapl-20230930.htm">
      <IsDefault>false</IsDefault>
      <HtmlFileName>R1.htm</HtmlFileName>
      <LongName>0000001 - Document - Cover Page</LongName>
      <ShortName>Cover Page</ShortName>
      <MenuCategory>Cover</MenuCategory>
      <Position>1</Position>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R2.htm</HtmlFileName>
      <ShortName>CONSOLIDATED STATEMENTS OF OPERATIONS</ShortName>
      <MenuCategory>Statements</MenuCategory>
      <Position>2</Position>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R3.htm</HtmlFileName>
      <ShortName>CONSOLIDATED STATEMENTS OF COMPREHENSIVE INCOME</ShortName>
      <MenuCategory>Statements</MenuCategory>
      <Position>3</Position>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R4.htm</HtmlFileName>
      <ShortName>CONSOLIDATED BALANCE SHEETS</ShortName>
      <MenuCategory>Statements</MenuCategory>
      <Position>4</Position>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R5.htm</HtmlFileName>
      <ShortName>CONSOLIDATED BALANCE SHEETS (Parenthetical)</ShortName>
      <MenuCategory>Statements</MenuCategory>
      <Position>5</Position>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R7.htm</HtmlFileName>
      <ShortName>CONSOLIDATED STATEMENTS OF CASH FLOWS</ShortName>
      <MenuCategory>Statements</MenuCategory>
      <Position>7</Position>
    </Report>
    <Report instance="aapl-20230930.htm">
      <HtmlFileName>R40.htm</HtmlFileName>
      <ShortName>Income Taxes - Statement of Income Details</ShortName>
      <MenuCategory>Details</MenuCategory>
      <Position>40</Position>
    </Report>
  </MyReports>
</FilingSummary>"#;

    #[test]
    fn test_parse_reports() {
        let reports = parse_reports(SUMMARY).unwrap();
        assert_eq!(reports.len(), 7);
        assert_eq!(reports[1].short_name, "CONSOLIDATED STATEMENTS OF OPERATIONS");
        assert_eq!(reports[1].html_file_name.as_deref(), Some("R2.htm"));
        assert_eq!(reports[1].position, Some(2));
    }

    #[test]
    fn test_statement_reports_selection() {
        let reports = parse_reports(SUMMARY).unwrap();
        let selected = statement_reports(&reports);

        let files: Vec<_> = selected.iter().map(|s| s.file_name.as_str()).collect();
        assert_eq!(files, vec!["R2.htm", "R4.htm", "R7.htm"]);
        assert_eq!(selected[0].statement_type, StatementType::Income);
        assert_eq!(selected[1].statement_type, StatementType::Balance);
        assert_eq!(selected[2].statement_type, StatementType::CashFlow);
    }

    #[test]
    fn test_malformed_summary() {
        assert!(parse_reports("<FilingSummary><Report></FilingSummary>").is_err());
    }
}
