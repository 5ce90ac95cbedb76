//! Ticker to CIK registry.

use fundamentals_core::{FilerId, Ticker};
use serde::Deserialize;
use std::collections::HashMap;

/// Company ticker information from SEC JSON.
#[derive(Debug, Deserialize)]
struct CompanyTickerInfo {
    /// CIK as a number (SEC returns this as an integer)
    cik_str: u64,
    /// Ticker symbol
    ticker: String,
}

/// Read-only mapping from ticker to filer.
///
/// Built from the SEC `company_tickers.json` document, whose top level is an
/// object of `{"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."}`
/// entries keyed by row number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickerRegistry {
    by_ticker: HashMap<String, FilerId>,
}

impl TickerRegistry {
    /// Parses a registry from the SEC JSON document.
    ///
    /// # Errors
    /// Returns the decoding error if the document has an unexpected shape.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let data: HashMap<String, CompanyTickerInfo> = serde_json::from_str(json)?;
        Ok(data
            .into_values()
            .map(|info| (info.ticker, FilerId::new(info.cik_str)))
            .collect())
    }

    /// Looks up the filer of a ticker.
    ///
    /// Share-class separators are interchangeable: `BRK.B` finds an entry
    /// registered as `BRK-B` and vice versa.
    #[must_use]
    pub fn lookup(&self, ticker: &Ticker) -> Option<FilerId> {
        let symbol = ticker.as_str();
        self.by_ticker
            .get(symbol)
            .or_else(|| self.by_ticker.get(&symbol.replace('.', "-")))
            .or_else(|| self.by_ticker.get(&symbol.replace('-', ".")))
            .copied()
    }

    /// Number of registered tickers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.by_ticker.len()
    }

    /// Returns true if no ticker is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_ticker.is_empty()
    }
}

impl<S: Into<String>> FromIterator<(S, FilerId)> for TickerRegistry {
    fn from_iter<I: IntoIterator<Item = (S, FilerId)>>(iter: I) -> Self {
        Self {
            by_ticker: iter
                .into_iter()
                .map(|(ticker, id)| (ticker.into().trim().to_uppercase(), id))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "0": {"cik_str": 320193, "ticker": "AAPL", "title": "Apple Inc."},
        "1": {"cik_str": 789019, "ticker": "MSFT", "title": "MICROSOFT CORP"},
        "2": {"cik_str": 1067983, "ticker": "BRK-B", "title": "BERKSHIRE HATHAWAY INC"}
    }"#;

    #[test]
    fn test_from_json() {
        let registry = TickerRegistry::from_json(SAMPLE).unwrap();
        assert_eq!(registry.len(), 3);
        assert_eq!(
            registry.lookup(&Ticker::parse("aapl").unwrap()),
            Some(FilerId::new(320193))
        );
    }

    #[test]
    fn test_share_class_separator() {
        let registry = TickerRegistry::from_json(SAMPLE).unwrap();
        assert_eq!(
            registry.lookup(&Ticker::parse("BRK.B").unwrap()),
            Some(FilerId::new(1067983))
        );
    }

    #[test]
    fn test_unknown_ticker() {
        let registry = TickerRegistry::from_json(SAMPLE).unwrap();
        assert!(registry.lookup(&Ticker::parse("ZZZZ").unwrap()).is_none());
    }

    #[test]
    fn test_malformed_json() {
        assert!(TickerRegistry::from_json("[1, 2, 3]").is_err());
    }
}
