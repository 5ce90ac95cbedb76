//! Filer locator backed by the EDGAR submissions API.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use fundamentals_core::{
    FetchError, FilerId, FilerLocator, FilingReference, FilingType, PipelineConfig,
    PipelineError, Result, Ticker, lookback_window,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::OnceCell;
use tracing::{debug, info, instrument, warn};

use crate::client::EdgarClient;
use crate::registry::TickerRegistry;

/// Company submissions/filings metadata.
#[derive(Debug, Deserialize)]
struct CompanySubmissions {
    /// Filing history
    filings: SubmissionFilings,
}

#[derive(Debug, Deserialize)]
struct SubmissionFilings {
    /// Most recent filings (columnar)
    recent: FilingColumns,
    /// Older history pages
    #[serde(default)]
    files: Vec<HistoryFile>,
}

/// A page of older filings.
#[derive(Debug, Deserialize)]
struct HistoryFile {
    /// File name relative to `/submissions/`
    name: String,
}

/// Columnar filing list, as used by both `recent` and history pages.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilingColumns {
    #[serde(default)]
    accession_number: Vec<String>,
    #[serde(default)]
    filing_date: Vec<String>,
    #[serde(default)]
    report_date: Vec<String>,
    #[serde(default)]
    form: Vec<String>,
    #[serde(default)]
    primary_document: Vec<String>,
}

/// Where the ticker registry comes from.
#[derive(Debug, Clone)]
enum RegistrySource {
    File(PathBuf),
    Url(String),
}

/// SEC EDGAR filer locator.
///
/// Resolves tickers through a [`TickerRegistry`] loaded once per locator and
/// read-only afterwards, then reads the filer's submissions index.
#[derive(Debug)]
pub struct EdgarLocator {
    client: EdgarClient,
    registry: OnceCell<Arc<TickerRegistry>>,
    registry_source: RegistrySource,
    edgar_data_url: String,
    archives_url: String,
}

impl EdgarLocator {
    /// Create a locator sharing `client` and reading endpoints from `config`.
    #[must_use]
    pub fn new(client: EdgarClient, config: &PipelineConfig) -> Self {
        let registry_source = match &config.ticker_registry_path {
            Some(path) => RegistrySource::File(path.clone()),
            None => RegistrySource::Url(config.tickers_url.clone()),
        };

        Self {
            client,
            registry: OnceCell::new(),
            registry_source,
            edgar_data_url: config.edgar_data_url.trim_end_matches('/').to_string(),
            archives_url: config.archives_url.trim_end_matches('/').to_string(),
        }
    }

    /// Create a locator and load its ticker registry right away, so that
    /// resolving a ticker never goes to the network.
    ///
    /// # Errors
    /// [`PipelineError::RegistryUnavailable`] if the registry cannot be read
    /// or downloaded.
    pub async fn load(client: EdgarClient, config: &PipelineConfig) -> Result<Self> {
        let locator = Self::new(client, config);
        locator
            .loaded_registry()
            .await
            .map_err(PipelineError::RegistryUnavailable)?;
        Ok(locator)
    }

    /// Use a pre-built registry instead of loading one.
    #[must_use]
    pub fn with_registry(mut self, registry: TickerRegistry) -> Self {
        self.registry = OnceCell::new_with(Some(Arc::new(registry)));
        self
    }

    async fn loaded_registry(&self) -> std::result::Result<Arc<TickerRegistry>, FetchError> {
        self.registry
            .get_or_try_init(|| async {
                let registry = self.load_registry().await?;
                info!(tickers = registry.len(), "Loaded ticker registry");
                Ok::<_, FetchError>(Arc::new(registry))
            })
            .await
            .cloned()
    }

    async fn registry(&self, ticker: &Ticker) -> Result<Arc<TickerRegistry>> {
        self.loaded_registry()
            .await
            .map_err(|cause| PipelineError::IndexUnavailable {
                ticker: ticker.to_string(),
                cause,
            })
    }

    async fn load_registry(&self) -> std::result::Result<TickerRegistry, FetchError> {
        let (origin, body) = match &self.registry_source {
            RegistrySource::File(path) => {
                let origin = path.display().to_string();
                debug!(path = %origin, "Reading ticker registry from disk");
                let body = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| FetchError::Permanent {
                        url: origin.clone(),
                        reason: e.to_string(),
                    })?;
                (origin, body)
            }
            RegistrySource::Url(url) => {
                debug!(%url, "Fetching ticker registry");
                (url.clone(), self.client.get_text(url).await?)
            }
        };

        TickerRegistry::from_json(&body).map_err(|e| FetchError::Permanent {
            url: origin,
            reason: format!("Failed to parse ticker registry: {e}"),
        })
    }

    /// Resolves a ticker to its filer.
    ///
    /// # Errors
    /// [`PipelineError::UnknownTicker`] or, if the registry cannot be loaded,
    /// [`PipelineError::IndexUnavailable`].
    pub async fn resolve(&self, ticker: &Ticker) -> Result<FilerId> {
        self.registry(ticker)
            .await?
            .lookup(ticker)
            .ok_or_else(|| PipelineError::UnknownTicker {
                ticker: ticker.to_string(),
            })
    }

    fn annual_filings(&self, filer_id: FilerId, columns: &FilingColumns) -> Vec<FilingReference> {
        (0..columns.accession_number.len())
            .filter_map(|i| {
                let filing_type = FilingType::from_form(columns.form.get(i)?)?;
                let accession = columns.accession_number.get(i)?;
                let filed_date = parse_date(columns.filing_date.get(i)?)?;
                let report_date = columns.report_date.get(i).and_then(|d| parse_date(d));
                let primary = columns
                    .primary_document
                    .get(i)
                    .map(String::as_str)
                    .unwrap_or_default();
                Some(self.reference(filer_id, filing_type, accession, filed_date, report_date, primary))
            })
            .collect()
    }

    fn reference(
        &self,
        filer_id: FilerId,
        filing_type: FilingType,
        accession: &str,
        filed_date: NaiveDate,
        report_date: Option<NaiveDate>,
        primary_document: &str,
    ) -> FilingReference {
        let index_url = format!(
            "{}/{}/{}",
            self.archives_url,
            filer_id.as_u64(),
            accession.replace('-', "")
        );
        let document_url = if primary_document.is_empty() {
            format!("{index_url}/{accession}.txt")
        } else {
            format!("{index_url}/{primary_document}")
        };
        let period_end = report_date.unwrap_or(filed_date);
        let fiscal_year = match report_date {
            Some(date) => date.year(),
            None => fallback_fiscal_year(filed_date),
        };

        FilingReference {
            filer_id,
            filing_type,
            accession_number: accession.to_string(),
            fiscal_year,
            period_end,
            filed_date,
            document_url,
            index_url,
        }
    }
}

#[async_trait]
impl FilerLocator for EdgarLocator {
    fn name(&self) -> &str {
        "SEC EDGAR"
    }

    #[instrument(skip(self), fields(ticker = %ticker))]
    async fn locate(&self, ticker: &Ticker, years_back: u32) -> Result<Vec<FilingReference>> {
        let filer_id = self.resolve(ticker).await?;

        let url = format!("{}/submissions/CIK{}.json", self.edgar_data_url, filer_id.padded());
        let submissions: CompanySubmissions =
            self.client
                .get_json(&url)
                .await
                .map_err(|cause| PipelineError::IndexUnavailable {
                    ticker: ticker.to_string(),
                    cause,
                })?;

        let mut filings = self.annual_filings(filer_id, &submissions.filings.recent);

        for file in &submissions.filings.files {
            if window_covered(&filings, years_back) {
                break;
            }
            let page_url = format!("{}/submissions/{}", self.edgar_data_url, file.name);
            match self.client.get_json::<FilingColumns>(&page_url).await {
                Ok(columns) => filings.extend(self.annual_filings(filer_id, &columns)),
                Err(e) => {
                    warn!(error = %e, "History page unavailable, index may be incomplete");
                    break;
                }
            }
        }

        let filings = select_window(dedup(filings), years_back);
        if filings.is_empty() {
            return Err(PipelineError::NoFilings {
                ticker: ticker.to_string(),
            });
        }

        info!(
            cik = %filer_id,
            filings = filings.len(),
            "Located annual filings"
        );
        Ok(filings)
    }
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").ok()
}

/// Fiscal year of a filing without a period of report: annual reports filed
/// in the first quarter cover the previous calendar year.
fn fallback_fiscal_year(filed_date: NaiveDate) -> i32 {
    if filed_date.month() < 4 {
        filed_date.year() - 1
    } else {
        filed_date.year()
    }
}

/// True once the oldest filing seen reaches back to the window start.
fn window_covered(filings: &[FilingReference], years_back: u32) -> bool {
    let years = filings.iter().map(|f| f.fiscal_year);
    match (years.clone().max(), years.min()) {
        (Some(newest), Some(oldest)) => oldest <= *lookback_window(newest, years_back).start(),
        _ => false,
    }
}

/// Keeps one reference per `(filer, type, period end)`, the latest filed.
fn dedup(filings: Vec<FilingReference>) -> Vec<FilingReference> {
    let mut latest: HashMap<_, FilingReference> = HashMap::new();
    for filing in filings {
        match latest.get(&filing.identity()) {
            Some(existing)
                if (existing.filed_date, &existing.accession_number)
                    >= (filing.filed_date, &filing.accession_number) => {}
            _ => {
                latest.insert(filing.identity(), filing);
            }
        }
    }
    latest.into_values().collect()
}

/// Keeps the filings of the `years_back` fiscal years ending at the newest
/// filing, newest first. Years without a filing stay gaps in the window.
fn select_window(mut filings: Vec<FilingReference>, years_back: u32) -> Vec<FilingReference> {
    let Some(newest) = filings.iter().map(|f| f.fiscal_year).max() else {
        return filings;
    };
    let window = lookback_window(newest, years_back);
    filings.retain(|f| window.contains(&f.fiscal_year));
    filings.sort_by(|a, b| {
        b.period_end
            .cmp(&a.period_end)
            .then(b.filed_date.cmp(&a.filed_date))
            .then(a.accession_number.cmp(&b.accession_number))
    });
    filings
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeSet;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn registry() -> TickerRegistry {
        [("TEST", FilerId::new(1234))].into_iter().collect()
    }

    fn config(server: &MockServer) -> PipelineConfig {
        PipelineConfig::new()
            .with_base_url(&server.uri())
            .with_min_request_interval(Duration::from_millis(1))
            .with_retry(1, Duration::from_millis(1))
    }

    fn locator(server: &MockServer) -> EdgarLocator {
        let config = config(server);
        let client = EdgarClient::new(&config).unwrap();
        EdgarLocator::new(client, &config).with_registry(registry())
    }

    fn submissions() -> serde_json::Value {
        json!({
            "cik": "1234",
            "name": "Test Corp",
            "filings": {
                "recent": {
                    "accessionNumber": [
                        "0000001234-21-000050",
                        "0000001234-21-000010",
                        "0000001234-21-000005",
                        "0000001234-20-000010",
                        "0000001234-19-000010",
                        "0000001234-19-000009"
                    ],
                    "filingDate": ["2021-09-01", "2021-03-01", "2021-02-01", "2020-03-01", "2019-03-01", "2019-02-20"],
                    "reportDate": ["2020-12-31", "2020-12-31", "2020-12-31", "2019-12-31", "2018-12-31", "2018-12-31"],
                    "form": ["10-K/A", "10-K", "8-K", "10-K", "10-K", "10-K"],
                    "primaryDocument": ["a.htm", "b.htm", "c.htm", "d.htm", "e.htm", "f.htm"]
                },
                "files": []
            }
        })
    }

    async fn mount_submissions(server: &MockServer) {
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000001234.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(submissions()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_locate_filters_dedups_and_orders() {
        let server = MockServer::start().await;
        mount_submissions(&server).await;

        let filings = locator(&server)
            .locate(&Ticker::parse("TEST").unwrap(), 10)
            .await
            .unwrap();

        let accessions: Vec<_> = filings.iter().map(|f| f.accession_number.as_str()).collect();
        // 8-K dropped, the two FY2018 10-Ks collapse to the later one,
        // amendment kept alongside the original.
        assert_eq!(
            accessions,
            vec![
                "0000001234-21-000050",
                "0000001234-21-000010",
                "0000001234-20-000010",
                "0000001234-19-000010"
            ]
        );
        assert_eq!(filings[0].filing_type, FilingType::Form10KA);
        assert_eq!(filings[0].fiscal_year, 2020);
        assert!(filings[1]
            .document_url
            .ends_with("/Archives/edgar/data/1234/000000123421000010/b.htm"));
    }

    #[tokio::test]
    async fn test_locate_applies_window() {
        let server = MockServer::start().await;
        mount_submissions(&server).await;

        let filings = locator(&server)
            .locate(&Ticker::parse("TEST").unwrap(), 2)
            .await
            .unwrap();

        let years: BTreeSet<_> = filings.iter().map(|f| f.fiscal_year).collect();
        assert_eq!(years, BTreeSet::from([2019, 2020]));
    }

    #[tokio::test]
    async fn test_window_counts_years_without_filings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000001234.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "filings": {
                    "recent": {
                        "accessionNumber": ["0000001234-21-000010", "0000001234-19-000010"],
                        "filingDate": ["2021-03-01", "2019-03-01"],
                        "reportDate": ["2020-12-31", "2018-12-31"],
                        "form": ["10-K", "10-K"],
                        "primaryDocument": ["b.htm", "e.htm"]
                    }
                }
            })))
            .mount(&server)
            .await;
        let locator = locator(&server);
        let ticker = Ticker::parse("TEST").unwrap();

        // FY2019 was never filed; a two year window is 2019..=2020
        let filings = locator.locate(&ticker, 2).await.unwrap();
        let years: Vec<_> = filings.iter().map(|f| f.fiscal_year).collect();
        assert_eq!(years, vec![2020]);

        let filings = locator.locate(&ticker, 3).await.unwrap();
        let years: Vec<_> = filings.iter().map(|f| f.fiscal_year).collect();
        assert_eq!(years, vec![2020, 2018]);
    }

    #[tokio::test]
    async fn test_locate_follows_history_pages() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000001234.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "filings": {
                    "recent": {
                        "accessionNumber": ["0000001234-21-000010"],
                        "filingDate": ["2021-03-01"],
                        "reportDate": ["2020-12-31"],
                        "form": ["10-K"],
                        "primaryDocument": ["b.htm"]
                    },
                    "files": [{"name": "CIK0000001234-submissions-001.json"}]
                }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000001234-submissions-001.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "accessionNumber": ["0000001234-12-000010"],
                "filingDate": ["2012-03-01"],
                "reportDate": [""],
                "form": ["10-K"],
                "primaryDocument": [""]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let filings = locator(&server)
            .locate(&Ticker::parse("TEST").unwrap(), 10)
            .await
            .unwrap();

        assert_eq!(filings.len(), 2);
        let old = &filings[1];
        assert_eq!(old.fiscal_year, 2011);
        assert!(old.document_url.ends_with("/0000001234-12-000010.txt"));
    }

    #[tokio::test]
    async fn test_unknown_ticker_makes_no_request() {
        let server = MockServer::start().await;

        let err = locator(&server)
            .locate(&Ticker::parse("NOPE").unwrap(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::UnknownTicker { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_loaded_registry_resolves_offline() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/company_tickers.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "0": {"cik_str": 1234, "ticker": "TEST", "title": "Test Corp"}
            })))
            .expect(1)
            .mount(&server)
            .await;
        let config = config(&server);
        let locator = EdgarLocator::load(EdgarClient::new(&config).unwrap(), &config)
            .await
            .unwrap();
        server.verify().await;
        server.reset().await;

        let err = locator
            .locate(&Ticker::parse("NOPE").unwrap(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::UnknownTicker { .. }));
        assert!(server.received_requests().await.unwrap().is_empty());
        assert_eq!(
            locator.resolve(&Ticker::parse("TEST").unwrap()).await.unwrap(),
            FilerId::new(1234)
        );
    }

    #[tokio::test]
    async fn test_registry_load_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        let config = config(&server);

        let err = EdgarLocator::load(EdgarClient::new(&config).unwrap(), &config)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::RegistryUnavailable(_)));
    }

    #[tokio::test]
    async fn test_missing_index_is_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = locator(&server)
            .locate(&Ticker::parse("TEST").unwrap(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::IndexUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_no_annual_filings() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/submissions/CIK0000001234.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "filings": {
                    "recent": {
                        "accessionNumber": ["0000001234-21-000010"],
                        "filingDate": ["2021-03-01"],
                        "reportDate": ["2020-12-31"],
                        "form": ["10-Q"],
                        "primaryDocument": ["q.htm"]
                    }
                }
            })))
            .mount(&server)
            .await;

        let err = locator(&server)
            .locate(&Ticker::parse("TEST").unwrap(), 5)
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::NoFilings { .. }));
    }

    #[tokio::test]
    async fn test_registry_loaded_from_file_once() {
        let dir = std::env::temp_dir().join(format!("fundamentals-registry-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let file = dir.join("company_tickers.json");
        tokio::fs::write(&file, r#"{"0": {"cik_str": 42, "ticker": "ABC", "title": "Abc"}}"#)
            .await
            .unwrap();

        let config = PipelineConfig::new().with_ticker_registry_path(&file);
        let client = EdgarClient::new(&config).unwrap();
        let locator = EdgarLocator::new(client, &config);

        let ticker = Ticker::parse("ABC").unwrap();
        assert_eq!(locator.resolve(&ticker).await.unwrap(), FilerId::new(42));
        tokio::fs::remove_file(&file).await.unwrap();
        // Second lookup is served from the loaded registry.
        assert_eq!(locator.resolve(&ticker).await.unwrap(), FilerId::new(42));
    }

    #[test]
    fn test_fallback_fiscal_year() {
        let feb = NaiveDate::from_ymd_opt(2021, 2, 15).unwrap();
        let nov = NaiveDate::from_ymd_opt(2021, 11, 1).unwrap();
        assert_eq!(fallback_fiscal_year(feb), 2020);
        assert_eq!(fallback_fiscal_year(nov), 2021);
    }
}
