//! Pipeline configuration.
//!
//! [`PipelineConfig`] is a plain value: build it with [`Default`] plus the
//! `with_*` methods, or deserialize it from JSON where durations are given in
//! milliseconds. Every field has a default so partial documents are accepted.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{PipelineError, Result};
use crate::types::DocumentSource;

/// Upper bound on concurrent document fetches.
pub const MAX_CONCURRENT_FETCHES: usize = 8;

/// Which period columns of a statement are extracted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodScope {
    /// Only the column of the filing's own fiscal year. Years no filing covers
    /// stay missing instead of being filled from comparative columns.
    #[default]
    CurrentPeriod,
    /// Every period column, including prior-year comparatives. The latest filed
    /// value still wins, so restated comparatives replace original figures.
    AllPeriods,
}

/// Configuration for a pipeline run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// `User-Agent` sent with every request. EDGAR requires a contact address.
    pub user_agent: String,
    /// Base URL for submissions JSON (`{base}/submissions/CIK##########.json`).
    pub edgar_data_url: String,
    /// Base URL for filing archives (`{base}/{cik}/{accession}/...`).
    pub archives_url: String,
    /// URL of the ticker to CIK registry.
    pub tickers_url: String,
    /// Local copy of the ticker registry. When set, the registry is read from
    /// disk and never fetched.
    pub ticker_registry_path: Option<PathBuf>,
    /// Minimum interval between two requests to the same host.
    #[serde(with = "duration_ms")]
    pub min_request_interval: Duration,
    /// Per-request timeout.
    #[serde(with = "duration_ms")]
    pub request_timeout: Duration,
    /// Attempts per request, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled on each further retry.
    #[serde(with = "duration_ms")]
    pub base_retry_delay: Duration,
    /// Maximum documents fetched concurrently (1-8).
    pub max_concurrent_fetches: usize,
    /// Lookback window used when the caller passes no year count.
    pub default_years_back: u32,
    /// What fetched documents are assembled from.
    pub document_source: DocumentSource,
    /// Which period columns are extracted.
    pub period_scope: PeriodScope,
    /// Minimum similarity for a fuzzy label match (0-1).
    pub fuzzy_threshold: f64,
    /// Keep fetched documents in memory for later runs.
    pub cache_documents: bool,
    /// Maximum age of a cached document. `None` keeps documents forever.
    #[serde(with = "option_duration_ms")]
    pub cache_ttl: Option<Duration>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            user_agent: "fundamentals/0.1 (contact@example.com)".to_string(),
            edgar_data_url: "https://data.sec.gov".to_string(),
            archives_url: "https://www.sec.gov/Archives/edgar/data".to_string(),
            tickers_url: "https://www.sec.gov/files/company_tickers.json".to_string(),
            ticker_registry_path: None,
            // SEC fair access allows 10 requests per second
            min_request_interval: Duration::from_millis(100),
            request_timeout: Duration::from_secs(30),
            max_attempts: 3,
            base_retry_delay: Duration::from_millis(500),
            max_concurrent_fetches: 4,
            default_years_back: 10,
            document_source: DocumentSource::default(),
            period_scope: PeriodScope::default(),
            fuzzy_threshold: 0.8,
            cache_documents: true,
            cache_ttl: None,
        }
    }
}

impl PipelineConfig {
    /// Creates the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] if the JSON is malformed or the
    /// resulting configuration fails [`validate`](Self::validate).
    ///
    /// # Example
    /// ```
    /// use fundamentals_core::PipelineConfig;
    ///
    /// let config = PipelineConfig::from_json_str(r#"{"max_concurrent_fetches": 2}"#).unwrap();
    /// assert_eq!(config.max_concurrent_fetches, 2);
    /// assert_eq!(config.max_attempts, 3);
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| PipelineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the `User-Agent`.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Points every EDGAR endpoint at one base URL (used against mock servers).
    #[must_use]
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        let base = base_url.trim_end_matches('/');
        self.edgar_data_url = base.to_string();
        self.archives_url = format!("{base}/Archives/edgar/data");
        self.tickers_url = format!("{base}/files/company_tickers.json");
        self
    }

    /// Reads the ticker registry from a local file.
    #[must_use]
    pub fn with_ticker_registry_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ticker_registry_path = Some(path.into());
        self
    }

    /// Sets the minimum interval between requests.
    #[must_use]
    pub const fn with_min_request_interval(mut self, interval: Duration) -> Self {
        self.min_request_interval = interval;
        self
    }

    /// Sets the retry policy.
    #[must_use]
    pub const fn with_retry(mut self, max_attempts: u32, base_delay: Duration) -> Self {
        self.max_attempts = max_attempts;
        self.base_retry_delay = base_delay;
        self
    }

    /// Sets the fetch concurrency, clamped to 1-8.
    #[must_use]
    pub fn with_max_concurrent_fetches(mut self, n: usize) -> Self {
        self.max_concurrent_fetches = n.clamp(1, MAX_CONCURRENT_FETCHES);
        self
    }

    /// Sets the document source.
    #[must_use]
    pub const fn with_document_source(mut self, source: DocumentSource) -> Self {
        self.document_source = source;
        self
    }

    /// Sets the period scope.
    #[must_use]
    pub const fn with_period_scope(mut self, scope: PeriodScope) -> Self {
        self.period_scope = scope;
        self
    }

    /// Enables or disables the document cache.
    #[must_use]
    pub const fn with_document_cache(mut self, enabled: bool) -> Self {
        self.cache_documents = enabled;
        self
    }

    /// Sets the cache TTL.
    #[must_use]
    pub const fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = Some(ttl);
        self
    }

    /// Checks the configuration for values the pipeline cannot run with.
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] describing the first invalid field.
    pub fn validate(&self) -> Result<()> {
        if self.user_agent.trim().is_empty() {
            return Err(PipelineError::Config("user_agent must not be empty".into()));
        }
        if self.max_attempts == 0 {
            return Err(PipelineError::Config("max_attempts must be at least 1".into()));
        }
        if !(1..=MAX_CONCURRENT_FETCHES).contains(&self.max_concurrent_fetches) {
            return Err(PipelineError::Config(format!(
                "max_concurrent_fetches must be between 1 and {MAX_CONCURRENT_FETCHES}"
            )));
        }
        if self.default_years_back == 0 {
            return Err(PipelineError::Config("default_years_back must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.fuzzy_threshold) {
            return Err(PipelineError::Config("fuzzy_threshold must be within 0..=1".into()));
        }
        Ok(())
    }
}

mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}

mod option_duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub(super) fn serialize<S: Serializer>(d: &Option<Duration>, s: S) -> Result<S::Ok, S::Error> {
        match d {
            Some(d) => s.serialize_some(&u64::try_from(d.as_millis()).unwrap_or(u64::MAX)),
            None => s.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        d: D,
    ) -> Result<Option<Duration>, D::Error> {
        Option::<u64>::deserialize(d).map(|ms| ms.map(Duration::from_millis))
    }
}
