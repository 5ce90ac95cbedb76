//! The end-to-end pipeline: locate, fetch, extract, normalize, assemble.

use futures::{StreamExt, stream};
use std::collections::BTreeSet;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use fundamentals_cache::NoopCache;
use fundamentals_core::{
    Diagnostics, DocumentCache, DocumentFetcher, ExtractionError, FetchError, FilerLocator,
    FilingReference, FinancialReport, PipelineConfig, PipelineError, Result, StatementType, Ticker,
    lookback_window,
};
use fundamentals_extract::StatementExtractor;
use fundamentals_normalize::{LabelNormalizer, NormalizedItems};

use crate::assembler::{Assembler, NormalizedFiling};

/// What happened to one filing.
enum FilingOutcome {
    Normalized {
        reference: FilingReference,
        normalized: NormalizedItems,
    },
    FetchFailed {
        reference: FilingReference,
        error: FetchError,
    },
    ExtractionFailed {
        reference: FilingReference,
        error: ExtractionError,
    },
    Aborted,
}

/// Builds multi-year financial tables for a ticker.
///
/// Filings are fetched with bounded concurrency. Extraction and normalization
/// are CPU-only and run on the blocking pool. The assembled table does not
/// depend on the order in which fetches complete.
///
/// # Example
///
/// ```no_run
/// use fundamentals::{CanonicalKey, FinancialPipeline, PipelineConfig};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = PipelineConfig::new().with_user_agent("MyApp/1.0 (contact@example.com)");
///     let pipeline = FinancialPipeline::new(config).await?;
///
///     let report = pipeline.get_financial_table("AAPL", 5).await?;
///     println!("{}", report.table);
///     println!("{:?}", report.table.value(CanonicalKey::Revenue, 2023));
///
///     if let Some(warning) = report.warning() {
///         eprintln!("missing years: {:?}", warning.missing_years);
///     }
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FinancialPipeline {
    locator: Arc<dyn FilerLocator>,
    fetcher: Arc<dyn DocumentFetcher>,
    cache: Arc<dyn DocumentCache>,
    extractor: Arc<StatementExtractor>,
    normalizer: LabelNormalizer,
    config: PipelineConfig,
}

impl FinancialPipeline {
    /// Creates a pipeline against SEC EDGAR.
    ///
    /// The ticker registry is loaded here, so later runs resolve tickers
    /// without a registry download. Fetched documents are kept in memory
    /// unless [`PipelineConfig::cache_documents`] is off.
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] if the configuration is invalid or
    /// the HTTP client cannot be built, and
    /// [`PipelineError::RegistryUnavailable`] if the ticker registry cannot
    /// be loaded.
    #[cfg(feature = "edgar")]
    pub async fn new(config: PipelineConfig) -> Result<Self> {
        use fundamentals_cache::InMemoryCache;
        use fundamentals_edgar::{EdgarClient, EdgarFetcher, EdgarLocator};

        config.validate()?;
        let client = EdgarClient::new(&config)?;
        let cache: Arc<dyn DocumentCache> = match (config.cache_documents, config.cache_ttl) {
            (false, _) => Arc::new(NoopCache::new()),
            (true, Some(ttl)) => Arc::new(InMemoryCache::with_ttl(ttl)),
            (true, None) => Arc::new(InMemoryCache::new()),
        };

        let locator = EdgarLocator::load(client.clone(), &config).await?;
        let fetcher =
            EdgarFetcher::new(client, config.document_source).with_cache(Arc::clone(&cache));
        Ok(Self::with_components(Arc::new(locator), Arc::new(fetcher), config).with_cache(cache))
    }

    /// Creates a pipeline from explicit components. The pipeline manages no
    /// document cache until one is attached with [`with_cache`](Self::with_cache).
    #[must_use]
    pub fn with_components(
        locator: Arc<dyn FilerLocator>,
        fetcher: Arc<dyn DocumentFetcher>,
        config: PipelineConfig,
    ) -> Self {
        let extractor = StatementExtractor::new().with_period_scope(config.period_scope);
        let normalizer = LabelNormalizer::new().with_threshold(config.fuzzy_threshold);
        Self {
            locator,
            fetcher,
            cache: Arc::new(NoopCache::new()),
            extractor: Arc::new(extractor),
            normalizer,
            config,
        }
    }

    /// Attaches the document cache the fetcher reads from, so the pipeline
    /// can expire and clear it.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn DocumentCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Drops every cached document.
    pub async fn clear_cache(&self) {
        self.cache.clear().await;
        debug!("Document cache cleared");
    }

    /// Drops cached documents older than [`PipelineConfig::cache_ttl`].
    /// Without a TTL nothing expires.
    ///
    /// Returns the number of documents dropped.
    pub async fn evict_stale_documents(&self) -> usize {
        let Some(ttl) = self.config.cache_ttl else {
            return 0;
        };
        let evicted = self.cache.invalidate_stale(ttl).await;
        if evicted > 0 {
            debug!(evicted, "Evicted stale documents");
        }
        evicted
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Builds the financial table of `ticker` over the `years_back` fiscal
    /// years ending with its newest annual filing. `0` uses the configured
    /// default. Years inside that range without a filing appear as missing.
    ///
    /// # Errors
    /// - [`PipelineError::InvalidTicker`] before any I/O for malformed input
    /// - [`PipelineError::UnknownTicker`], [`PipelineError::IndexUnavailable`]
    ///   or [`PipelineError::NoFilings`] from the locator
    /// - [`PipelineError::FetchFailure`] if no filing could be fetched
    /// - [`PipelineError::NoUsableData`] if no value could be extracted
    pub async fn get_financial_table(&self, ticker: &str, years_back: u32) -> Result<FinancialReport> {
        self.run_with_cancel(ticker, years_back, CancellationToken::new())
            .await
    }

    /// Like [`get_financial_table`](Self::get_financial_table), but stops as
    /// soon as `cancel` fires. In-flight fetches are dropped and no partial
    /// table is returned.
    ///
    /// # Errors
    /// [`PipelineError::Cancelled`] on cancellation, otherwise as
    /// [`get_financial_table`](Self::get_financial_table).
    pub async fn run_with_cancel(
        &self,
        ticker: &str,
        years_back: u32,
        cancel: CancellationToken,
    ) -> Result<FinancialReport> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                info!(ticker, "Pipeline run cancelled");
                Err(PipelineError::Cancelled)
            }
            result = self.run(ticker, years_back) => result,
        }
    }

    #[instrument(skip(self), fields(locator = self.locator.name(), fetcher = self.fetcher.name()))]
    async fn run(&self, ticker: &str, years_back: u32) -> Result<FinancialReport> {
        let ticker = Ticker::parse(ticker)?;
        let years_back = if years_back == 0 {
            self.config.default_years_back
        } else {
            years_back
        };

        self.evict_stale_documents().await;

        let mut references = self.locator.locate(&ticker, years_back).await?;
        let (Some(filer_id), Some(newest)) = (
            references.first().map(|r| r.filer_id),
            references.iter().map(|r| r.fiscal_year).max(),
        ) else {
            return Err(PipelineError::NoFilings {
                ticker: ticker.as_str().to_string(),
            });
        };
        let window: BTreeSet<i32> = lookback_window(newest, years_back).collect();
        references.retain(|r| window.contains(&r.fiscal_year));
        info!(
            %ticker,
            filings = references.len(),
            years = window.len(),
            "Located filings"
        );

        let outcomes: Vec<FilingOutcome> = stream::iter(references)
            .map(|reference| self.process(reference))
            .buffer_unordered(self.config.max_concurrent_fetches)
            .collect()
            .await;

        let mut diagnostics = Diagnostics::default();
        let mut filings = Vec::new();
        let mut fetch_failures = Vec::new();
        for outcome in outcomes {
            match outcome {
                FilingOutcome::Normalized {
                    reference,
                    normalized,
                } => {
                    diagnostics
                        .unrecognized_labels
                        .extend(normalized.unrecognized_labels);
                    filings.push(NormalizedFiling {
                        reference,
                        items: normalized.items,
                    });
                }
                FilingOutcome::FetchFailed { reference, error } => {
                    diagnostics
                        .fetch_failures
                        .push((reference.accession_number.clone(), error.clone()));
                    fetch_failures.push((reference, error));
                }
                FilingOutcome::ExtractionFailed { reference, error } => {
                    diagnostics
                        .extraction_failures
                        .push((reference.accession_number, error));
                }
                FilingOutcome::Aborted => return Err(PipelineError::Cancelled),
            }
        }

        if filings.is_empty() && diagnostics.extraction_failures.is_empty() {
            // newest filing first, so the reported failure is deterministic
            fetch_failures.sort_by(|(a, _), (b, _)| {
                b.period_end
                    .cmp(&a.period_end)
                    .then_with(|| a.accession_number.cmp(&b.accession_number))
            });
            if let Some((reference, cause)) = fetch_failures.into_iter().next() {
                return Err(PipelineError::FetchFailure {
                    reference: Box::new(reference),
                    cause,
                });
            }
        }

        let (table, conflicts) = Assembler::assemble(&ticker, filer_id, &window, &filings);
        diagnostics.conflicts = conflicts;
        diagnostics.missing_years = table.missing_years();
        diagnostics.sort();

        if table.is_empty() {
            warn!(%ticker, "No usable data extracted");
            return Err(PipelineError::NoUsableData {
                ticker: ticker.as_str().to_string(),
                diagnostics: Box::new(diagnostics),
            });
        }

        info!(
            %ticker,
            rows = table.len(),
            missing_years = diagnostics.missing_years.len(),
            unrecognized = diagnostics.unrecognized_labels.len(),
            "Assembled financial table"
        );
        Ok(FinancialReport { table, diagnostics })
    }

    async fn process(&self, reference: FilingReference) -> FilingOutcome {
        let document = match self.fetcher.fetch(&reference).await {
            Ok(document) => document,
            Err(error) => {
                warn!(accession = %reference.accession_number, %error, "Fetch failed");
                return FilingOutcome::FetchFailed { reference, error };
            }
        };

        let extractor = Arc::clone(&self.extractor);
        let normalizer = self.normalizer;
        let joined = tokio::task::spawn_blocking(move || {
            let raw = extractor.extract(&document, &StatementType::ALL)?;
            Ok::<_, ExtractionError>(normalizer.normalize(&raw))
        })
        .await;

        match joined {
            Ok(Ok(normalized)) => {
                debug!(
                    accession = %reference.accession_number,
                    items = normalized.items.len(),
                    unrecognized = normalized.unrecognized_labels.len(),
                    "Normalized filing"
                );
                FilingOutcome::Normalized {
                    reference,
                    normalized,
                }
            }
            Ok(Err(error)) => {
                warn!(accession = %reference.accession_number, %error, "Extraction failed");
                FilingOutcome::ExtractionFailed { reference, error }
            }
            Err(join_error) if join_error.is_panic() => {
                std::panic::resume_unwind(join_error.into_panic())
            }
            Err(_) => FilingOutcome::Aborted,
        }
    }
}
