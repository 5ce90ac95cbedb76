//! Rate-limited HTTP transport with retry and failure classification.

use fundamentals_core::{FetchError, PipelineConfig, PipelineError};
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, instrument, warn};

/// Upper bound on a server-requested `Retry-After` delay.
const MAX_RETRY_AFTER: Duration = Duration::from_secs(60);

/// Rate limiter to ensure we don't exceed SEC's rate limits
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        let now = Instant::now();
        Self {
            last_request: now.checked_sub(min_interval).unwrap_or(now),
            min_interval,
        }
    }

    async fn wait(&mut self) {
        let elapsed = self.last_request.elapsed();
        if elapsed < self.min_interval {
            sleep(self.min_interval - elapsed).await;
        }
        self.last_request = Instant::now();
    }
}

/// Retry budget for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts including the first.
    pub max_attempts: u32,
    /// Delay before the first retry, doubled on each further retry.
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Backoff before retry number `attempt` (1-based).
    #[must_use]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(16);
        self.base_delay.saturating_mul(1 << exponent)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

/// Outcome of a single attempt that did not produce a body.
#[derive(Debug)]
enum AttemptError {
    /// Worth retrying, optionally no sooner than the server asked.
    Retry {
        reason: String,
        retry_after: Option<Duration>,
    },
    /// Retrying cannot help.
    Fatal(FetchError),
}

/// EDGAR HTTP client.
///
/// Every request made through one client (or its clones) passes the same rate
/// limiter, however many requests run concurrently. Transient failures are
/// retried with exponential backoff; 404/410 and other client errors are
/// returned immediately.
#[derive(Debug, Clone)]
pub struct EdgarClient {
    client: reqwest::Client,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    retry: RetryPolicy,
}

impl EdgarClient {
    /// Create a client from the pipeline configuration.
    ///
    /// The SEC requires identifying user agent headers. Format should be:
    /// "AppName/Version (contact@email.com)"
    ///
    /// # Errors
    /// Returns [`PipelineError::Config`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: &PipelineConfig) -> Result<Self, PipelineError> {
        config.validate()?;
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| PipelineError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self::with_client(client, config))
    }

    /// Create a client around a pre-configured reqwest client.
    #[must_use]
    pub fn with_client(client: reqwest::Client, config: &PipelineConfig) -> Self {
        Self {
            client,
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(config.min_request_interval))),
            retry: RetryPolicy {
                max_attempts: config.max_attempts.max(1),
                base_delay: config.base_retry_delay,
            },
        }
    }

    /// Returns the retry policy.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// Fetches `url` as text.
    ///
    /// # Errors
    /// - [`FetchError::NotFound`] on 404/410, without retrying
    /// - [`FetchError::Permanent`] on a malformed URL or any other 4xx
    /// - [`FetchError::Transient`] once the retry budget is spent
    #[instrument(skip(self))]
    pub async fn get_text(&self, url: &str) -> Result<String, FetchError> {
        if let Err(e) = reqwest::Url::parse(url) {
            return Err(FetchError::Permanent {
                url: url.to_string(),
                reason: format!("Invalid URL: {e}"),
            });
        }

        let mut attempt = 0;
        loop {
            attempt += 1;
            self.rate_limiter.lock().await.wait().await;

            match self.attempt(url).await {
                Ok(body) => {
                    debug!(attempt, bytes = body.len(), "Request succeeded");
                    return Ok(body);
                }
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retry {
                    reason,
                    retry_after,
                }) => {
                    if attempt >= self.retry.max_attempts {
                        warn!(attempt, %reason, "Retry budget exhausted");
                        return Err(FetchError::Transient {
                            url: url.to_string(),
                            attempts: attempt,
                            reason,
                        });
                    }

                    let backoff = self.retry.delay_for(attempt);
                    let delay = retry_after.map_or(backoff, |ra| ra.min(MAX_RETRY_AFTER).max(backoff));
                    warn!(attempt, %reason, ?delay, "Transient failure, retrying");
                    sleep(delay).await;
                }
            }
        }
    }

    /// Fetches `url` and decodes it as JSON.
    ///
    /// # Errors
    /// As [`get_text`](Self::get_text); an undecodable body is
    /// [`FetchError::Permanent`].
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        let body = self.get_text(url).await?;
        serde_json::from_str(&body).map_err(|e| FetchError::Permanent {
            url: url.to_string(),
            reason: format!("Failed to parse JSON: {e}"),
        })
    }

    async fn attempt(&self, url: &str) -> Result<String, AttemptError> {
        let response = match self.client.get(url).send().await {
            Ok(response) => response,
            Err(e) if e.is_builder() => {
                return Err(AttemptError::Fatal(FetchError::Permanent {
                    url: url.to_string(),
                    reason: e.to_string(),
                }));
            }
            Err(e) => {
                return Err(AttemptError::Retry {
                    reason: e.to_string(),
                    retry_after: None,
                });
            }
        };

        let status = response.status();
        if status.is_success() {
            return response.text().await.map_err(|e| AttemptError::Retry {
                reason: format!("Failed to read body: {e}"),
                retry_after: None,
            });
        }

        match status {
            StatusCode::NOT_FOUND | StatusCode::GONE => {
                Err(AttemptError::Fatal(FetchError::NotFound {
                    url: url.to_string(),
                }))
            }
            StatusCode::REQUEST_TIMEOUT | StatusCode::TOO_MANY_REQUESTS => Err(AttemptError::Retry {
                reason: format!("HTTP {status}"),
                retry_after: retry_after(&response),
            }),
            s if s.is_server_error() => Err(AttemptError::Retry {
                reason: format!("HTTP {status}"),
                retry_after: retry_after(&response),
            }),
            _ => Err(AttemptError::Fatal(FetchError::Permanent {
                url: url.to_string(),
                reason: format!("HTTP {status}"),
            })),
        }
    }
}

/// Parses a `Retry-After` header given in seconds.
fn retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client() -> EdgarClient {
        let config = PipelineConfig::new()
            .with_user_agent("Test/1.0 (test@example.com)")
            .with_min_request_interval(Duration::from_millis(1))
            .with_retry(3, Duration::from_millis(5));
        EdgarClient::new(&config).unwrap()
    }

    #[test]
    fn test_backoff_doubles() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay_for(1), Duration::from_millis(500));
        assert_eq!(policy.delay_for(2), Duration::from_millis(1000));
        assert_eq!(policy.delay_for(3), Duration::from_millis(2000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rate_limiter_spacing() {
        let mut limiter = RateLimiter::new(Duration::from_millis(100));
        let start = Instant::now();

        limiter.wait().await;
        limiter.wait().await;
        limiter.wait().await;

        assert!(start.elapsed() >= Duration::from_millis(200));
    }

    #[tokio::test]
    async fn test_transient_then_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.htm"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/doc.htm"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>ok</html>"))
            .mount(&server)
            .await;

        let body = test_client()
            .get_text(&format!("{}/doc.htm", server.uri()))
            .await
            .unwrap();

        assert_eq!(body, "<html>ok</html>");
        assert_eq!(server.received_requests().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_not_found_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/missing.htm"))
            .respond_with(ResponseTemplate::new(404))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client()
            .get_text(&format!("{}/missing.htm", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_retry_budget_exhausted() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/flaky.htm"))
            .respond_with(ResponseTemplate::new(500))
            .expect(3)
            .mount(&server)
            .await;

        let err = test_client()
            .get_text(&format!("{}/flaky.htm", server.uri()))
            .await
            .unwrap_err();

        match err {
            FetchError::Transient { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected transient failure, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_client_error_is_permanent() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/forbidden.htm"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client()
            .get_text(&format!("{}/forbidden.htm", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Permanent { .. }));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    async fn test_invalid_url_is_permanent() {
        let err = test_client().get_text("not a url").await.unwrap_err();
        assert!(matches!(err, FetchError::Permanent { .. }));
    }

    #[tokio::test]
    async fn test_get_json_decode_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/data.json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{not json"))
            .mount(&server)
            .await;

        let err = test_client()
            .get_json::<serde_json::Value>(&format!("{}/data.json", server.uri()))
            .await
            .unwrap_err();

        assert!(matches!(err, FetchError::Permanent { .. }));
    }
}
