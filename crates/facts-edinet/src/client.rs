//! EDINET API v2 client.
//!
//! [`EdinetClient`] lists the documents submitted on a day and downloads the
//! zip archive of one filing. Requests are spaced by a minimum interval and
//! retried with exponential backoff on rate limiting, server errors and
//! connection failures.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDate;
use facts_core::{FactError, FilingSource, FilingSummary, Result, is_valid_doc_id};
use reqwest::{Client, Response, StatusCode, header};
use serde::Deserialize;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::{debug, warn};

/// EDINET API v2 base URL.
const EDINET_BASE_URL: &str = "https://disclosure.edinet-fsa.go.jp/api/v2";

/// Header carrying the subscription key.
const SUBSCRIPTION_KEY_HEADER: &str = "Ocp-Apim-Subscription-Key";

/// Environment variable holding the subscription key.
pub const API_KEY_ENV: &str = "EDINET_API_KEY";

/// Value shipped in sample `.env` files.
const PLACEHOLDER_API_KEY: &str = "YOUR_API_KEY";

/// Default spacing between requests.
const DEFAULT_REQUEST_INTERVAL: Duration = Duration::from_millis(200);

/// Default number of retries after the first attempt.
const DEFAULT_MAX_RETRIES: u32 = 3;

/// Default delay before the first retry; doubles on each further retry.
const DEFAULT_BACKOFF: Duration = Duration::from_secs(1);

const LIST_TIMEOUT: Duration = Duration::from_secs(30);
const ARCHIVE_TIMEOUT: Duration = Duration::from_secs(60);

/// Rate limiter spacing requests to EDINET.
#[derive(Debug)]
struct RateLimiter {
    last_request: Instant,
    min_interval: Duration,
}

impl RateLimiter {
    fn new(min_interval: Duration) -> Self {
        Self {
            last_request: Instant::now() - min_interval,
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

/// Checks a subscription key read from configuration.
///
/// Empty keys and the sample placeholder are refused.
pub fn validate_api_key(key: &str) -> Result<String> {
    let key = key.trim();
    if key.is_empty() || key == PLACEHOLDER_API_KEY {
        return Err(FactError::InvalidParameter(format!(
            "{API_KEY_ENV} is not set to a subscription key"
        )));
    }
    Ok(key.to_string())
}

/// Returns true if a response with this status is worth retrying.
#[must_use]
pub fn is_retryable(status: StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 504)
}

/// Delay before retry number `attempt` (zero based).
#[must_use]
pub fn backoff_delay(base: Duration, attempt: u32) -> Duration {
    base.saturating_mul(2u32.saturating_pow(attempt))
}

/// EDINET document list response.
#[derive(Debug, Deserialize)]
struct DocumentListResponse {
    #[serde(default)]
    metadata: Option<ResponseMetadata>,
    #[serde(default)]
    results: Option<Vec<FilingSummary>>,
    /// Present on gateway errors such as an invalid key.
    #[serde(default, rename = "StatusCode")]
    status_code: Option<u16>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Parses a document list body into its entries.
///
/// A body whose metadata status is not `200` is an error even when the HTTP
/// status was.
pub fn parse_document_list(body: &str) -> Result<Vec<FilingSummary>> {
    let response: DocumentListResponse = serde_json::from_str(body)
        .map_err(|e| FactError::Parse(format!("document list: {e}")))?;

    if let Some(code) = response.status_code {
        return Err(FactError::Network(format!(
            "EDINET status {code}: {}",
            response.message.unwrap_or_default()
        )));
    }
    if let Some(metadata) = response.metadata
        && let Some(status) = metadata.status
        && status != "200"
    {
        return Err(FactError::Network(format!(
            "EDINET status {status}: {}",
            metadata.message.unwrap_or_default()
        )));
    }
    Ok(response.results.unwrap_or_default())
}

/// Client for the EDINET API v2.
///
/// Clones share one rate limiter.
#[derive(Clone)]
pub struct EdinetClient {
    client: Client,
    api_key: String,
    base_url: String,
    rate_limiter: Arc<Mutex<RateLimiter>>,
    max_retries: u32,
    backoff: Duration,
}

impl fmt::Debug for EdinetClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EdinetClient")
            .field("api_key", &"[REDACTED]")
            .field("base_url", &self.base_url)
            .field("max_retries", &self.max_retries)
            .field("backoff", &self.backoff)
            .finish()
    }
}

impl EdinetClient {
    /// Creates a client with the given subscription key.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_client(Client::new(), api_key)
    }

    /// Creates a client with a custom HTTP client.
    #[must_use]
    pub fn with_client(client: Client, api_key: impl Into<String>) -> Self {
        Self {
            client,
            api_key: api_key.into(),
            base_url: EDINET_BASE_URL.to_string(),
            rate_limiter: Arc::new(Mutex::new(RateLimiter::new(DEFAULT_REQUEST_INTERVAL))),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff: DEFAULT_BACKOFF,
        }
    }

    /// Creates a client from `EDINET_API_KEY`.
    pub fn from_env() -> Result<Self> {
        let key = std::env::var(API_KEY_ENV).unwrap_or_default();
        Ok(Self::new(validate_api_key(&key)?))
    }

    /// Points the client at another API root.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the minimum spacing between requests.
    #[must_use]
    pub fn with_request_interval(mut self, interval: Duration) -> Self {
        self.rate_limiter = Arc::new(Mutex::new(RateLimiter::new(interval)));
        self
    }

    /// Sets the retry count and the delay before the first retry.
    #[must_use]
    pub fn with_retry(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.backoff = backoff;
        self
    }

    /// URL of the document list for one day.
    fn documents_url(&self, date: NaiveDate) -> String {
        format!(
            "{}/documents.json?date={}&type=2",
            self.base_url,
            date.format("%Y-%m-%d")
        )
    }

    /// URL of a filing's zip archive.
    fn archive_url(&self, doc_id: &str) -> String {
        format!("{}/documents/{doc_id}?type=1", self.base_url)
    }

    /// Sends a GET request, retrying retryable failures.
    async fn get(&self, url: &str, timeout: Duration) -> Result<Response> {
        let mut attempt = 0;
        loop {
            self.rate_limiter.lock().await.wait().await;
            let result = self
                .client
                .get(url)
                .header(SUBSCRIPTION_KEY_HEADER, &self.api_key)
                .timeout(timeout)
                .send()
                .await;

            let (reason, retry_after) = match result {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => {
                    let status = response.status();
                    if !is_retryable(status) || attempt >= self.max_retries {
                        return Err(status_error(response).await);
                    }
                    (format!("HTTP {status}"), retry_after(&response))
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(FactError::Network(e.to_string()));
                    }
                    (e.to_string(), None)
                }
            };

            let delay = retry_after.unwrap_or_else(|| backoff_delay(self.backoff, attempt));
            attempt += 1;
            warn!(url, attempt, ?delay, %reason, "Retrying EDINET request");
            sleep(delay).await;
        }
    }
}

fn retry_after(response: &Response) -> Option<Duration> {
    response
        .headers()
        .get(header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

async fn status_error(response: Response) -> FactError {
    let status = response.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return FactError::RateLimited {
            provider: "EDINET".to_string(),
            retry_after: retry_after(&response),
        };
    }
    let text = response.text().await.unwrap_or_default();
    FactError::Network(format!("HTTP {status}: {text}"))
}

#[async_trait]
impl FilingSource for EdinetClient {
    fn name(&self) -> &str {
        "EDINET"
    }

    async fn list_filings(&self, date: NaiveDate) -> Result<Vec<FilingSummary>> {
        let response = self.get(&self.documents_url(date), LIST_TIMEOUT).await?;
        let body = response
            .text()
            .await
            .map_err(|e| FactError::Network(e.to_string()))?;
        let filings = parse_document_list(&body)?;
        debug!(%date, count = filings.len(), "Listed EDINET documents");
        Ok(filings)
    }

    async fn fetch_archive(&self, doc_id: &str) -> Result<Vec<u8>> {
        if !is_valid_doc_id(doc_id) {
            return Err(FactError::InvalidParameter(format!(
                "invalid document id: {doc_id:?}"
            )));
        }

        let response = self.get(&self.archive_url(doc_id), ARCHIVE_TIMEOUT).await?;
        let is_json = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| value.contains("json"));
        if is_json {
            // Errors for unknown documents arrive as JSON with HTTP 200
            let text = response.text().await.unwrap_or_default();
            return Err(FactError::Network(format!(
                "no archive for {doc_id}: {text}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| FactError::Network(e.to_string()))?;
        debug!(doc_id, bytes = bytes.len(), "Downloaded EDINET archive");
        Ok(bytes.to_vec())
    }
}
