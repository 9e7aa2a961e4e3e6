//! Parameterized HTTP GET with a request timeout and bounded retry.
//!
//! [`HttpFetcher::get`] issues exactly one request. [`HttpFetcher::get_with_retry`]
//! repeats it per [`RetryPolicy`]: `max_retries + 1` attempts, sleeping
//! `base_delay * attempt²` after the zero-based `attempt` fails (0, 1, 4, 9, ... units).
//! Transport errors and every non-2xx status are retried; the last failure comes
//! back wrapped in [`FetchError::Exhausted`].

use std::time::Duration;

use reqwest::Client;
use snafu::{Backtrace, ResultExt, Snafu};

/// Longest response body kept in a [`FetchError::Status`].
const MAX_ERROR_BODY: usize = 256;

/// Errors from the HTTP layer.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FetchError {
    /// failed to init reqwest client
    #[snafu(display("Failed to build HTTP client: {source}"))]
    ClientBuild {
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// Connection, timeout or body read failure.
    #[snafu(display("GET {url} failed: {source}"))]
    Transport {
        url: String,
        source: reqwest::Error,
        backtrace: Backtrace,
    },

    /// The server answered with a non-2xx status.
    #[snafu(display("GET {url} returned HTTP {status}: {body}"))]
    Status {
        url: String,
        status: u16,
        body: String,
        backtrace: Backtrace,
    },

    /// Every attempt allowed by the retry policy failed.
    #[snafu(display("GET {url} failed after {attempts} attempts: {source}"))]
    Exhausted {
        url: String,
        attempts: u32,
        #[snafu(source(from(FetchError, Box::new)))]
        source: Box<FetchError>,
        backtrace: Backtrace,
    },
}

impl FetchError {
    /// HTTP status of the (last) failed response, if the server answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            FetchError::Status { status, .. } => Some(*status),
            FetchError::Exhausted { source, .. } => source.status(),
            _ => None,
        }
    }
}

/// Bounded retry with quadratic backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Single attempt, no sleeping.
    pub const NONE: RetryPolicy = RetryPolicy {
        max_retries: 0,
        base_delay: Duration::ZERO,
    };

    pub const fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Total number of requests, first try included.
    pub fn attempts(&self) -> u32 {
        self.max_retries.saturating_add(1)
    }

    /// Pause after the zero-based `attempt` fails.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay.saturating_mul(attempt.saturating_mul(attempt))
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1))
    }
}

/// Thin GET client shared by the gm-api and gm-csv clients.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    retry: RetryPolicy,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, retry: RetryPolicy) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self { client, retry })
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        self.retry
    }

    /// One GET; returns the body of a 2xx response.
    pub async fn get(&self, url: &str, params: &[(&str, String)]) -> Result<Vec<u8>, FetchError> {
        tracing::debug!(url, ?params, "GET");
        let response = self
            .client
            .get(url)
            .query(params)
            .send()
            .await
            .context(TransportSnafu { url })?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY {
                let cut = (0..=MAX_ERROR_BODY)
                    .rev()
                    .find(|i| body.is_char_boundary(*i))
                    .unwrap_or(0);
                body.truncate(cut);
            }
            return StatusSnafu {
                url,
                status: status.as_u16(),
                body,
            }
            .fail();
        }

        let bytes = response.bytes().await.context(TransportSnafu { url })?;
        Ok(bytes.to_vec())
    }

    /// [`get`](Self::get) under the fetcher's [`RetryPolicy`].
    pub async fn get_with_retry(
        &self,
        url: &str,
        params: &[(&str, String)],
    ) -> Result<Vec<u8>, FetchError> {
        let attempts = self.retry.attempts();
        let mut attempt = 0;
        loop {
            let err = match self.get(url, params).await {
                Ok(body) => return Ok(body),
                Err(err) => err,
            };
            if attempt + 1 >= attempts {
                return Err(err).context(ExhaustedSnafu { url, attempts });
            }
            let delay = self.retry.delay_after(attempt);
            tracing::warn!(
                url,
                attempt = attempt + 1,
                attempts,
                ?delay,
                error = %err,
                "request failed, retrying"
            );
            tokio::time::sleep(delay).await;
            attempt += 1;
        }
    }
}

/// Add a scheme to a bare `host[:port][/path]` base URL.
///
/// URLs that already carry a scheme are kept as given (minus trailing `/`).
/// Ports 443/8443 mean https; the usual plain-HTTP dev ports
/// (80, 8080, 3000, 5000, 8000) mean http unless `prefer_https`; anything else
/// follows `prefer_https`.
pub fn normalize_base_url(raw: &str, prefer_https: bool) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    if trimmed.contains("://") {
        return trimmed.to_string();
    }
    let authority = trimmed.split('/').next().unwrap_or(trimmed);
    let port = authority
        .rsplit_once(':')
        .and_then(|(_, p)| p.parse::<u16>().ok());
    let scheme = match port {
        Some(443 | 8443) => "https",
        Some(80 | 8080 | 3000 | 5000 | 8000) if !prefer_https => "http",
        _ if prefer_https => "https",
        _ => "http",
    };
    format!("{scheme}://{trimmed}")
}
