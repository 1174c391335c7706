//! HTTP transport
//!
//! This module handles all HTTP requests for the harvester, including:
//! - Building the HTTP client with browser-like headers
//! - GET requests returning the page body, decoded per its declared or detected charset
//! - Retry with exponential backoff and jitter for transient failures
//! - Error classification
//!
//! # Retry Logic
//!
//! | Condition | Action |
//! |-----------|--------|
//! | HTTP 429, 500, 502, 503, 504 | Retry with backoff |
//! | Timeout | Retry with backoff |
//! | Any other HTTP status | Fail immediately |
//! | Connection refused / DNS | Fail immediately |

use crate::config::TransportConfig;
use crate::crawler::charset::decode_body;
use crate::{TransportError, TransportResult};
use rand::Rng;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{debug, error, warn};

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

/// Backoff schedule for transient failures
///
/// The delay before attempt `k + 1` is `min(base * 2^(k-1), max)` plus a
/// random jitter of up to `max_jitter_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub max_jitter_ms: u64,
}

impl RetryPolicy {
    pub fn from_config(config: &TransportConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_backoff_ms),
            max_delay: Duration::from_millis(config.max_backoff_ms),
            max_jitter_ms: 250,
        }
    }

    /// Delay after the `failed_attempts`-th failure, without jitter
    pub fn delay_for(&self, failed_attempts: u32) -> Duration {
        let exponent = failed_attempts.saturating_sub(1).min(16);
        let delay = self.base_delay.saturating_mul(1u32 << exponent);
        delay.min(self.max_delay)
    }

    fn jittered_delay_for(&self, failed_attempts: u32) -> Duration {
        let jitter_ms = if self.max_jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..=self.max_jitter_ms)
        };
        self.delay_for(failed_attempts) + Duration::from_millis(jitter_ms)
    }
}

/// Retrying HTTP GET client shared by list and detail fetches
///
/// Cloning is cheap: the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct Transport {
    client: Client,
    policy: RetryPolicy,
}

impl Transport {
    /// Builds a transport from configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use bulletin_harvest::config::TransportConfig;
    /// use bulletin_harvest::crawler::Transport;
    ///
    /// let transport = Transport::new(&TransportConfig::default()).unwrap();
    /// ```
    pub fn new(config: &TransportConfig) -> TransportResult<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));
        let language = HeaderValue::from_str(&config.accept_language)
            .map_err(|e| TransportError::Client(format!("Invalid Accept-Language: {}", e)))?;
        headers.insert(ACCEPT_LANGUAGE, language);

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .gzip(true)
            .brotli(true)
            .build()
            .map_err(|e| TransportError::Client(e.to_string()))?;

        Ok(Self {
            client,
            policy: RetryPolicy::from_config(config),
        })
    }

    /// Replaces the backoff schedule
    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Fetches `url` and returns the decoded body
    ///
    /// Transient failures are retried until `max_attempts` is reached; the
    /// last error is returned after that.
    pub async fn fetch(&self, url: &str) -> TransportResult<String> {
        let total_t0 = Instant::now();
        let mut attempt = 0u32;

        loop {
            attempt += 1;
            match self.fetch_once(url).await {
                Ok(body) => {
                    debug!(url, attempt, bytes = body.len(), "Fetched");
                    return Ok(body);
                }
                Err(e) if !e.is_transient() => {
                    warn!(url, attempt, error = %e, "Fetch failed, not retrying");
                    return Err(e);
                }
                Err(e) => {
                    if attempt >= self.policy.max_attempts {
                        error!(
                            url,
                            attempt,
                            elapsed_ms_total = total_t0.elapsed().as_millis() as u64,
                            error = %e,
                            "Fetch exhausted retries"
                        );
                        return Err(e);
                    }

                    let delay = self.policy.jittered_delay_for(attempt);
                    warn!(
                        url,
                        attempt,
                        max = self.policy.max_attempts,
                        ?delay,
                        error = %e,
                        "Fetch attempt failed; backing off"
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    async fn fetch_once(&self, url: &str) -> TransportResult<String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response.bytes().await.map_err(|e| classify_error(url, e))?;

        Ok(decode_body(&bytes, content_type.as_deref()))
    }
}

fn classify_error(url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
