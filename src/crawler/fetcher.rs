//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building the shared HTTP client (user agent, timeouts, TLS policy)
//! - GET requests with a hard cap on the body size
//! - Retry with exponential backoff for transient failures
//! - Error classification into `FailureKind`

use crate::config::{CrawlerConfig, UserAgentConfig};
use crate::crawler::backoff::ExponentialBackoff;
use crate::state::FailureKind;
use reqwest::{header, redirect::Policy, Client, StatusCode};
use std::error::Error as _;
use url::Url;

/// Longest delay between two attempts, whatever the base backoff
const MAX_BACKOFF_MS: u64 = 30_000;

/// Redirect hops followed before a request is given up
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum PageResult {
    /// Successfully fetched the page
    Content {
        /// Final URL after redirects
        final_url: Url,
        /// Content-Type header value, if any
        content_type: Option<String>,
        /// Raw body bytes, never longer than the configured cap
        body: Vec<u8>,
    },

    /// The fetch failed; `reason` is for logs only
    Failure { kind: FailureKind, reason: String },
}

impl PageResult {
    fn failure(kind: FailureKind, reason: impl Into<String>) -> Self {
        Self::Failure {
            kind,
            reason: reason.into(),
        }
    }

    /// The failure kind, or `None` for content
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Content { .. } => None,
            Self::Failure { kind, .. } => Some(*kind),
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by every site crawl so its connection pool is the
/// only networking state that crosses site boundaries.
///
/// # Example
///
/// ```no_run
/// use mailsweep::config::{CrawlerConfig, UserAgentConfig};
/// use mailsweep::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default(), &UserAgentConfig::default()).unwrap();
/// ```
pub fn build_http_client(
    crawler: &CrawlerConfig,
    user_agent: &UserAgentConfig,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(user_agent.header_value())
        .timeout(crawler.request_timeout())
        .connect_timeout(crawler.connect_timeout())
        .redirect(Policy::limited(MAX_REDIRECTS))
        .danger_accept_invalid_certs(!crawler.verify_tls)
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches pages with a size cap, retry policy and failure classification
#[derive(Debug, Clone)]
pub struct Fetcher {
    client: Client,
    max_body_bytes: u64,
    retry_attempts: u32,
    backoff: ExponentialBackoff,
}

impl Fetcher {
    /// Creates a fetcher with its own client built from configuration
    pub fn new(crawler: &CrawlerConfig, user_agent: &UserAgentConfig) -> Result<Self, reqwest::Error> {
        let client = build_http_client(crawler, user_agent)?;
        Ok(Self::with_client(client, crawler))
    }

    /// Creates a fetcher around an existing client
    pub fn with_client(client: Client, crawler: &CrawlerConfig) -> Self {
        Self {
            client,
            max_body_bytes: crawler.max_body_bytes,
            retry_attempts: crawler.retry_attempts.max(1),
            backoff: ExponentialBackoff::new(crawler.retry_backoff, MAX_BACKOFF_MS),
        }
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Kind | Action |
    /// |-----------|------|--------|
    /// | Timeout, connection error, broken body | NetworkTransient | Retry with backoff |
    /// | HTTP 5xx, 408, 429 | NetworkTransient | Retry with backoff |
    /// | Other HTTP 4xx, 3xx left over | NetworkPermanent | Immediate failure |
    /// | DNS lookup failure, bad URL, redirect loop | NetworkPermanent | Immediate failure |
    /// | Body over the cap | PayloadTooLarge | Immediate failure |
    ///
    /// The returned future is cancel-safe: dropping it mid-request drops the
    /// connection along with it.
    pub async fn fetch(&self, url: &Url) -> PageResult {
        let mut attempt = 0;

        loop {
            let result = self.fetch_once(url).await;
            attempt += 1;

            match result.failure_kind() {
                Some(kind) if kind.is_retryable() && attempt < self.retry_attempts => {
                    let delay = self.backoff.delay(attempt - 1);
                    tracing::debug!(
                        "Transient failure for {} (attempt {}/{}), retrying in {:?}",
                        url,
                        attempt,
                        self.retry_attempts,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                _ => return result,
            }
        }
    }

    /// Performs one GET request without retrying
    async fn fetch_once(&self, url: &Url) -> PageResult {
        let mut response = match self.client.get(url.clone()).send().await {
            Ok(response) => response,
            Err(e) => return PageResult::failure(classify_error(&e), e.to_string()),
        };

        let status = response.status();
        if !status.is_success() {
            return PageResult::failure(
                classify_status(status),
                format!("HTTP {}", status.as_u16()),
            );
        }

        if let Some(length) = response.content_length() {
            if length > self.max_body_bytes {
                return PageResult::failure(
                    FailureKind::PayloadTooLarge,
                    format!("declared {} bytes, cap is {}", length, self.max_body_bytes),
                );
            }
        }

        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_lowercase());

        // Stream the body so an undeclared or lying Content-Length cannot
        // make us buffer more than the cap
        let mut body = Vec::new();
        loop {
            match response.chunk().await {
                Ok(Some(chunk)) => {
                    if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                        return PageResult::failure(
                            FailureKind::PayloadTooLarge,
                            format!("body exceeded {} bytes", self.max_body_bytes),
                        );
                    }
                    body.extend_from_slice(&chunk);
                }
                Ok(None) => break,
                Err(e) => return PageResult::failure(classify_error(&e), e.to_string()),
            }
        }

        PageResult::Content {
            final_url,
            content_type,
            body,
        }
    }
}

/// Maps a non-success HTTP status to a failure kind
pub fn classify_status(status: StatusCode) -> FailureKind {
    if status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
    {
        FailureKind::NetworkTransient
    } else {
        FailureKind::NetworkPermanent
    }
}

/// Maps a client error to a failure kind
fn classify_error(error: &reqwest::Error) -> FailureKind {
    if error.is_timeout() {
        FailureKind::NetworkTransient
    } else if error.is_builder() || error.is_redirect() {
        FailureKind::NetworkPermanent
    } else if error.is_connect() && is_dns_failure(error) {
        FailureKind::NetworkPermanent
    } else {
        FailureKind::NetworkTransient
    }
}

/// Walks the error chain looking for a resolver failure
fn is_dns_failure(error: &reqwest::Error) -> bool {
    let mut source = error.source();
    while let Some(err) = source {
        let message = err.to_string().to_lowercase();
        if message.contains("dns error") || message.contains("failed to lookup address") {
            return true;
        }
        source = err.source();
    }
    false
}
