// src/checker/http.rs
// =============================================================================
// This module fetches URLs and classifies what came back.
//
// Layers, bottom to top:
// - Transport: one GET request, nothing else. `ReqwestTransport` is the real
//   one; tests plug in a scripted stub.
// - FetchOutcome: a closed enum describing the final result of a fetch.
// - RetryPolicy: how many extra attempts, and how long to wait between them.
// - Fetcher: Transport + RetryPolicy. Retries transient failures (timeouts,
//   connection errors, 5xx).
//
// The Fetcher touches no shared crawl state. It can be tested on its own.
// =============================================================================

use futures::future::BoxFuture;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::CrawlConfig;

// Redirects are followed transparently up to this many hops
pub const MAX_REDIRECTS: usize = 10;

const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";

// What a transport hands back when the server answered at all
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    /// URL after following redirects
    pub final_url: Url,
    pub content_type: Option<String>,
    pub body: Option<String>,
}

// Failures below the HTTP status level
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("too many redirects")]
    TooManyRedirects,
    #[error("{0}")]
    Connection(String),
}

/// Performs a single HTTP GET.
///
/// `read_body` asks the transport to download the body, which it only does
/// for content the crawler can scan (see [`ContentKind`]).
pub trait Transport: Send + Sync {
    fn get<'a>(
        &'a self,
        url: &'a Url,
        read_body: bool,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>>;
}

// Kinds of documents we know how to pull links out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentKind {
    Html,
    Markdown,
}

impl ContentKind {
    // Decide from the Content-Type header, using the URL path for raw .md files
    // served as text/plain (GitHub raw, most static file servers)
    pub fn detect(content_type: Option<&str>, url: &Url) -> Option<Self> {
        let mime = content_type?
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        match mime.as_str() {
            "text/html" | "application/xhtml+xml" => Some(Self::Html),
            "text/markdown" | "text/x-markdown" => Some(Self::Markdown),
            "text/plain" if url.path().to_ascii_lowercase().ends_with(".md") => Some(Self::Markdown),
            _ => None,
        }
    }
}

/// Final result of fetching one URL, after retries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Anything below 400 once redirects are followed
    Success {
        status: u16,
        final_url: Url,
        content_type: Option<String>,
        body: Option<String>,
    },
    ClientError(u16),
    ServerError(u16),
    Timeout,
    ConnectionFailure(String),
    TooManyRedirects,
}

impl FetchOutcome {
    pub fn from_response(response: TransportResponse) -> Self {
        match response.status {
            status @ 400..=499 => Self::ClientError(status),
            status @ 500..=u16::MAX => Self::ServerError(status),
            status => Self::Success {
                status,
                final_url: response.final_url,
                content_type: response.content_type,
                body: response.body,
            },
        }
    }

    pub fn from_error(error: TransportError) -> Self {
        match error {
            TransportError::Timeout => Self::Timeout,
            TransportError::TooManyRedirects => Self::TooManyRedirects,
            TransportError::Connection(message) => Self::ConnectionFailure(message),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    // Same outcome with the body dropped; what gets kept for later lookups
    pub fn without_body(&self) -> Self {
        match self {
            Self::Success {
                status,
                final_url,
                content_type,
                ..
            } => Self::Success {
                status: *status,
                final_url: final_url.clone(),
                content_type: content_type.clone(),
                body: None,
            },
            other => other.clone(),
        }
    }

    // 4xx is deterministic and redirect loops won't fix themselves
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Timeout | Self::ConnectionFailure(_) | Self::ServerError(_)
        )
    }

    /// Why this outcome counts as broken, or `None` if it doesn't.
    pub fn broken_reason(&self) -> Option<BrokenReason> {
        match self {
            Self::Success { .. } => None,
            Self::ClientError(status) | Self::ServerError(status) => Some(BrokenReason::Status(*status)),
            Self::Timeout => Some(BrokenReason::Timeout),
            Self::ConnectionFailure(message) => Some(BrokenReason::ConnectionFailure(message.clone())),
            Self::TooManyRedirects => Some(BrokenReason::TooManyRedirects),
        }
    }
}

/// The reason a link was reported broken.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "snake_case")]
pub enum BrokenReason {
    Status(u16),
    Timeout,
    ConnectionFailure(String),
    TooManyRedirects,
}

impl fmt::Display for BrokenReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status(status) => write!(f, "Status: {status}"),
            Self::Timeout => f.write_str("Error: request timed out"),
            Self::ConnectionFailure(message) => write!(f, "Error: {message}"),
            Self::TooManyRedirects => f.write_str("Error: too many redirects"),
        }
    }
}

/// Bounded retry with a doubling delay between attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Attempts after the first one
    pub retries: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries,
            base_delay,
            max_delay: base_delay.saturating_mul(10),
        }
    }

    pub fn from_config(config: &CrawlConfig) -> Self {
        Self::new(config.retries, config.retry_delay)
    }

    // Delay before retry number `retry` (1-based)
    pub fn delay_for(&self, retry: u32) -> Duration {
        let factor = 1u32.checked_shl(retry.saturating_sub(1)).unwrap_or(u32::MAX);
        self.base_delay.saturating_mul(factor).min(self.max_delay)
    }
}

/// Fetches URLs through a [`Transport`], applying a [`RetryPolicy`].
pub struct Fetcher<T> {
    transport: T,
    policy: RetryPolicy,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    // Fetches one URL, retrying transient failures up to the policy limit.
    //
    // The sleep between attempts happens here, inside a single worker, with
    // no shared state borrowed.
    pub async fn fetch(&self, url: &Url, read_body: bool) -> FetchOutcome {
        let mut retry = 0;
        loop {
            let outcome = match self.transport.get(url, read_body).await {
                Ok(response) => FetchOutcome::from_response(response),
                Err(error) => FetchOutcome::from_error(error),
            };

            if !outcome.is_retryable() || retry >= self.policy.retries {
                if retry > 0 && outcome.is_retryable() {
                    warn!(%url, attempts = retry + 1, "giving up after retries: {:?}", outcome);
                }
                return outcome;
            }

            retry += 1;
            let delay = self.policy.delay_for(retry);
            debug!(%url, retry, ?delay, "transient failure ({:?}), retrying", outcome);
            tokio::time::sleep(delay).await;
        }
    }
}

/// The real transport, built on a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    // One client per run; reqwest pools connections behind it
    pub fn new(config: &CrawlConfig) -> reqwest::Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_HTML));

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;

        Ok(Self { client })
    }

    async fn send(&self, url: &Url, read_body: bool) -> Result<TransportResponse, TransportError> {
        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(categorize_error)?;

        let status = response.status().as_u16();
        let final_url = response.url().clone();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        // Only download what we can scan; a 404 page or a PNG is never parsed
        let scannable = status < 400 && ContentKind::detect(content_type.as_deref(), &final_url).is_some();
        let body = if read_body && scannable {
            match response.text().await {
                Ok(text) => Some(text),
                Err(e) if e.is_timeout() => return Err(TransportError::Timeout),
                Err(e) => {
                    // The page answered, so it is not broken; we just can't scan it
                    warn!(%url, "failed to read body: {}", e);
                    None
                }
            }
        } else {
            None
        };

        Ok(TransportResponse {
            status,
            final_url,
            content_type,
            body,
        })
    }
}

impl Transport for ReqwestTransport {
    fn get<'a>(
        &'a self,
        url: &'a Url,
        read_body: bool,
    ) -> BoxFuture<'a, Result<TransportResponse, TransportError>> {
        Box::pin(self.send(url, read_body))
    }
}

// Maps reqwest's error kinds onto our transport errors
fn categorize_error(error: reqwest::Error) -> TransportError {
    let error_string = error.to_string().to_lowercase();

    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_redirect() {
        TransportError::TooManyRedirects
    } else if error.is_connect() && error_string.contains("dns") {
        TransportError::Connection("could not resolve hostname".to_string())
    } else if error.is_connect() {
        TransportError::Connection(format!("connection failed: {error}"))
    } else if error_string.contains("certificate") || error_string.contains("ssl") {
        TransportError::Connection("SSL certificate error".to_string())
    } else {
        TransportError::Connection(error.to_string())
    }
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is BoxFuture?
//    - A heap-allocated, Send future: Pin<Box<dyn Future + Send + 'a>>
//    - Lets a trait method be async while the trait stays usable with
//      tokio::spawn, which needs Send futures
//
// 2. Why is FetchOutcome an enum instead of a status code plus flags?
//    - Every match on it must handle every case; the compiler checks
//    - A 404 and a DNS failure can't be mixed up
//
// 3. What does `status @ 400..=499` mean?
//    - Match any value in the range and bind it to `status`
// -----------------------------------------------------------------------------
