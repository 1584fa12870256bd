//! HTTP fetcher
//!
//! One network round trip per call: no internal retry, no redirect games.
//! Inter-request pacing belongs to the caller (the worker pool or the
//! listing walker), and failures come back classified so the caller can
//! tell a flaky timeout from a dead product page.

use crate::config::ScrapeConfig;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE};
use reqwest::Client;
use std::time::Duration;
use thiserror::Error;

/// Browser user agent; robu.in rejects obvious bot UAs
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Coarse failure classification
///
/// Transient failures are worth retrying in a later run; permanent ones
/// mean the URL itself is dead; everything else is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Transient,
    Permanent,
    Unknown,
}

/// A failed fetch, one variant per failure mode
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request timed out for {url}")]
    Timeout { url: String },

    #[error("connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("failed to read body for {url}: {message}")]
    Body { url: String, message: String },

    #[error("request failed for {url}: {message}")]
    Request { url: String, message: String },

    #[error("invalid URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },
}

impl FetchError {
    /// The URL the failure belongs to
    pub fn url(&self) -> &str {
        match self {
            FetchError::Timeout { url }
            | FetchError::Connect { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::Body { url, .. }
            | FetchError::Request { url, .. }
            | FetchError::InvalidUrl { url, .. } => url,
        }
    }

    /// Classifies the failure as transient, permanent, or unknown
    pub fn class(&self) -> ErrorClass {
        match self {
            FetchError::Timeout { .. } | FetchError::Connect { .. } => ErrorClass::Transient,
            FetchError::Status { status, .. } if *status == 404 || *status == 410 => {
                ErrorClass::Permanent
            }
            _ => ErrorClass::Unknown,
        }
    }

    fn from_reqwest(url: &str, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout {
                url: url.to_string(),
            }
        } else if error.is_connect() {
            FetchError::Connect {
                url: url.to_string(),
                message: error.to_string(),
            }
        } else {
            FetchError::Request {
                url: url.to_string(),
                message: error.to_string(),
            }
        }
    }
}

/// Builds the shared HTTP client
///
/// Sends the header set a desktop Chrome would, since the storefront sits
/// behind bot protection that inspects them. Compressed responses are
/// decoded transparently.
pub fn build_http_client(config: &ScrapeConfig) -> Result<Client, reqwest::Error> {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
    headers.insert(
        "upgrade-insecure-requests",
        HeaderValue::from_static("1"),
    );

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches one URL and returns its body as text
///
/// Exactly one GET per call. Non-2xx statuses are errors carrying the
/// status code; the batch-level policy of what to do with them lives in
/// the caller.
pub async fn fetch_page(client: &Client, url: &str) -> Result<String, FetchError> {
    let response = client
        .get(url)
        .send()
        .await
        .map_err(|e| FetchError::from_reqwest(url, e))?;

    let status = response.status();
    if !status.is_success() {
        tracing::debug!("HTTP {} for {}", status.as_u16(), url);
        return Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
        });
    }

    response.text().await.map_err(|e| FetchError::Body {
        url: url.to_string(),
        message: e.to_string(),
    })
}
