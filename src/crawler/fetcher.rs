//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler:
//! - Building the shared HTTP client with the configured user agent
//! - GET requests with a per-request timeout
//! - Error classification into HTTP and network failures
//!
//! Redirects are followed by the client; callers receive the final URL.

use crate::config::Config;
use reqwest::{redirect::Policy, Client};
use std::time::{Duration, Instant};
use url::Url;

/// Maximum redirect hops before a fetch is treated as failed
const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// Page body content
        body: String,
        /// Time from sending the request to reading the full body
        elapsed: Duration,
    },

    /// Page is not HTML and the caller asked for HTML only
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// Server answered with a non-2xx status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, body read failure)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Error message and optional status code for a failed fetch
    pub fn failure(&self) -> Option<(String, Option<u16>)> {
        match self {
            Self::HttpError { status_code } => Some((
                format!("Request failed with status code {}", status_code),
                Some(*status_code),
            )),
            Self::NetworkError { error } => Some((error.clone(), None)),
            Self::Success { .. } | Self::ContentMismatch { .. } => None,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// The client is shared by all workers of a job. The request timeout applies
/// to every page fetch; robots.txt requests override it per request.
///
/// # Example
///
/// ```no_run
/// use site_audit::config::Config;
/// use site_audit::crawler::build_http_client;
///
/// let client = build_http_client(&Config::default()).unwrap();
/// ```
pub fn build_http_client(config: &Config) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.user_agent.header_value())
        .timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .connect_timeout(Duration::from_secs(config.crawler.request_timeout_secs))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a URL and classifies the outcome
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx, HTML or `html_only == false` | `Success` |
/// | 2xx, not HTML, `html_only == true` | `ContentMismatch` (body not read) |
/// | Any other status | `HttpError` |
/// | Timeout, connect, TLS, redirect loop, body error | `NetworkError` |
pub async fn fetch_url(client: &Client, url: &Url, html_only: bool) -> FetchResult {
    let started = Instant::now();

    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(&e),
    };

    let status = response.status();
    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().clone();
    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if html_only && !content_type.contains("text/html") {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            body,
            elapsed: started.elapsed(),
        },
        Err(e) => classify_error(&e),
    }
}

fn classify_error(e: &reqwest::Error) -> FetchResult {
    let error = if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        format!("Connection failed: {}", e)
    } else if e.is_redirect() {
        format!("Redirect error: {}", e)
    } else {
        e.to_string()
    };
    FetchResult::NetworkError { error }
}
