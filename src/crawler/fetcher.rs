//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with proper user agent strings
//! - GET requests to fetch page content
//! - Redirect handling (bounded, and never leaving the session scope)
//! - Error classification
//!
//! Every URL gets exactly one attempt; there is no retry.

use crate::config::UserAgentConfig;
use crate::url::{is_in_scope, ScopeRule};
use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use url::Url;

const MAX_REDIRECTS: usize = 10;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched the page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Content-Type header value
        content_type: String,
        /// Page body content
        body: String,
    },

    /// Page is not HTML (Content-Type mismatch)
    ContentMismatch {
        /// The actual Content-Type received
        content_type: String,
    },

    /// A redirect pointed outside the session scope and was not followed
    RedirectOutOfScope {
        /// Where the redirect pointed
        location: String,
    },

    /// Non-success HTTP status
    HttpError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Network error (connection refused, timeout, too many redirects, etc.)
    NetworkError {
        /// Error description
        error: String,
    },
}

impl FetchResult {
    /// Returns true if the page body is available
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    /// Human-readable failure reason (None on success)
    pub fn failure_reason(&self) -> Option<String> {
        match self {
            Self::Success { .. } => None,
            Self::ContentMismatch { content_type } => {
                Some(format!("Expected HTML, got {}", content_type))
            }
            Self::RedirectOutOfScope { location } => {
                Some(format!("Redirected out of scope to {}", location))
            }
            Self::HttpError { status_code } => Some(format!("HTTP {}", status_code)),
            Self::NetworkError { error } => Some(error.clone()),
        }
    }
}

/// The fetch collaborator: URL in, body + status out
///
/// Implementations must treat every call as a single attempt. The crawler
/// holds fetchers as `Arc<dyn PageFetcher>` and calls them from spawned
/// tasks.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a single URL
    async fn fetch(&self, url: &Url) -> FetchResult;
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Per-request timeout
/// * `scope` - When set, redirects leaving this scope are not followed
///
/// # Example
///
/// ```no_run
/// use scopecrawl::config::UserAgentConfig;
/// use scopecrawl::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(30), None).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
    scope: Option<&ScopeRule>,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(redirect_policy(scope.cloned()))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Follows up to `MAX_REDIRECTS` hops, stopping at the first hop that
/// leaves `scope`
///
/// A stopped redirect comes back as the 3xx response itself, which
/// [`fetch_url`] turns into [`FetchResult::RedirectOutOfScope`].
fn redirect_policy(scope: Option<ScopeRule>) -> Policy {
    let Some(scope) = scope else {
        return Policy::limited(MAX_REDIRECTS);
    };

    Policy::custom(move |attempt| {
        if attempt.previous().len() > MAX_REDIRECTS {
            attempt.error(format!("more than {} redirects", MAX_REDIRECTS))
        } else if is_in_scope(attempt.url(), &scope) {
            attempt.follow()
        } else {
            tracing::debug!("Not following redirect out of scope: {}", attempt.url());
            attempt.stop()
        }
    })
}

/// `PageFetcher` backed by a reqwest client
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    /// Wraps an already configured client
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Builds a fetcher confined to `scope` from the user agent configuration
    pub fn from_config(
        config: &UserAgentConfig,
        timeout: Duration,
        scope: &ScopeRule,
    ) -> Result<Self, reqwest::Error> {
        Ok(Self::new(build_http_client(config, timeout, Some(scope))?))
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        fetch_url(&self.client, url).await
    }
}

/// Fetches a URL with error classification
///
/// | Condition | Result |
/// |-----------|--------|
/// | 2xx with HTML (or no) Content-Type | Success |
/// | 2xx with other Content-Type | ContentMismatch |
/// | 3xx the client did not follow | RedirectOutOfScope |
/// | Any other status | HttpError |
/// | Timeout / connect / redirect / body error | NetworkError |
pub async fn fetch_url(client: &Client, url: &Url) -> FetchResult {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return classify_error(e),
    };

    let status = response.status();
    if status.is_redirection() {
        if let Some(location) = response
            .headers()
            .get(LOCATION)
            .and_then(|v| v.to_str().ok())
        {
            let location = response
                .url()
                .join(location)
                .map(String::from)
                .unwrap_or_else(|_| location.to_string());
            return FetchResult::RedirectOutOfScope { location };
        }
    }

    if !status.is_success() {
        return FetchResult::HttpError {
            status_code: status.as_u16(),
        };
    }

    let final_url = response.url().clone();

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html_content_type(&content_type) {
        return FetchResult::ContentMismatch { content_type };
    }

    match response.text().await {
        Ok(body) => FetchResult::Success {
            final_url,
            status_code: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => classify_error(e),
    }
}

fn classify_error(e: reqwest::Error) -> FetchResult {
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

/// An absent Content-Type counts as HTML
fn is_html_content_type(content_type: &str) -> bool {
    let content_type = content_type.to_ascii_lowercase();
    content_type.is_empty()
        || content_type.contains("text/html")
        || content_type.contains("application/xhtml+xml")
}
