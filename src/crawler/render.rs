//! Headless-browser fetcher
//!
//! For documentation sites that build their content with JavaScript. Every
//! fetch opens a fresh tab, navigates, and hands back the rendered DOM as
//! HTML, so the rest of the pipeline (extraction, scope, persistence) is
//! unchanged.
//!
//! Only compiled with the `render` feature. Needs a Chromium binary that
//! chromiumoxide can find.

use crate::crawler::fetcher::{FetchResult, PageFetcher};
use crate::url::{is_in_scope, ScopeRule};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::Page;
use futures::StreamExt;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use url::Url;

/// Errors raised while starting the browser
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Invalid browser configuration: {0}")]
    Config(String),

    #[error("Browser error: {0}")]
    Browser(#[from] CdpError),
}

/// `PageFetcher` that renders pages in headless Chromium
///
/// The browser cannot be told to stop at an out-of-scope redirect, so the
/// URL the tab ends on is checked after navigation instead; a page that
/// left the scope is reported as [`FetchResult::RedirectOutOfScope`] and
/// its content is discarded.
pub struct RenderFetcher {
    browser: Browser,
    handler: JoinHandle<()>,
    scope: ScopeRule,
    timeout: Duration,
}

impl RenderFetcher {
    /// Launches a headless browser for one session
    pub async fn launch(scope: ScopeRule, timeout: Duration) -> Result<Self, RenderError> {
        let config = BrowserConfig::builder()
            .build()
            .map_err(RenderError::Config)?;
        let (browser, mut events) = Browser::launch(config).await?;

        let handler = tokio::spawn(async move {
            while let Some(event) = events.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser event loop stopped: {}", e);
                    break;
                }
            }
        });

        tracing::info!("Headless browser started");
        Ok(Self {
            browser,
            handler,
            scope,
            timeout,
        })
    }

    async fn render(&self, page: &Page, url: &Url) -> FetchResult {
        match tokio::time::timeout(self.timeout, page.goto(url.as_str())).await {
            Err(_) => {
                return FetchResult::NetworkError {
                    error: "Request timeout".to_string(),
                }
            }
            Ok(Err(e)) => {
                return FetchResult::NetworkError {
                    error: format!("Navigation failed: {}", e),
                }
            }
            Ok(Ok(_)) => {}
        }

        let final_url = match page.url().await {
            Ok(Some(current)) => Url::parse(&current).unwrap_or_else(|_| url.clone()),
            _ => url.clone(),
        };

        if !is_in_scope(&final_url, &self.scope) {
            return FetchResult::RedirectOutOfScope {
                location: final_url.to_string(),
            };
        }

        match page.content().await {
            Ok(body) => FetchResult::Success {
                final_url,
                status_code: 200,
                content_type: "text/html".to_string(),
                body,
            },
            Err(e) => FetchResult::NetworkError {
                error: format!("Failed to read rendered page: {}", e),
            },
        }
    }
}

#[async_trait]
impl PageFetcher for RenderFetcher {
    async fn fetch(&self, url: &Url) -> FetchResult {
        let page = match self.browser.new_page("about:blank").await {
            Ok(page) => page,
            Err(e) => {
                return FetchResult::NetworkError {
                    error: format!("Failed to open tab: {}", e),
                }
            }
        };

        let result = self.render(&page, url).await;

        // Tabs are not closed on drop
        if let Err(e) = page.close().await {
            tracing::debug!("Failed to close tab for {}: {}", url, e);
        }

        result
    }
}

impl Drop for RenderFetcher {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::url::SubdomainPolicy;

    #[tokio::test]
    #[ignore = "needs a local Chromium"]
    async fn test_renders_page_and_checks_scope() {
        let seed = Url::parse("https://example.com/").unwrap();
        let scope = ScopeRule::from_seed(&seed, SubdomainPolicy::Exact, None).unwrap();
        let fetcher = RenderFetcher::launch(scope, Duration::from_secs(30))
            .await
            .unwrap();

        match fetcher.fetch(&seed).await {
            FetchResult::Success { body, .. } => assert!(body.contains("Example Domain")),
            other => panic!("unexpected result: {:?}", other),
        }

        let elsewhere = Url::parse("https://www.iana.org/").unwrap();
        assert!(matches!(
            fetcher.fetch(&elsewhere).await,
            FetchResult::RedirectOutOfScope { .. }
        ));
    }
}
