//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching behind the `PageFetcher` trait
//! - Text and link extraction from HTML
//! - The frontier (visited map, queue, budget, fan-out)
//! - Overall session coordination

mod coordinator;
mod extractor;
mod fetcher;
mod frontier;
#[cfg(feature = "render")]
mod render;

pub use coordinator::{Coordinator, CrawlReport, ExtractedPage};
pub use extractor::{
    normalize_whitespace, wrap_text, ContentExtractor, ExtractError, ExtractedContent,
    DEFAULT_CONTAINERS, WRAP_WIDTH,
};
pub use fetcher::{build_http_client, fetch_url, FetchResult, HttpFetcher, PageFetcher};
pub use frontier::{EnqueueOutcome, Frontier};
#[cfg(feature = "render")]
pub use render::{RenderError, RenderFetcher};

use crate::config::Config;

/// Runs a complete crawl session
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Validate the configuration and derive the scope rule
/// 2. Build the HTTP client and the filesystem persister
/// 3. Fetch pages breadth-first within scope until the budget is used
/// 4. Write each page's text as soon as it is extracted
/// 5. Write the optional markdown manifest
///
/// # Arguments
///
/// * `config` - The session configuration
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Session finished (possibly with per-page failures)
/// * `Err(CrawlError)` - Configuration or output root problem
pub async fn crawl(config: Config) -> crate::Result<CrawlReport> {
    Coordinator::from_config(&config)?.run().await
}
