//! Output handler trait and errors
//!
//! An output handler receives every extracted page as soon as it exists
//! (write-through) and the session summary at the end.

use crate::crawler::ExtractedPage;
use async_trait::async_trait;
use crate::output::summary::CrawlSummary;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid logical path '{0}'")]
    InvalidPath(String),

    #[error("Output root '{path}' is not writable: {source}")]
    RootUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Result type for output operations
pub type OutputResult<T> = Result<T, OutputError>;

/// Trait for output handlers
///
/// The coordinator calls `prepare` once before the first fetch, `persist`
/// once per fetched page in completion order, and `finalize` once at the
/// end. Only a `prepare` error ends the session; `persist` and `finalize`
/// errors are logged and counted.
///
/// The methods are async so slow writes do not hold up the runtime thread
/// that also collects fetch results.
#[async_trait]
pub trait OutputHandler: Send {
    /// Makes sure output can be written at all
    async fn prepare(&mut self) -> OutputResult<()>;

    /// Writes one page and returns where it went
    ///
    /// # Arguments
    ///
    /// * `page` - The extracted page; its logical path selects the destination
    async fn persist(&mut self, page: &ExtractedPage) -> OutputResult<PathBuf>;

    /// Performs any final writes once the session is over
    ///
    /// # Arguments
    ///
    /// * `summary` - The final session summary
    async fn finalize(&mut self, summary: &CrawlSummary) -> OutputResult<()>;
}
