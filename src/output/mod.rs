//! Output module for persisting pages and reporting on a session
//!
//! This module handles:
//! - Writing one text file per fetched page (write-through)
//! - Building the session summary and printing it
//! - Generating an optional markdown manifest

mod markdown;
mod persister;
mod summary;
mod traits;

pub use markdown::{format_markdown_manifest, write_markdown_manifest};
pub use persister::PagePersister;
pub use summary::{print_summary, CrawlSummary, FetchFailure, PageRecord};
pub use traits::{OutputError, OutputHandler, OutputResult};
