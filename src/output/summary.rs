//! Session summary and console report
//!
//! The summary is built up by the coordinator while the crawl runs and
//! handed to the output handler and the console at the end.

use crate::crawler::EnqueueOutcome;
use chrono::{DateTime, Utc};
use std::path::PathBuf;

/// One fetched page as listed in the report
#[derive(Debug, Clone, PartialEq)]
pub struct PageRecord {
    /// URL the page was requested under
    pub url: String,

    /// Page title (if available)
    pub title: Option<String>,

    /// Scope-relative logical path
    pub logical_path: String,

    /// File the text was written to (`None` if the write failed)
    pub file: Option<PathBuf>,
}

/// A fetch that produced no page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchFailure {
    /// The URL that failed
    pub url: String,

    /// Error message
    pub reason: String,
}

/// Summary statistics for one crawl session
#[derive(Debug, Clone)]
pub struct CrawlSummary {
    // Session metadata
    pub seed_url: String,
    pub scope: String,
    pub page_budget: usize,
    pub fan_out_limit: Option<usize>,
    pub concurrency: usize,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub cancelled: bool,
    pub config_hash: Option<String>,

    // Page counts
    pub pages_fetched: usize,
    pub persist_failures: usize,
    pub frontier_remaining: usize,

    // Link counts (over every fetched page)
    pub links_seen: usize,
    pub links_queued: usize,
    pub links_duplicate: usize,
    pub links_out_of_scope: usize,
    pub links_over_fan_out: usize,

    // Per-page detail
    pub pages: Vec<PageRecord>,
    pub failures: Vec<FetchFailure>,
}

impl CrawlSummary {
    /// Creates an empty summary stamped with the current time
    pub fn new(seed_url: impl Into<String>, scope: impl Into<String>, page_budget: usize) -> Self {
        Self {
            seed_url: seed_url.into(),
            scope: scope.into(),
            page_budget,
            fan_out_limit: None,
            concurrency: 1,
            started_at: Utc::now(),
            finished_at: None,
            cancelled: false,
            config_hash: None,
            pages_fetched: 0,
            persist_failures: 0,
            frontier_remaining: 0,
            links_seen: 0,
            links_queued: 0,
            links_duplicate: 0,
            links_out_of_scope: 0,
            links_over_fan_out: 0,
            pages: Vec::new(),
            failures: Vec::new(),
        }
    }

    /// Adds the link decisions made for one page
    pub fn record_links(&mut self, outcome: &EnqueueOutcome) {
        self.links_seen += outcome.total();
        self.links_queued += outcome.queued;
        self.links_duplicate += outcome.duplicates;
        self.links_out_of_scope += outcome.out_of_scope;
        self.links_over_fan_out += outcome.over_fan_out;
    }

    /// Stamps the end of the session
    pub fn finish(&mut self, cancelled: bool, frontier_remaining: usize) {
        self.finished_at = Some(Utc::now());
        self.cancelled = cancelled;
        self.frontier_remaining = frontier_remaining;
    }

    /// Number of fetch attempts that produced no page
    pub fn fetch_failures(&self) -> usize {
        self.failures.len()
    }

    /// Wall-clock duration, once finished
    pub fn duration_seconds(&self) -> Option<f64> {
        self.finished_at
            .map(|finished| (finished - self.started_at).num_milliseconds() as f64 / 1000.0)
    }

    /// Returns the success rate of fetch attempts as a percentage
    pub fn success_rate(&self) -> f64 {
        let attempts = self.pages_fetched + self.fetch_failures();
        if attempts == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / attempts as f64) * 100.0
    }

    /// Returns how much of the page budget was used, as a percentage
    pub fn budget_used(&self) -> f64 {
        if self.page_budget == 0 {
            return 0.0;
        }
        (self.pages_fetched as f64 / self.page_budget as f64) * 100.0
    }

    /// Short status label
    pub fn status(&self) -> &'static str {
        match (self.finished_at, self.cancelled) {
            (None, _) => "running",
            (Some(_), true) => "cancelled",
            (Some(_), false) => "completed",
        }
    }
}

/// Prints the session report to stdout
pub fn print_summary(summary: &CrawlSummary) {
    println!("=== Crawl Summary ===\n");

    println!("Session:");
    println!("  Seed: {}", summary.seed_url);
    println!("  Scope: {}", summary.scope);
    println!("  Status: {}", summary.status());
    if let Some(duration) = summary.duration_seconds() {
        println!("  Duration: {:.1}s", duration);
    }
    println!();

    println!("Pages:");
    println!(
        "  Fetched: {} / {} budget ({:.1}%)",
        summary.pages_fetched,
        summary.page_budget,
        summary.budget_used()
    );
    println!("  Fetch failures: {}", summary.fetch_failures());
    if summary.persist_failures > 0 {
        println!("  Write failures: {}", summary.persist_failures);
    }
    println!("  Left in frontier: {}", summary.frontier_remaining);
    println!();

    println!("Links:");
    println!("  Seen: {}", summary.links_seen);
    println!("  Queued: {}", summary.links_queued);
    println!("  Duplicate: {}", summary.links_duplicate);
    println!("  Out of scope: {}", summary.links_out_of_scope);
    if summary.fan_out_limit.is_some() {
        println!("  Over fan-out: {}", summary.links_over_fan_out);
    }
    println!();

    if !summary.failures.is_empty() {
        println!("Failures ({}):", summary.failures.len());
        for failure in summary.failures.iter().take(20) {
            println!("  - {}: {}", failure.url, failure.reason);
        }
        if summary.failures.len() > 20 {
            println!("  ... and {} more", summary.failures.len() - 20);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} fetches produced a page)",
        summary.success_rate(),
        summary.pages_fetched,
        summary.pages_fetched + summary.fetch_failures()
    );
}
