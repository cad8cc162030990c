//! Markdown session manifest
//!
//! Written at session end when a summary path is configured: run
//! information, statistics, every page with the file it was written to, and
//! every failed fetch.

use crate::output::summary::CrawlSummary;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Writes the markdown manifest for a session
///
/// # Arguments
///
/// * `summary` - The crawl summary data
/// * `output_path` - Path where the markdown file should be written
pub fn write_markdown_manifest(summary: &CrawlSummary, output_path: &Path) -> OutputResult<()> {
    let markdown = format_markdown_manifest(summary);

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats a crawl summary as markdown
pub fn format_markdown_manifest(summary: &CrawlSummary) -> String {
    let mut md = String::new();

    md.push_str("# Scopecrawl Session Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!("- **Seed**: {}\n", summary.seed_url));
    md.push_str(&format!("- **Scope**: {}\n", summary.scope));
    md.push_str(&format!("- **Started**: {}\n", summary.started_at.to_rfc3339()));
    if let Some(finished) = summary.finished_at {
        md.push_str(&format!("- **Finished**: {}\n", finished.to_rfc3339()));
    }
    if let Some(duration) = summary.duration_seconds() {
        md.push_str(&format!("- **Duration**: {:.1} seconds\n", duration));
    }
    md.push_str(&format!("- **Status**: {}\n", summary.status()));
    if let Some(hash) = &summary.config_hash {
        md.push_str(&format!("- **Config Hash**: {}\n", hash));
    }
    md.push('\n');

    // Statistics
    md.push_str("## Statistics\n\n");
    md.push_str("| Metric | Value |\n");
    md.push_str("|--------|-------|\n");
    md.push_str(&format!("| Page budget | {} |\n", summary.page_budget));
    if let Some(limit) = summary.fan_out_limit {
        md.push_str(&format!("| Fan-out limit | {} |\n", limit));
    }
    md.push_str(&format!("| Concurrency | {} |\n", summary.concurrency));
    md.push_str(&format!("| Pages fetched | {} |\n", summary.pages_fetched));
    md.push_str(&format!("| Fetch failures | {} |\n", summary.fetch_failures()));
    md.push_str(&format!("| Write failures | {} |\n", summary.persist_failures));
    md.push_str(&format!("| Links seen | {} |\n", summary.links_seen));
    md.push_str(&format!("| Links queued | {} |\n", summary.links_queued));
    md.push_str(&format!("| Duplicate links | {} |\n", summary.links_duplicate));
    md.push_str(&format!("| Out-of-scope links | {} |\n", summary.links_out_of_scope));
    md.push_str(&format!("| Over fan-out | {} |\n", summary.links_over_fan_out));
    md.push_str(&format!("| Left in frontier | {} |\n", summary.frontier_remaining));
    md.push_str(&format!("| Success rate | {:.2}% |\n\n", summary.success_rate()));

    // Pages
    if !summary.pages.is_empty() {
        md.push_str("## Pages\n\n");
        md.push_str("| URL | Title | File |\n");
        md.push_str("|-----|-------|------|\n");

        for page in &summary.pages {
            let file = page
                .file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(not written)".to_string());
            md.push_str(&format!(
                "| {} | {} | {} |\n",
                escape_cell(&page.url),
                escape_cell(page.title.as_deref().unwrap_or("")),
                escape_cell(&file)
            ));
        }
        md.push('\n');
    }

    // Failures
    if !summary.failures.is_empty() {
        md.push_str("## Failures\n\n");
        md.push_str("| URL | Reason |\n");
        md.push_str("|-----|--------|\n");

        for failure in &summary.failures {
            md.push_str(&format!(
                "| {} | {} |\n",
                escape_cell(&failure.url),
                escape_cell(&failure.reason)
            ));
        }
        md.push('\n');
    }

    md
}

fn escape_cell(value: &str) -> String {
    value.replace('|', "\\|").replace('\n', " ")
}
