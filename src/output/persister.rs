//! Filesystem page persister
//!
//! Maps logical paths to `.txt` files under the output root and writes
//! extracted text through as soon as a page is done. Page writes go through
//! `tokio::fs`, so they run on the blocking pool instead of the thread
//! collecting fetch results.

use crate::config::OutputConfig;
use crate::crawler::ExtractedPage;
use crate::output::markdown::write_markdown_manifest;
use crate::output::summary::CrawlSummary;
use crate::output::traits::{OutputError, OutputHandler, OutputResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

const PROBE_FILE: &str = ".scopecrawl-write-probe";

/// Writes one text file per page under an output root
///
/// | Logical path | File |
/// |--------------|------|
/// | `index` (or empty) | `<root>/index.txt` |
/// | `guide/setup` | `<root>/guide/setup.txt` |
///
/// Writing the same logical path twice replaces the earlier file.
#[derive(Debug, Clone)]
pub struct PagePersister {
    output_root: PathBuf,
    summary_path: Option<PathBuf>,
}

impl PagePersister {
    /// Creates a persister writing under `output_root`
    pub fn new(output_root: impl Into<PathBuf>) -> Self {
        Self {
            output_root: output_root.into(),
            summary_path: None,
        }
    }

    /// Builds a persister from the output configuration
    pub fn from_config(config: &OutputConfig) -> Self {
        let persister = Self::new(&config.output_root);
        match &config.summary_path {
            Some(path) => persister.with_summary_path(path),
            None => persister,
        }
    }

    /// Also writes a markdown manifest to `path` when the session ends
    pub fn with_summary_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.summary_path = Some(path.into());
        self
    }

    /// The directory pages are written under
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// Resolves the file a logical path is written to
    ///
    /// Rejects paths that could escape the output root (absolute paths,
    /// `.` or `..` segments).
    pub fn path_for(&self, logical_path: &str) -> OutputResult<PathBuf> {
        let segments: Vec<&str> = logical_path
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect();

        if logical_path.starts_with('/')
            || segments
                .iter()
                .any(|s| *s == "." || *s == ".." || s.contains('\\'))
        {
            return Err(OutputError::InvalidPath(logical_path.to_string()));
        }

        let (file_stem, dirs) = match segments.split_last() {
            Some((last, dirs)) => (*last, dirs),
            None => ("index", &[][..]),
        };

        let mut path = self.output_root.clone();
        for dir in dirs {
            path.push(dir);
        }
        path.push(format!("{}.txt", file_stem));
        Ok(path)
    }

    /// Writes `text` for `logical_path`, creating parent directories
    pub async fn write_page(&self, logical_path: &str, text: &str) -> OutputResult<PathBuf> {
        let path = self.path_for(logical_path)?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).await?;
        }
        fs::write(&path, text).await?;

        tracing::trace!("Wrote {} bytes to {}", text.len(), path.display());
        Ok(path)
    }

    fn root_unavailable(&self, source: std::io::Error) -> OutputError {
        OutputError::RootUnavailable {
            path: self.output_root.display().to_string(),
            source,
        }
    }
}

#[async_trait]
impl OutputHandler for PagePersister {
    async fn prepare(&mut self) -> OutputResult<()> {
        fs::create_dir_all(&self.output_root)
            .await
            .map_err(|e| self.root_unavailable(e))?;

        let probe = self.output_root.join(PROBE_FILE);
        fs::write(&probe, b"")
            .await
            .map_err(|e| self.root_unavailable(e))?;
        fs::remove_file(&probe)
            .await
            .map_err(|e| self.root_unavailable(e))?;

        tracing::debug!("Output root ready: {}", self.output_root.display());
        Ok(())
    }

    async fn persist(&mut self, page: &ExtractedPage) -> OutputResult<PathBuf> {
        self.write_page(&page.logical_path, &page.text).await
    }

    async fn finalize(&mut self, summary: &CrawlSummary) -> OutputResult<()> {
        if let Some(path) = &self.summary_path {
            write_markdown_manifest(summary, path)?;
            tracing::info!("Summary written to {}", path.display());
        }
        Ok(())
    }
}
