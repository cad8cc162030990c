//! Crawler coordinator - main crawl orchestration logic
//!
//! This module contains the main crawl loop that coordinates all aspects of
//! a session, including:
//! - Building the scope rule and frontier from the configuration
//! - Dispatching fetches to a bounded set of tasks
//! - Persisting each extracted page as soon as its fetch completes
//! - Feeding discovered links back into the frontier
//! - Handling cancellation and the session deadline
//!
//! Fetch tasks only fetch and extract. Every piece of session state (the
//! frontier, the summary, the output handler) is touched by the coordinator
//! alone, as task results come back.

use crate::config::{validate, Config};
use crate::crawler::extractor::{ContentExtractor, ExtractedContent};
use crate::crawler::fetcher::{FetchResult, HttpFetcher, PageFetcher};
use crate::crawler::frontier::Frontier;
use crate::output::{CrawlSummary, FetchFailure, OutputHandler, PagePersister, PageRecord};
use crate::url::{CrawlTarget, ScopeRule};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use url::Url;

const PROGRESS_EVERY: usize = 10;

/// One crawled page: where it came from and what it says
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPage {
    /// URL the page was requested under
    pub url: Url,

    /// Scope-relative, filesystem-safe key of the page
    pub logical_path: String,

    /// Page title (if available)
    pub title: Option<String>,

    /// Extracted text, wrapped at 80 columns
    pub text: String,
}

/// Everything a finished session produced
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// Pages in the order their fetches completed
    pub pages: Vec<ExtractedPage>,

    /// Counters, failures and per-page records
    pub summary: CrawlSummary,
}

impl CrawlReport {
    /// Fetches that produced no page
    pub fn failures(&self) -> &[FetchFailure] {
        &self.summary.failures
    }

    /// Returns whether the session was cut short by cancellation
    pub fn is_cancelled(&self) -> bool {
        self.summary.cancelled
    }
}

/// What a fetch task sends back to the coordinator
#[derive(Debug)]
enum TaskOutcome {
    Fetched {
        target: CrawlTarget,
        final_url: Url,
        content: ExtractedContent,
    },
    Failed {
        target: CrawlTarget,
        reason: String,
    },
}

/// Main crawler coordinator structure
///
/// Owns the session: scope rule, frontier, fetcher, extractor and output
/// handler. Consumed by [`Coordinator::run`].
pub struct Coordinator {
    scope: ScopeRule,
    frontier: Frontier,
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<ContentExtractor>,
    output: Box<dyn OutputHandler>,
    cancel: CancellationToken,
    concurrency: usize,
    deadline: Option<Duration>,
    summary: CrawlSummary,
}

impl Coordinator {
    /// Creates a coordinator with explicit collaborators
    ///
    /// The configuration is validated again here, so every configuration
    /// error surfaces before any fetch.
    ///
    /// # Arguments
    ///
    /// * `config` - The session configuration
    /// * `fetcher` - Fetch collaborator (HTTP in production, in-memory in tests)
    /// * `output` - Where extracted pages go
    pub fn new(
        config: &Config,
        fetcher: Arc<dyn PageFetcher>,
        output: Box<dyn OutputHandler>,
    ) -> crate::Result<Self> {
        let (seed, scope) = session_scope(config)?;

        let crawler = &config.crawler;
        let mut summary = CrawlSummary::new(seed.url.as_str(), scope.to_string(), crawler.page_budget);
        summary.fan_out_limit = crawler.fan_out_limit;
        summary.concurrency = crawler.concurrency;

        Ok(Self {
            frontier: Frontier::new(seed, crawler.page_budget, crawler.fan_out_limit),
            scope,
            fetcher,
            extractor: Arc::new(ContentExtractor::new()),
            output,
            cancel: CancellationToken::new(),
            concurrency: crawler.concurrency,
            deadline: crawler.deadline_secs.map(Duration::from_secs),
            summary,
        })
    }

    /// Creates a coordinator with the HTTP fetcher and filesystem persister
    ///
    /// The HTTP client does not follow redirects out of the session scope.
    pub fn from_config(config: &Config) -> crate::Result<Self> {
        let (_, scope) = session_scope(config)?;
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let fetcher = HttpFetcher::from_config(&config.user_agent, timeout, &scope)?;
        let output = PagePersister::from_config(&config.output);

        Self::new(config, Arc::new(fetcher), Box::new(output))
    }

    /// Creates a coordinator that renders pages in a headless browser
    #[cfg(feature = "render")]
    pub async fn with_rendering(config: &Config) -> crate::Result<Self> {
        let (_, scope) = session_scope(config)?;
        let timeout = Duration::from_secs(config.crawler.request_timeout_secs);
        let fetcher = crate::crawler::RenderFetcher::launch(scope, timeout).await?;
        let output = PagePersister::from_config(&config.output);

        Self::new(config, Arc::new(fetcher), Box::new(output))
    }

    /// Replaces the default content extractor
    pub fn with_extractor(mut self, extractor: ContentExtractor) -> Self {
        self.extractor = Arc::new(extractor);
        self
    }

    /// Records the configuration hash in the session summary
    pub fn with_config_hash(mut self, hash: impl Into<String>) -> Self {
        self.summary.config_hash = Some(hash.into());
        self
    }

    /// Token that cancels the session when triggered
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// The scope rule computed from the seed
    pub fn scope(&self) -> &ScopeRule {
        &self.scope
    }

    /// Runs the main crawl loop
    ///
    /// 1. Prepares the output (an unusable output root fails here, before any fetch)
    /// 2. Keeps up to `concurrency` fetches in flight, each holding a budget slot
    /// 3. As each fetch completes: marks it fetched, persists the page, and
    ///    enqueues its in-scope links; or records the failure and frees the slot
    /// 4. Stops when the frontier is drained or the budget is used, or aborts
    ///    in-flight fetches on cancellation
    /// 5. Finalizes the output with the session summary
    pub async fn run(mut self) -> crate::Result<CrawlReport> {
        self.output.prepare().await?;

        tracing::info!(
            "Starting crawl of {} (scope {}, budget {}, concurrency {})",
            self.summary.seed_url,
            self.scope,
            self.frontier.page_budget(),
            self.concurrency
        );

        let start_time = Instant::now();
        let mut pages = Vec::new();
        let mut in_flight: JoinSet<TaskOutcome> = JoinSet::new();

        let deadline = self.deadline;
        let deadline_reached = async move {
            match deadline {
                Some(limit) => tokio::time::sleep(limit).await,
                None => std::future::pending::<()>().await,
            }
        };
        tokio::pin!(deadline_reached);

        loop {
            if !self.cancel.is_cancelled() {
                self.dispatch(&mut in_flight);
            }

            if in_flight.is_empty() {
                break;
            }

            tokio::select! {
                _ = self.cancel.cancelled() => {
                    tracing::warn!("Crawl cancelled, aborting {} in-flight fetches", in_flight.len());
                    in_flight.shutdown().await;
                    break;
                }
                _ = &mut deadline_reached => {
                    tracing::warn!(
                        "Deadline reached, aborting {} in-flight fetches",
                        in_flight.len()
                    );
                    self.cancel.cancel();
                    in_flight.shutdown().await;
                    break;
                }
                Some(joined) = in_flight.join_next() => {
                    let fetched_before = self.frontier.fetched_count();
                    self.handle_joined(joined, &mut pages).await;

                    let fetched = self.frontier.fetched_count();
                    if fetched > fetched_before && fetched % PROGRESS_EVERY == 0 {
                        let rate = fetched as f64 / start_time.elapsed().as_secs_f64();
                        tracing::info!(
                            "Progress: {}/{} pages fetched, {} in frontier, {:.2} pages/sec",
                            fetched,
                            self.frontier.page_budget(),
                            self.frontier.pending(),
                            rate
                        );
                    }
                }
            }
        }

        let cancelled = self.cancel.is_cancelled();
        self.summary.finish(cancelled, self.frontier.pending());

        if let Err(e) = self.output.finalize(&self.summary).await {
            tracing::error!("Failed to finalize output: {}", e);
        }

        tracing::info!(
            "Crawl {}: {} pages fetched ({} failures) in {:?}",
            self.summary.status(),
            self.summary.pages_fetched,
            self.summary.fetch_failures(),
            start_time.elapsed()
        );

        Ok(CrawlReport {
            pages,
            summary: self.summary,
        })
    }

    /// Starts fetches until the concurrency limit or the budget is reached
    fn dispatch(&mut self, in_flight: &mut JoinSet<TaskOutcome>) {
        while in_flight.len() < self.concurrency {
            let Some(target) = self.frontier.next_target() else {
                break;
            };

            tracing::debug!("Fetching {}", target);
            in_flight.spawn(fetch_and_extract(
                Arc::clone(&self.fetcher),
                Arc::clone(&self.extractor),
                target,
            ));
        }
    }

    async fn handle_joined(
        &mut self,
        joined: Result<TaskOutcome, JoinError>,
        pages: &mut Vec<ExtractedPage>,
    ) {
        match joined {
            Ok(TaskOutcome::Fetched {
                target,
                final_url,
                content,
            }) => {
                if let Some(page) = self.handle_fetched(target, final_url, content).await {
                    pages.push(page);
                }
            }
            Ok(TaskOutcome::Failed { target, reason }) => {
                tracing::warn!("Failed to fetch {}: {}", target, reason);
                self.frontier.abandon(&target);
                self.summary.failures.push(FetchFailure {
                    url: target.url.to_string(),
                    reason,
                });
            }
            Err(e) => {
                // The target is lost with the task; only its slot comes back
                tracing::error!("Fetch task ended abnormally: {}", e);
                self.frontier.release_slot();
            }
        }
    }

    /// Persisting yields to the runtime, so fetch tasks keep running while a
    /// page is written; results are still handled one at a time.
    async fn handle_fetched(
        &mut self,
        target: CrawlTarget,
        final_url: Url,
        content: ExtractedContent,
    ) -> Option<ExtractedPage> {
        if !self.frontier.complete(&target, &final_url) {
            tracing::debug!("{} was already fetched under another URL, dropping result", target);
            return None;
        }

        let page = ExtractedPage {
            logical_path: self.scope.logical_path(&target.url),
            url: target.url,
            title: content.title,
            text: content.text,
        };

        tracing::info!(
            "Fetched [{}/{}] {} -> {}",
            self.frontier.fetched_count(),
            self.frontier.page_budget(),
            page.url,
            page.logical_path
        );

        let file = match self.output.persist(&page).await {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Failed to write {}: {}", page.logical_path, e);
                self.summary.persist_failures += 1;
                None
            }
        };

        self.summary.pages_fetched += 1;
        self.summary.pages.push(PageRecord {
            url: page.url.to_string(),
            title: page.title.clone(),
            logical_path: page.logical_path.clone(),
            file,
        });

        let outcome = self
            .frontier
            .enqueue_discovered(&final_url, &content.links, &self.scope);
        self.summary.record_links(&outcome);

        Some(page)
    }
}

/// Validates the configuration and derives the seed target and scope rule
fn session_scope(config: &Config) -> crate::Result<(CrawlTarget, ScopeRule)> {
    validate(config)?;

    let seed = CrawlTarget::parse(&config.scope.seed_url)?;
    let scope = ScopeRule::from_seed(
        &seed.url,
        config.scope.subdomain_policy,
        config.scope.path_prefix.as_deref(),
    )?;
    Ok((seed, scope))
}

/// Body of one fetch task: a single fetch attempt, then extraction
///
/// Links are resolved against the URL the fetch ended on.
async fn fetch_and_extract(
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<ContentExtractor>,
    target: CrawlTarget,
) -> TaskOutcome {
    match fetcher.fetch(&target.url).await {
        FetchResult::Success {
            final_url, body, ..
        } => {
            let content = extractor.extract(&body, &final_url);
            TaskOutcome::Fetched {
                target,
                final_url,
                content,
            }
        }
        failure => TaskOutcome::Failed {
            reason: failure.failure_reason().unwrap_or_default(),
            target,
        },
    }
}
