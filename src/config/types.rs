use crate::url::SubdomainPolicy;
use serde::Deserialize;

/// Main configuration structure for a Scopecrawl session
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub crawler: CrawlerConfig,
    #[serde(rename = "user-agent", default)]
    pub user_agent: UserAgentConfig,
    pub scope: ScopeConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Builds a configuration with defaults for everything but the seed
    pub fn for_seed(seed_url: impl Into<String>) -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            user_agent: UserAgentConfig::default(),
            scope: ScopeConfig {
                seed_url: seed_url.into(),
                subdomain_policy: SubdomainPolicy::default(),
                path_prefix: None,
            },
            output: OutputConfig::default(),
        }
    }
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched successfully in one session
    #[serde(default = "default_page_budget")]
    pub page_budget: usize,

    /// Maximum number of links enqueued per source page (absent = pure FIFO)
    #[serde(default)]
    pub fan_out_limit: Option<usize>,

    /// Number of fetches in flight at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request timeout (seconds)
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,

    /// Wall-clock limit for the whole session (seconds)
    #[serde(default)]
    pub deadline_secs: Option<u64>,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            page_budget: default_page_budget(),
            fan_out_limit: None,
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout(),
            deadline_secs: None,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct UserAgentConfig {
    /// Name of the crawler
    #[serde(default = "default_crawler_name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(default = "default_crawler_version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(default)]
    pub contact_url: Option<String>,

    /// Email address for crawler-related contact
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: default_crawler_name(),
            crawler_version: default_crawler_version(),
            contact_url: None,
            contact_email: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header value
    ///
    /// Format: `CrawlerName/Version (+ContactURL; ContactEmail)`, with the
    /// parenthesized part present only when a contact is configured.
    pub fn header_value(&self) -> String {
        let base = format!("{}/{}", self.crawler_name, self.crawler_version);
        match (&self.contact_url, &self.contact_email) {
            (Some(url), Some(email)) => format!("{} (+{}; {})", base, url, email),
            (Some(url), None) => format!("{} (+{})", base, url),
            (None, Some(email)) => format!("{} ({})", base, email),
            (None, None) => base,
        }
    }
}

/// Scope configuration: where the crawl starts and what it may follow
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ScopeConfig {
    /// Absolute URL the crawl starts from
    pub seed_url: String,

    /// Whether subdomains of the seed host are in scope
    #[serde(default)]
    pub subdomain_policy: SubdomainPolicy,

    /// Path prefix override (defaults to the seed's path)
    #[serde(default)]
    pub path_prefix: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct OutputConfig {
    /// Directory receiving one text file per page
    #[serde(default = "default_output_root")]
    pub output_root: String,

    /// Path to the markdown manifest written at session end
    #[serde(default)]
    pub summary_path: Option<String>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            output_root: default_output_root(),
            summary_path: None,
        }
    }
}

fn default_page_budget() -> usize {
    120
}

fn default_concurrency() -> usize {
    1
}

fn default_request_timeout() -> u64 {
    30
}

fn default_crawler_name() -> String {
    env!("CARGO_PKG_NAME").to_string()
}

fn default_crawler_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn default_output_root() -> String {
    "./output".to_string()
}
