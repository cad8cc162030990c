//! URL handling module for Scopecrawl
//!
//! This module provides URL normalization, page identity, host and path
//! matching, and the scope rule that restricts which links are followed.

mod matcher;
mod normalize;
mod scope;

pub use matcher::{is_descendant_path, matches_host, matches_path_prefix};
pub use normalize::{identity_key, normalize_parsed, normalize_url};
pub use scope::{is_in_scope, ScopeRule, SubdomainPolicy};

use std::fmt;
use url::Url;

/// An absolute URL requested for fetch, paired with its identity key
///
/// The URL keeps its query string but never a fragment. Two targets with
/// the same identity are the same page for the visited set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    /// The URL to fetch
    pub url: Url,

    /// Normalized identity (scheme + host + port + path)
    pub identity: String,
}

impl CrawlTarget {
    /// Creates a target from a URL, dropping its fragment
    pub fn new(mut url: Url) -> Self {
        url.set_fragment(None);
        let identity = identity_key(&url);
        Self { url, identity }
    }

    /// Parses and normalizes a URL string into a target
    pub fn parse(url_str: &str) -> crate::UrlResult<Self> {
        normalize_url(url_str).map(Self::new)
    }
}

impl fmt::Display for CrawlTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.url)
    }
}
