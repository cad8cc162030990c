//! Scope rules: which discovered links a session is allowed to follow

use crate::url::matcher::{matches_host, matches_path_prefix};
use crate::UrlError;
use serde::Deserialize;
use std::borrow::Cow;
use std::fmt;
use url::Url;

/// How the scope treats subdomains of the seed host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubdomainPolicy {
    /// Host must equal the seed host
    #[default]
    Exact,
    /// Host must equal the seed host or end with "." + seed host
    SuffixMatch,
}

impl fmt::Display for SubdomainPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exact => write!(f, "exact"),
            Self::SuffixMatch => write!(f, "suffix-match"),
        }
    }
}

/// The host/path predicate of a crawl session
///
/// Computed once from the seed URL and never changed afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeRule {
    /// Lowercase host of the seed
    pub allowed_host: String,

    /// Explicit port of the seed (`None` for the scheme default)
    pub allowed_port: Option<u16>,

    /// Unescaped path prefix without trailing slash ("" admits every path)
    pub allowed_path_prefix: String,

    /// Subdomain handling
    pub subdomain_policy: SubdomainPolicy,
}

impl ScopeRule {
    /// Builds the scope of a session from its seed URL
    ///
    /// The path prefix defaults to the seed's own path; `prefix_override`
    /// replaces it (e.g. seed `/docs/intro` with prefix `/docs`).
    pub fn from_seed(
        seed: &Url,
        policy: SubdomainPolicy,
        prefix_override: Option<&str>,
    ) -> Result<Self, UrlError> {
        let host = seed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or(UrlError::MissingDomain)?;

        let prefix = match prefix_override {
            Some(prefix) => decode_path(prefix).into_owned(),
            None => decode_path(seed.path()).into_owned(),
        };

        Ok(Self {
            allowed_host: host.to_lowercase(),
            allowed_port: seed.port(),
            allowed_path_prefix: prefix.trim_end_matches('/').to_string(),
            subdomain_policy: policy,
        })
    }

    /// Derives the logical path of a page: scope-relative and filesystem-safe
    ///
    /// The prefix is stripped on a segment boundary, every segment is limited
    /// to `[A-Za-z0-9._-]`, and the empty result becomes `index`.
    ///
    /// # Examples
    ///
    /// ```
    /// use url::Url;
    /// use scopecrawl::url::{ScopeRule, SubdomainPolicy};
    ///
    /// let seed = Url::parse("https://x.test/docs").unwrap();
    /// let scope = ScopeRule::from_seed(&seed, SubdomainPolicy::Exact, None).unwrap();
    ///
    /// assert_eq!(scope.logical_path(&seed), "index");
    /// let page = Url::parse("https://x.test/docs/api/v2/").unwrap();
    /// assert_eq!(scope.logical_path(&page), "api/v2");
    /// ```
    pub fn logical_path(&self, url: &Url) -> String {
        let path = decode_path(url.path());
        let relative = if matches_path_prefix(&self.allowed_path_prefix, &path) {
            &path[self.allowed_path_prefix.len()..]
        } else {
            &path[..]
        };

        let segments: Vec<String> = relative
            .split('/')
            .filter(|segment| !segment.is_empty())
            .map(sanitize_segment)
            .collect();

        if segments.is_empty() {
            "index".to_string()
        } else {
            segments.join("/")
        }
    }
}

impl fmt::Display for ScopeRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.allowed_host)?;
        if let Some(port) = self.allowed_port {
            write!(f, ":{}", port)?;
        }
        let prefix = if self.allowed_path_prefix.is_empty() {
            "/"
        } else {
            &self.allowed_path_prefix
        };
        write!(f, "{} ({})", prefix, self.subdomain_policy)
    }
}

/// Decides whether a discovered link is eligible for enqueueing
///
/// Pure predicate: http(s) scheme, host admitted by the subdomain policy,
/// same explicit port as the seed, and path under the prefix on a segment
/// boundary. Fragments play no part in the decision.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scopecrawl::url::{is_in_scope, ScopeRule, SubdomainPolicy};
///
/// let seed = Url::parse("https://a.b/docs").unwrap();
/// let scope = ScopeRule::from_seed(&seed, SubdomainPolicy::Exact, None).unwrap();
///
/// assert!(is_in_scope(&Url::parse("https://a.b/docs/x").unwrap(), &scope));
/// assert!(!is_in_scope(&Url::parse("https://a.b/docsx").unwrap(), &scope));
/// ```
pub fn is_in_scope(candidate: &Url, scope: &ScopeRule) -> bool {
    if candidate.scheme() != "http" && candidate.scheme() != "https" {
        return false;
    }

    let host = match candidate.host_str() {
        Some(host) => host.to_lowercase(),
        None => return false,
    };

    if !matches_host(&scope.allowed_host, &host, scope.subdomain_policy) {
        return false;
    }

    if candidate.port() != scope.allowed_port {
        return false;
    }

    matches_path_prefix(&scope.allowed_path_prefix, &decode_path(candidate.path()))
}

/// Percent-decodes a path, falling back to the raw form on invalid UTF-8
fn decode_path(path: &str) -> Cow<'_, str> {
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}

fn sanitize_segment(segment: &str) -> String {
    if segment == "." || segment == ".." {
        return "_".to_string();
    }

    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(seed: &str, policy: SubdomainPolicy) -> ScopeRule {
        ScopeRule::from_seed(&Url::parse(seed).unwrap(), policy, None).unwrap()
    }

    fn in_scope(candidate: &str, scope: &ScopeRule) -> bool {
        is_in_scope(&Url::parse(candidate).unwrap(), scope)
    }

    #[test]
    fn test_from_seed_trims_trailing_slash() {
        let scope = rule("https://A.B/docs/", SubdomainPolicy::Exact);
        assert_eq!(scope.allowed_host, "a.b");
        assert_eq!(scope.allowed_path_prefix, "/docs");
        assert_eq!(scope.allowed_port, None);
    }

    #[test]
    fn test_root_seed_admits_whole_host() {
        let scope = rule("https://a.b/", SubdomainPolicy::Exact);
        assert_eq!(scope.allowed_path_prefix, "");
        assert!(in_scope("https://a.b/anything", &scope));
    }

    #[test]
    fn test_prefix_override() {
        let seed = Url::parse("https://a.b/docs/intro").unwrap();
        let scope = ScopeRule::from_seed(&seed, SubdomainPolicy::Exact, Some("/docs/")).unwrap();
        assert_eq!(scope.allowed_path_prefix, "/docs");
        assert!(in_scope("https://a.b/docs/other", &scope));
    }

    #[test]
    fn test_segment_boundary() {
        let scope = rule("https://a.b/docs", SubdomainPolicy::Exact);
        assert!(in_scope("https://a.b/docs/x", &scope));
        assert!(in_scope("https://a.b/docs", &scope));
        assert!(in_scope("https://a.b/docs/", &scope));
        assert!(!in_scope("https://a.b/docsx", &scope));
    }

    #[test]
    fn test_subdomain_policy() {
        let exact = rule("https://a.b/docs", SubdomainPolicy::Exact);
        let suffix = rule("https://a.b/docs", SubdomainPolicy::SuffixMatch);
        assert!(!in_scope("https://sub.a.b/docs/x", &exact));
        assert!(in_scope("https://sub.a.b/docs/x", &suffix));
        assert!(!in_scope("https://suba.b/docs/x", &suffix));
    }

    #[test]
    fn test_other_host_rejected() {
        let scope = rule("https://x.test/docs", SubdomainPolicy::SuffixMatch);
        assert!(!in_scope("https://other.test/y", &scope));
    }

    #[test]
    fn test_port_must_match() {
        let scope = rule("http://127.0.0.1:8080/docs", SubdomainPolicy::Exact);
        assert!(in_scope("http://127.0.0.1:8080/docs/a", &scope));
        assert!(!in_scope("http://127.0.0.1:9090/docs/a", &scope));
    }

    #[test]
    fn test_scheme_is_not_part_of_scope() {
        let scope = rule("https://a.b/docs", SubdomainPolicy::Exact);
        assert!(in_scope("http://a.b/docs/a", &scope));
        assert!(!in_scope("ftp://a.b/docs/a", &scope));
    }

    #[test]
    fn test_fragment_ignored() {
        let scope = rule("https://a.b/docs", SubdomainPolicy::Exact);
        assert!(in_scope("https://a.b/docs#section", &scope));
    }

    #[test]
    fn test_unescaped_comparison() {
        let scope = rule("https://a.b/my%20docs", SubdomainPolicy::Exact);
        assert_eq!(scope.allowed_path_prefix, "/my docs");
        assert!(in_scope("https://a.b/my%20docs/page", &scope));
    }

    #[test]
    fn test_logical_path_index() {
        let scope = rule("https://x.test/docs", SubdomainPolicy::Exact);
        assert_eq!(scope.logical_path(&Url::parse("https://x.test/docs").unwrap()), "index");
        assert_eq!(scope.logical_path(&Url::parse("https://x.test/docs/").unwrap()), "index");
    }

    #[test]
    fn test_logical_path_relative() {
        let scope = rule("https://x.test/docs", SubdomainPolicy::Exact);
        let url = Url::parse("https://x.test/docs/guide/setup?tab=1").unwrap();
        assert_eq!(scope.logical_path(&url), "guide/setup");
    }

    #[test]
    fn test_logical_path_sanitized() {
        let scope = rule("https://x.test/", SubdomainPolicy::Exact);
        let url = Url::parse("https://x.test/a%20b/c:d/e").unwrap();
        assert_eq!(scope.logical_path(&url), "a_b/c_d/e");
    }

    #[test]
    fn test_sanitize_dot_segments() {
        assert_eq!(sanitize_segment(".."), "_");
        assert_eq!(sanitize_segment("."), "_");
        assert_eq!(sanitize_segment("v1.2"), "v1.2");
    }

    #[test]
    fn test_logical_path_outside_prefix_uses_full_path() {
        let scope = rule("https://x.test/docs", SubdomainPolicy::Exact);
        let url = Url::parse("https://x.test/blog/post").unwrap();
        assert_eq!(scope.logical_path(&url), "blog/post");
    }

    #[test]
    fn test_display() {
        let scope = rule("https://x.test:8443/docs", SubdomainPolicy::SuffixMatch);
        assert_eq!(scope.to_string(), "x.test:8443/docs (suffix-match)");
    }
}
