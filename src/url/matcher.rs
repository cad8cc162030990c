use crate::url::SubdomainPolicy;

/// Checks if a host is admitted by the allowed host under a subdomain policy
///
/// 1. `Exact`: "a.b" matches only "a.b"
/// 2. `SuffixMatch`: "a.b" matches:
///    - "a.b" (the bare host)
///    - "sub.a.b" (single subdomain)
///    - "x.y.a.b" (nested subdomains)
///
/// Both sides are expected to be lowercase already.
///
/// # Examples
///
/// ```
/// use scopecrawl::url::{matches_host, SubdomainPolicy};
///
/// assert!(matches_host("a.b", "a.b", SubdomainPolicy::Exact));
/// assert!(!matches_host("a.b", "sub.a.b", SubdomainPolicy::Exact));
/// assert!(matches_host("a.b", "sub.a.b", SubdomainPolicy::SuffixMatch));
/// assert!(!matches_host("a.b", "xa.b", SubdomainPolicy::SuffixMatch));
/// ```
pub fn matches_host(allowed: &str, candidate: &str, policy: SubdomainPolicy) -> bool {
    match policy {
        SubdomainPolicy::Exact => candidate == allowed,
        SubdomainPolicy::SuffixMatch => {
            candidate == allowed
                || (!allowed.is_empty()
                    && candidate.len() > allowed.len()
                    && candidate.ends_with(allowed)
                    && candidate.as_bytes()[candidate.len() - allowed.len() - 1] == b'.')
        }
    }
}

/// Checks if a path lies under a prefix, comparing on segment boundaries
///
/// `prefix` is stored without a trailing slash; the empty prefix admits
/// every path. `/docs` admits `/docs`, `/docs/` and `/docs/x`, but not the
/// sibling `/docsx`.
///
/// # Examples
///
/// ```
/// use scopecrawl::url::matches_path_prefix;
///
/// assert!(matches_path_prefix("/docs", "/docs/x"));
/// assert!(matches_path_prefix("/docs", "/docs"));
/// assert!(!matches_path_prefix("/docs", "/docsx"));
/// ```
pub fn matches_path_prefix(prefix: &str, path: &str) -> bool {
    if prefix.is_empty() {
        return true;
    }

    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Checks if `path` is a strict descendant of `parent` (segment-aware)
///
/// Used to classify child links of a page for fan-out limiting.
pub fn is_descendant_path(parent: &str, path: &str) -> bool {
    let parent = parent.trim_end_matches('/');
    match path.strip_prefix(parent) {
        Some(rest) => rest.starts_with('/') && !rest.trim_matches('/').is_empty(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(matches_host("example.com", "example.com", SubdomainPolicy::Exact));
        assert!(matches_host(
            "blog.example.com",
            "blog.example.com",
            SubdomainPolicy::Exact
        ));
    }

    #[test]
    fn test_exact_no_match() {
        assert!(!matches_host("example.com", "other.com", SubdomainPolicy::Exact));
        assert!(!matches_host("example.com", "blog.example.com", SubdomainPolicy::Exact));
        assert!(!matches_host("blog.example.com", "example.com", SubdomainPolicy::Exact));
    }

    #[test]
    fn test_suffix_matches_bare_and_nested() {
        let policy = SubdomainPolicy::SuffixMatch;
        assert!(matches_host("example.com", "example.com", policy));
        assert!(matches_host("example.com", "api.example.com", policy));
        assert!(matches_host("example.com", "deep.nested.sub.example.com", policy));
    }

    #[test]
    fn test_suffix_no_match_partial_label() {
        let policy = SubdomainPolicy::SuffixMatch;
        assert!(!matches_host("example.com", "myexample.com", policy));
        assert!(!matches_host("example.com", "example.com.org", policy));
        assert!(!matches_host("example.com", "", policy));
    }

    #[test]
    fn test_path_prefix_segment_boundary() {
        assert!(matches_path_prefix("/docs", "/docs"));
        assert!(matches_path_prefix("/docs", "/docs/"));
        assert!(matches_path_prefix("/docs", "/docs/x/y"));
        assert!(!matches_path_prefix("/docs", "/docsx"));
        assert!(!matches_path_prefix("/docs", "/doc"));
        assert!(!matches_path_prefix("/docs", "/other/docs"));
    }

    #[test]
    fn test_empty_prefix_admits_everything() {
        assert!(matches_path_prefix("", "/"));
        assert!(matches_path_prefix("", "/anything/at/all"));
    }

    #[test]
    fn test_descendant_path() {
        assert!(is_descendant_path("/docs", "/docs/a"));
        assert!(is_descendant_path("/docs/", "/docs/a/b"));
        assert!(!is_descendant_path("/docs", "/docs"));
        assert!(!is_descendant_path("/docs", "/docs/"));
        assert!(!is_descendant_path("/docs", "/docsx/a"));
        assert!(!is_descendant_path("/docs/a", "/docs/b"));
    }

    #[test]
    fn test_descendant_of_root() {
        assert!(is_descendant_path("/", "/a"));
        assert!(!is_descendant_path("/", "/"));
    }
}
