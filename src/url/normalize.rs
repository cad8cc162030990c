use crate::UrlError;
use url::Url;

/// Parses and normalizes a URL into a fetchable crawl target URL
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only HTTP and HTTPS schemes
/// 3. Require a host
/// 4. Remove fragment (everything after #)
///
/// Host lowercasing, default-port removal and dot-segment resolution are
/// already performed by the `url` parser. The query string is kept so the
/// page is fetched exactly as it was linked.
///
/// # Examples
///
/// ```
/// use scopecrawl::url::normalize_url;
///
/// let url = normalize_url("https://X.TEST/docs#intro").unwrap();
/// assert_eq!(url.as_str(), "https://x.test/docs");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize_parsed(url)
}

/// Normalizes an already parsed URL (see [`normalize_url`])
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    url.set_fragment(None);
    Ok(url)
}

/// Computes the identity key of a URL
///
/// Two URLs with the same identity are the same page for deduplication:
/// scheme, lowercase host, explicit port and normalized path. Query and
/// fragment are not part of the identity.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use scopecrawl::url::identity_key;
///
/// let a = Url::parse("https://x.test/docs/").unwrap();
/// let b = Url::parse("https://x.test/docs#frag").unwrap();
/// assert_eq!(identity_key(&a), identity_key(&b));
/// ```
pub fn identity_key(url: &Url) -> String {
    let host = url.host_str().unwrap_or_default().to_lowercase();
    let path = normalize_path(url.path());

    match url.port() {
        Some(port) => format!("{}://{}:{}{}", url.scheme(), host, port, path),
        None => format!("{}://{}{}", url.scheme(), host, path),
    }
}

/// Normalizes a URL path by removing dot segments, repeated and trailing slashes
pub(crate) fn normalize_path(path: &str) -> String {
    let mut normalized_segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                normalized_segments.pop();
            }
            _ => normalized_segments.push(segment),
        }
    }

    if normalized_segments.is_empty() {
        return "/".to_string();
    }

    format!("/{}", normalized_segments.join("/"))
}
