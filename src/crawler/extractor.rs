//! HTML content extraction
//!
//! This module turns a fetched HTML body into:
//! - The page title (from the `<title>` tag)
//! - Plain text from the first matching content container, wrapped at 80 columns
//! - Every hyperlink on the page, resolved to an absolute URL, in document order
//!
//! Text inside `<script>`, `<style>`, `<noscript>` and `<template>` never
//! reaches the output.

use scraper::node::Node;
use scraper::{ElementRef, Html, Selector};
use thiserror::Error;
use url::Url;

/// Column width used for wrapping extracted text
pub const WRAP_WIDTH: usize = 80;

/// Content containers tried in order; the first one present wins
pub const DEFAULT_CONTAINERS: &[&str] = &["main", "article", "div.content", "body"];

const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Errors raised while building an extractor
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("Invalid container selector '{selector}': {reason}")]
    InvalidSelector { selector: String, reason: String },
}

/// Everything pulled out of one HTML page
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExtractedContent {
    /// The page title (from `<title>`), trimmed
    pub title: Option<String>,

    /// Normalized, wrapped text of the selected container
    pub text: String,

    /// Absolute http(s) links in document order, duplicates included
    pub links: Vec<Url>,
}

#[derive(Debug, Clone)]
struct Container {
    css: String,
    selector: Selector,
}

impl Container {
    fn parse(css: &str) -> Result<Self, ExtractError> {
        let selector = Selector::parse(css).map_err(|e| ExtractError::InvalidSelector {
            selector: css.to_string(),
            reason: format!("{:?}", e),
        })?;

        Ok(Self {
            css: css.to_string(),
            selector,
        })
    }
}

/// Converts page bodies into text and links
///
/// Holds an ordered list of container selectors. The list can be extended
/// with [`ContentExtractor::with_container`] for site shapes the defaults
/// miss; new selectors are tried before the `body` fallback.
///
/// # Example
///
/// ```
/// use scopecrawl::crawler::ContentExtractor;
/// use url::Url;
///
/// let extractor = ContentExtractor::new();
/// let page = Url::parse("https://x.test/docs").unwrap();
/// let html = r#"<main>hello <script>evil()</script> world <a href="a">A</a></main>"#;
///
/// let content = extractor.extract(html, &page);
/// assert_eq!(content.text, "hello world A");
/// assert_eq!(content.links[0].as_str(), "https://x.test/a");
/// ```
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    containers: Vec<Container>,
    wrap_width: usize,
    title_selector: Option<Selector>,
    link_selector: Option<Selector>,
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl ContentExtractor {
    /// Creates an extractor with the default container chain
    pub fn new() -> Self {
        Self {
            containers: DEFAULT_CONTAINERS
                .iter()
                .filter_map(|css| Container::parse(css).ok())
                .collect(),
            wrap_width: WRAP_WIDTH,
            title_selector: Selector::parse("title").ok(),
            link_selector: Selector::parse("a[href]").ok(),
        }
    }

    /// Builds an extractor from an explicit, ordered container list
    pub fn from_selectors<I, S>(selectors: I) -> Result<Self, ExtractError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let containers = selectors
            .into_iter()
            .map(|css| Container::parse(css.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            containers,
            ..Self::new()
        })
    }

    /// Adds a container selector ahead of the `body` fallback
    pub fn with_container(mut self, css: &str) -> Result<Self, ExtractError> {
        let container = Container::parse(css)?;
        let position = match self.containers.last() {
            Some(last) if last.css == "body" => self.containers.len() - 1,
            _ => self.containers.len(),
        };
        self.containers.insert(position, container);
        Ok(self)
    }

    /// Overrides the wrap column (0 disables wrapping)
    pub fn with_wrap_width(mut self, width: usize) -> Self {
        self.wrap_width = width;
        self
    }

    /// The container selectors in the order they are tried
    pub fn containers(&self) -> impl Iterator<Item = &str> {
        self.containers.iter().map(|c| c.css.as_str())
    }

    /// Extracts title, text and links from an HTML body
    ///
    /// Never fails: markup without any matching container yields empty text,
    /// and links are still collected from the whole document.
    pub fn extract(&self, html: &str, page_url: &Url) -> ExtractedContent {
        let document = Html::parse_document(html);

        ExtractedContent {
            title: self.extract_title(&document),
            text: self.extract_text(&document),
            links: self.extract_links(&document, page_url),
        }
    }

    fn extract_title(&self, document: &Html) -> Option<String> {
        let selector = self.title_selector.as_ref()?;

        document
            .select(selector)
            .next()
            .map(|element| normalize_whitespace(&element.text().collect::<String>()))
            .filter(|s| !s.is_empty())
    }

    fn extract_text(&self, document: &Html) -> String {
        let container = self
            .containers
            .iter()
            .find_map(|c| document.select(&c.selector).next());

        match container {
            Some(element) => wrap_text(&normalize_whitespace(&collect_text(element)), self.wrap_width),
            None => String::new(),
        }
    }

    fn extract_links(&self, document: &Html, base_url: &Url) -> Vec<Url> {
        let Some(selector) = &self.link_selector else {
            return Vec::new();
        };

        document
            .select(selector)
            .filter_map(|element| element.value().attr("href"))
            .filter_map(|href| resolve_link(href, base_url))
            .collect()
    }
}

/// Joins every visible text node under `root` with single spaces
fn collect_text(root: ElementRef<'_>) -> String {
    let mut text = String::new();

    for node in root.descendants() {
        let Node::Text(chunk) = node.value() else {
            continue;
        };

        let hidden = node
            .ancestors()
            .take_while(|ancestor| ancestor.id() != root.id())
            .filter_map(ElementRef::wrap)
            .chain(std::iter::once(root))
            .any(|element| SKIPPED_ELEMENTS.contains(&element.value().name()));

        if !hidden {
            text.push(' ');
            text.push_str(chunk);
        }
    }

    text
}

/// Resolves an href against the page URL, keeping only http(s) results
///
/// Relative, protocol-relative, query-only and fragment-only references all
/// resolve through standard URL joining.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let absolute = base_url.join(href).ok()?;
    match absolute.scheme() {
        "http" | "https" => Some(absolute),
        _ => None,
    }
}

/// Collapses every run of whitespace (newlines included) into one space
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Greedy line wrap at `width` columns
///
/// Words are never reordered or altered; a word longer than the width is
/// split into width-sized pieces. Input is expected to be whitespace
/// normalized, which makes the output stable under re-wrapping.
pub fn wrap_text(text: &str, width: usize) -> String {
    if width == 0 {
        return normalize_whitespace(text);
    }

    let mut lines: Vec<String> = Vec::new();
    let mut line = String::new();
    let mut line_len = 0;

    for word in text.split_whitespace() {
        let mut rest = word;

        while !rest.is_empty() {
            let rest_len = rest.chars().count();

            if line_len == 0 {
                if rest_len <= width {
                    line.push_str(rest);
                    line_len = rest_len;
                    break;
                }

                let split = rest
                    .char_indices()
                    .nth(width)
                    .map_or(rest.len(), |(index, _)| index);
                lines.push(rest[..split].to_string());
                rest = &rest[split..];
                continue;
            }

            if line_len + 1 + rest_len <= width {
                line.push(' ');
                line.push_str(rest);
                line_len += 1 + rest_len;
                break;
            }

            lines.push(std::mem::take(&mut line));
            line_len = 0;
        }
    }

    if !line.is_empty() {
        lines.push(line);
    }

    lines.join("\n")
}
