//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end, with pages written to temp directories.

use scopecrawl::config::Config;
use scopecrawl::crawler::Coordinator;
use scopecrawl::{crawl, SubdomainPolicy};
use std::path::Path;
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration seeded at `<server>/docs`
fn create_test_config(base_url: &str, budget: usize, output_root: &Path) -> Config {
    let mut config = Config::for_seed(format!("{}/docs", base_url));
    config.crawler.page_budget = budget;
    config.crawler.request_timeout_secs = 5;
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.output_root = output_root.display().to_string();
    config
}

fn html(title: &str, body: &str) -> String {
    format!(
        "<html><head><title>{}</title></head><body><nav>menu</nav><main>{}</main></body></html>",
        title, body
    )
}

async fn mount_page(server: &MockServer, page_path: &str, body: String, expected_hits: u64) {
    Mock::given(method("GET"))
        .and(path(page_path))
        .respond_with(ResponseTemplate::new(200).set_body_raw(body, "text/html"))
        .expect(expected_hits)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_budget_fragment_and_out_of_scope() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/docs",
        html(
            "Docs",
            &format!(
                r##"Welcome.
                <a href="/docs/a">A</a>
                <a href="{}/y">Elsewhere</a>
                <a href="/docs#frag">Jump</a>
                <a href="/docs/b">B</a>"##,
                other_server.uri()
            ),
        ),
        1,
    )
    .await;
    mount_page(&mock_server, "/docs/a", html("A", "Page A text"), 1).await;
    mount_page(&mock_server, "/docs/b", html("B", "Page B text"), 0).await;
    mount_page(&other_server, "/y", html("Y", "never"), 0).await;

    let config = create_test_config(&mock_server.uri(), 2, output.path());
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages.len(), 2);
    assert_eq!(report.summary.pages_fetched, 2);
    assert_eq!(report.summary.links_out_of_scope, 1);
    assert!(report.failures().is_empty());

    let index = std::fs::read_to_string(output.path().join("index.txt")).unwrap();
    assert!(index.starts_with("Welcome."));
    assert!(!index.contains("menu"));
    assert_eq!(
        std::fs::read_to_string(output.path().join("a.txt")).unwrap(),
        "Page A text"
    );
    assert!(!output.path().join("b.txt").exists());
}

#[tokio::test]
async fn test_failed_fetch_is_not_counted() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/docs",
        html("Docs", r#"<a href="/docs/a">A</a> <a href="/docs/b">B</a>"#),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/a"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/docs/b", html("B", "Page B text"), 1).await;

    let config = create_test_config(&mock_server.uri(), 2, output.path());
    let report = crawl(config).await.expect("crawl failed");

    let paths: Vec<&str> = report.pages.iter().map(|p| p.logical_path.as_str()).collect();
    assert_eq!(paths, vec!["index", "b"]);
    assert_eq!(report.failures().len(), 1);
    assert!(report.failures()[0].url.ends_with("/docs/a"));
    assert_eq!(report.failures()[0].reason, "HTTP 500");
    assert!(!output.path().join("a.txt").exists());
}

#[tokio::test]
async fn test_non_html_is_a_failure() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/docs",
        html("Docs", r#"<a href="/docs/manual.pdf">PDF</a>"#),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/manual.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0u8; 16], "application/pdf"))
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server.uri(), 10, output.path());
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.failures().len(), 1);
    assert!(report.failures()[0].reason.contains("application/pdf"));
}

#[tokio::test]
async fn test_fan_out_limit_prefers_children() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let mut links = String::new();
    for i in 1..=5 {
        links.push_str(&format!(r#"<a href="/blog/s{}">sibling</a>"#, i));
        links.push_str(&format!(r#"<a href="/docs/c{}">child</a>"#, i));
    }
    mount_page(&mock_server, "/docs", html("Docs", &links), 1).await;

    for i in 1..=5 {
        let expected = if i <= 3 { 1 } else { 0 };
        mount_page(&mock_server, &format!("/docs/c{}", i), html("Child", "child"), expected).await;
        mount_page(&mock_server, &format!("/blog/s{}", i), html("Sibling", "sibling"), 0).await;
    }

    let mut config = create_test_config(&mock_server.uri(), 100, output.path());
    config.crawler.fan_out_limit = Some(3);
    config.scope.path_prefix = Some("/".to_string());
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages.len(), 4);
    assert_eq!(report.summary.links_queued, 3);
    assert_eq!(report.summary.links_over_fan_out, 7);
    assert!(output.path().join("docs/c3.txt").exists());
}

#[tokio::test]
async fn test_redirect_out_of_scope_is_not_followed() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/docs",
        html("Docs", r#"<a href="/docs/a">A</a> <a href="/docs/b">B</a>"#),
        1,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/docs/a"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("Location", format!("{}/y", other_server.uri()).as_str()),
        )
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/b"))
        .respond_with(ResponseTemplate::new(301).insert_header("Location", "/docs/moved"))
        .expect(1)
        .mount(&mock_server)
        .await;
    mount_page(&mock_server, "/docs/moved", html("Moved", "moved text"), 1).await;
    mount_page(&other_server, "/y", html("Y", "off-scope text"), 0).await;

    let config = create_test_config(&mock_server.uri(), 5, output.path());
    let report = crawl(config).await.expect("crawl failed");

    let paths: Vec<&str> = report.pages.iter().map(|p| p.logical_path.as_str()).collect();
    assert_eq!(paths, vec!["index", "b"]);
    assert_eq!(report.summary.pages_fetched, 2);

    assert_eq!(report.failures().len(), 1);
    assert!(report.failures()[0].url.ends_with("/docs/a"));
    assert!(report.failures()[0].reason.starts_with("Redirected out of scope"));

    assert!(!output.path().join("a.txt").exists());
    assert_eq!(
        std::fs::read_to_string(output.path().join("b.txt")).unwrap(),
        "moved text"
    );
}

#[tokio::test]
async fn test_subdomain_policy_does_not_admit_other_port() {
    let mock_server = MockServer::start().await;
    let other_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    mount_page(
        &mock_server,
        "/docs",
        html("Docs", &format!(r#"<a href="{}/docs/x">X</a>"#, other_server.uri())),
        1,
    )
    .await;
    mount_page(&other_server, "/docs/x", html("X", "x"), 0).await;

    let mut config = create_test_config(&mock_server.uri(), 10, output.path());
    config.scope.subdomain_policy = SubdomainPolicy::SuffixMatch;
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages.len(), 1);
    assert_eq!(report.summary.links_out_of_scope, 1);
}

#[tokio::test]
async fn test_concurrent_crawl_respects_budget() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();

    let links: String = (0..30)
        .map(|i| format!(r#"<a href="/docs/p{}">p{}</a>"#, i, i))
        .collect();
    mount_page(&mock_server, "/docs", html("Docs", &links), 1).await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html("P", "child page"), "text/html"))
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server.uri(), 8, output.path());
    config.crawler.concurrency = 4;
    let report = crawl(config).await.expect("crawl failed");

    assert_eq!(report.pages.len(), 8);
    let requests = mock_server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 8);
}

#[tokio::test]
async fn test_manifest_written_and_hash_recorded() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let manifest = output.path().join("SUMMARY.md");

    mount_page(&mock_server, "/docs", html("Docs Home", "hello"), 1).await;

    let mut config = create_test_config(&mock_server.uri(), 5, output.path());
    config.output.summary_path = Some(manifest.display().to_string());

    let report = Coordinator::from_config(&config)
        .unwrap()
        .with_config_hash("feedface")
        .run()
        .await
        .expect("crawl failed");
    assert_eq!(report.summary.config_hash.as_deref(), Some("feedface"));

    let markdown = std::fs::read_to_string(&manifest).unwrap();
    assert!(markdown.contains("# Scopecrawl Session Summary"));
    assert!(markdown.contains("- **Config Hash**: feedface"));
    assert!(markdown.contains("| Docs Home |"));
}

#[tokio::test]
async fn test_unwritable_output_root_fails_before_fetch() {
    let mock_server = MockServer::start().await;
    let output = TempDir::new().unwrap();
    let blocked = output.path().join("blocked");
    std::fs::write(&blocked, "a file, not a directory").unwrap();

    mount_page(&mock_server, "/docs", html("Docs", "hello"), 0).await;

    let config = create_test_config(&mock_server.uri(), 5, &blocked);
    let result = crawl(config).await;

    assert!(matches!(result, Err(scopecrawl::CrawlError::Output(_))));
}
