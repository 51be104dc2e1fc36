//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use site_audit::config::{Config, CrawlOptions, CrawlOptionsInput};
use site_audit::crawler::{crawl_site, generate_sitemap, CrawlJob, CrawlResult};
use site_audit::output::IssueKind;
use site_audit::AuditError;
use std::collections::HashSet;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Serves `body` as an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw(body.as_bytes(), "text/html; charset=utf-8"),
        )
        .mount(server)
        .await;
}

/// Asserts that `route` is never requested during the test
async fn mount_forbidden(server: &MockServer, route: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).insert_header("content-type", "text/html"))
        .expect(0)
        .mount(server)
        .await;
}

fn page(title: &str, body: &str) -> String {
    format!(
        r#"<html><head><title>{}</title></head><body>{}</body></html>"#,
        title, body
    )
}

fn analysis_options(max_depth: i64, max_urls: i64) -> CrawlOptions {
    CrawlOptions::for_analysis(CrawlOptionsInput {
        max_depth: Some(max_depth),
        max_urls: Some(max_urls),
        ..Default::default()
    })
}

/// Relative paths of every URL in pages and errors
fn crawled_paths(result: &CrawlResult) -> Vec<String> {
    let pages = result.pages.iter().map(|p| p.url().to_string());
    let errors = result.errors.iter().map(|e| e.url.clone());
    pages
        .chain(errors)
        .map(|u| url::Url::parse(&u).unwrap().path().to_string())
        .collect()
}

#[tokio::test]
async fn test_depth_bounded_crawl_scenario() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &page("Home", r#"<a href="/a">A</a><a href="/b">B</a>"#),
    )
    .await;
    mount_page(&server, "/a", &page("A", r#"<a href="/c">C</a>"#)).await;
    mount_page(
        &server,
        "/b",
        &page("B", r#"<a href="http://other.test/">Elsewhere</a>"#),
    )
    .await;
    mount_forbidden(&server, "/c").await;

    let result = crawl_site(&server.uri(), analysis_options(1, 20), &Config::default())
        .await
        .expect("crawl failed");

    assert!(result.errors.is_empty(), "errors: {:?}", result.errors);
    let found: Vec<(String, u32)> = result
        .pages
        .iter()
        .map(|p| {
            let path = url::Url::parse(p.url()).unwrap().path().to_string();
            (path, p.crawl_depth())
        })
        .collect();
    assert_eq!(
        found,
        vec![
            ("/".to_string(), 0),
            ("/a".to_string(), 1),
            ("/b".to_string(), 1)
        ]
    );

    let home = result.pages[0].as_analysis().unwrap();
    assert_eq!(home.title, "Home");
    assert_eq!(home.internal_links_count, 2);

    let b = result.pages[2].as_analysis().unwrap();
    assert_eq!(b.external_links_count, 1);
    assert_eq!(b.external_links[0].url, "http://other.test/");
    assert_eq!(result.summary.max_depth, 1);
}

#[tokio::test]
async fn test_robots_txt_respect() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        &page(
            "Home",
            r#"<a href="/private/report">Private</a><a href="/public">Public</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/public", &page("Public", "")).await;
    mount_forbidden(&server, "/private/report").await;

    let result = crawl_site(&server.uri(), analysis_options(3, 20), &Config::default())
        .await
        .expect("crawl failed");

    let paths = crawled_paths(&result);
    assert!(paths.iter().all(|p| !p.starts_with("/private")), "{:?}", paths);
    assert!(paths.contains(&"/public".to_string()));
}

#[tokio::test]
async fn test_ignoring_robots_txt() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"))
        .expect(0)
        .mount(&server)
        .await;
    mount_page(&server, "/", &page("Home", r#"<a href="/private">P</a>"#)).await;
    mount_page(&server, "/private", &page("Private", "")).await;

    let options = CrawlOptions::for_analysis(CrawlOptionsInput {
        follow_robots_txt: Some(false),
        ..Default::default()
    });
    let result = crawl_site(&server.uri(), options, &Config::default())
        .await
        .expect("crawl failed");

    assert_eq!(crawled_paths(&result), vec!["/", "/private"]);
}

#[tokio::test]
async fn test_max_urls_bounds_pages_and_errors() {
    let server = MockServer::start().await;

    let links: String = (0..10)
        .map(|i| format!(r#"<a href="/p{}">{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &page("Home", &links)).await;
    for i in 0..10 {
        let route = format!("/p{}", i);
        if i % 2 == 0 {
            mount_page(&server, &route, &page(&route, "")).await;
        } else {
            Mock::given(method("GET"))
                .and(path(route.as_str()))
                .respond_with(ResponseTemplate::new(404))
                .mount(&server)
                .await;
        }
    }

    let result = crawl_site(&server.uri(), analysis_options(2, 4), &Config::default())
        .await
        .expect("crawl failed");

    assert_eq!(result.pages.len() + result.errors.len(), 4);
    // Slots go to links in document order: pages first, then errors
    assert_eq!(crawled_paths(&result), vec!["/", "/p0", "/p2", "/p1"]);
    assert_eq!(result.errors[0].status_code, Some(404));
}

#[tokio::test]
async fn test_failed_page_does_not_abort_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &page("Home", r#"<a href="/broken">x</a><a href="/ok">y</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    mount_page(&server, "/ok", &page("Ok", r#"<a href="/deeper">z</a>"#)).await;
    mount_page(&server, "/deeper", &page("Deeper", "")).await;

    let result = crawl_site(&server.uri(), analysis_options(2, 20), &Config::default())
        .await
        .expect("crawl failed");

    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert!(error.url.ends_with("/broken"));
    assert_eq!(error.status_code, Some(500));
    assert_eq!(error.error, "Request failed with status code 500");

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.summary.total_errors, 1);
    assert_eq!(result.summary.issues.critical[0].kind, IssueKind::CrawlErrors);
}

#[tokio::test]
async fn test_no_duplicate_visits_in_link_cycle() {
    let server = MockServer::start().await;

    let nav = r#"<a href="/">Home</a><a href="/a">A</a><a href="/b">B</a><a href="/a?utm_source=nav#top">A again</a>"#;
    for route in ["/", "/a", "/b"] {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(page(route, nav).into_bytes(), "text/html"),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let result = crawl_site(&server.uri(), analysis_options(5, 50), &Config::default())
        .await
        .expect("crawl failed");

    let urls: Vec<&str> = result.pages.iter().map(|p| p.url()).collect();
    let unique: HashSet<&str> = urls.iter().copied().collect();
    assert_eq!(urls.len(), 3);
    assert_eq!(unique.len(), 3);
}

#[tokio::test]
async fn test_slow_page_times_out_without_stopping_crawl() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &page("Home", r#"<a href="/slow">slow</a><a href="/fast">fast</a>"#),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(page("Slow", "").into_bytes(), "text/html")
                .set_delay(Duration::from_secs(3)),
        )
        .mount(&server)
        .await;
    mount_page(&server, "/fast", &page("Fast", "")).await;

    let mut config = Config::default();
    config.crawler.request_timeout_secs = 1;
    let result = crawl_site(&server.uri(), analysis_options(2, 20), &config)
        .await
        .expect("crawl failed");

    assert_eq!(result.errors.len(), 1);
    let error = &result.errors[0];
    assert!(error.url.ends_with("/slow"));
    assert_eq!(error.error, "Request timeout");
    assert_eq!(error.status_code, None);

    let analyzed: Vec<String> = result
        .pages
        .iter()
        .filter_map(|p| p.as_analysis())
        .map(|p| p.title.clone())
        .collect();
    assert_eq!(analyzed, vec!["Home", "Fast"]);
}

#[tokio::test]
async fn test_query_variants_are_distinct_pages() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &page(
            "Home",
            r#"<a href="/docs?source=guide">guide</a><a href="/docs?source=api&amp;utm_medium=nav">api</a><a href="/docs?q=a%20b">search</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/docs", &page("Docs", "")).await;

    let result = crawl_site(&server.uri(), analysis_options(1, 20), &Config::default())
        .await
        .expect("crawl failed");

    let urls: Vec<String> = result
        .pages
        .iter()
        .skip(1)
        .map(|p| {
            let url = url::Url::parse(p.url()).unwrap();
            format!("{}?{}", url.path(), url.query().unwrap_or(""))
        })
        .collect();
    assert_eq!(
        urls,
        vec!["/docs?source=guide", "/docs?source=api", "/docs?q=a%20b"]
    );
}

#[tokio::test]
async fn test_non_html_pages_are_discarded() {
    let server = MockServer::start().await;

    mount_page(&server, "/", &page("Home", r#"<a href="/feed">feed</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/feed"))
        .respond_with(
            ResponseTemplate::new(200).set_body_raw("{}".as_bytes(), "application/json"),
        )
        .mount(&server)
        .await;

    let result = crawl_site(&server.uri(), analysis_options(2, 20), &Config::default())
        .await
        .expect("crawl failed");

    assert_eq!(crawled_paths(&result), vec!["/"]);
}

#[tokio::test]
async fn test_heading_issues_scenario() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &page("Home", r#"<h1>First</h1><h1>Second</h1><a href="/a">A</a>"#),
    )
    .await;
    mount_page(&server, "/a", &page("A", "<p>No headings here.</p>")).await;

    let result = crawl_site(&server.uri(), analysis_options(1, 20), &Config::default())
        .await
        .expect("crawl failed");

    let summary = &result.summary;
    assert_eq!(summary.pages_with_multiple_h1, 1);
    assert_eq!(summary.pages_without_h1, 1);
    assert!(summary
        .issues
        .minor
        .iter()
        .any(|i| i.kind == IssueKind::MultipleH1));
    assert!(summary
        .issues
        .major
        .iter()
        .any(|i| i.kind == IssueKind::MissingH1));
}

#[tokio::test]
async fn test_redirected_page_keeps_requested_url() {
    let server = MockServer::start().await;

    mount_page(&server, "/", &page("Home", r#"<a href="/old">old</a>"#)).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(301).insert_header("location", "/new/"))
        .mount(&server)
        .await;
    mount_page(&server, "/new/", &page("New", r#"<a href="child">child</a>"#)).await;
    mount_page(&server, "/new/child", &page("Child", "")).await;

    let result = crawl_site(&server.uri(), analysis_options(2, 20), &Config::default())
        .await
        .expect("crawl failed");

    // Links on the redirected page resolve against its final URL
    assert_eq!(crawled_paths(&result), vec!["/", "/old", "/new/child"]);
}

#[tokio::test]
async fn test_sitemap_lists_every_crawled_page() {
    let server = MockServer::start().await;

    mount_page(
        &server,
        "/",
        &page(
            "Home",
            r#"<a href="/blog/post">Post</a><a href="/missing">Missing</a>"#,
        ),
    )
    .await;
    mount_page(&server, "/blog/post", &page("Post", "")).await;

    let options = CrawlOptions::for_sitemap(CrawlOptionsInput::default());
    let output = generate_sitemap(&server.uri(), options, &Config::default())
        .await
        .expect("sitemap crawl failed");

    assert_eq!(output.stats.total_urls, 2);
    assert_eq!(output.stats.errors, 1);
    assert_eq!(output.sitemap.matches("<loc>").count(), 2);
    assert!(output.sitemap.contains("/blog/post</loc>"));
    assert!(output.sitemap.contains("<changefreq>weekly</changefreq>"));
    assert!(!output.sitemap.contains("/missing"));
}

#[tokio::test]
async fn test_result_serializes_with_camel_case_keys() {
    let server = MockServer::start().await;
    mount_page(&server, "/", &page("Home", "")).await;

    let base = server.uri();
    let result = crawl_site(&base, analysis_options(1, 5), &Config::default())
        .await
        .expect("crawl failed");
    let value = serde_json::to_value(&result).unwrap();

    assert_eq!(value["baseUrl"], base.as_str());
    assert_eq!(value["crawledPages"][0]["crawlDepth"], 0);
    assert!(value["errors"].as_array().unwrap().is_empty());
    assert_eq!(value["summary"]["totalPages"], 1);
    assert_eq!(value["summary"]["options"]["maxDepth"], 1);
}

#[tokio::test]
async fn test_invalid_base_url_is_rejected_before_crawling() {
    let options = CrawlOptions::default();
    for input in ["", "example", "javascript:alert(1)", "ftp://example.com/"] {
        let err = crawl_site(input, options.clone(), &Config::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AuditError::InvalidBaseUrl(_)), "{}", input);
    }
    assert!(CrawlJob::new("https://example.com", options, &Config::default()).is_ok());
}
