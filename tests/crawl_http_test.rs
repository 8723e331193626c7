//! End-to-end crawls over real HTTP against a local mockito server.

use link_warden::checker::BrokenReason;
use link_warden::{crawl_website, CrawlConfig, CrawlOptions};
use mockito::{Matcher, Mock, Server, ServerGuard};
use std::time::Duration;

fn page(links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!(r#"<a href="{href}">link</a>"#))
        .collect();
    format!(
        r#"<!DOCTYPE html>
<html>
<head><link rel="stylesheet" href="/style.css"></head>
<body>{anchors}</body>
</html>"#
    )
}

async fn html_mock(server: &mut ServerGuard, path: &str, body: &str) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "text/html; charset=utf-8")
        .with_body(body)
        .expect(1)
        .create_async()
        .await
}

async fn status_mock(server: &mut ServerGuard, path: &str, status: usize, hits: usize) -> Mock {
    server
        .mock("GET", path)
        .with_status(status)
        .with_body("status page")
        .expect(hits)
        .create_async()
        .await
}

fn config(server: &ServerGuard) -> CrawlConfig {
    let mut options = CrawlOptions::new(format!("{}/", server.url()));
    options.max_threads = 3;
    options.retry_delay = Duration::from_millis(5);
    options.timeout = Duration::from_secs(5);
    CrawlConfig::from_options(options).unwrap()
}

#[tokio::test]
async fn test_crawl_reports_broken_links_per_page() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let home = html_mock(
        &mut server,
        "/",
        &page(&["/about", "/missing", "/flaky", "mailto:team@example.com", "/guide.md"]),
    )
    .await;
    let about = html_mock(&mut server, "/about", &page(&["/missing", "/"])).await;
    let css = server
        .mock("GET", "/style.css")
        .with_status(200)
        .with_header("content-type", "text/css")
        .with_body("body {}")
        .expect(1)
        .create_async()
        .await;
    let missing = status_mock(&mut server, "/missing", 404, 1).await;
    let flaky = status_mock(&mut server, "/flaky", 503, 3).await;
    let guide_md = status_mock(&mut server, "/guide.md", 404, 1).await;
    let guide = status_mock(&mut server, "/guide", 200, 1).await;

    let report = crawl_website(config(&server)).await.unwrap();

    home.assert_async().await;
    about.assert_async().await;
    css.assert_async().await;
    missing.assert_async().await;
    flaky.assert_async().await;
    guide_md.assert_async().await;
    guide.assert_async().await;

    let home_broken: Vec<_> = report
        .broken_on(&format!("{base}/"))
        .iter()
        .map(|r| (r.broken_url.clone(), r.reason.clone()))
        .collect();
    assert_eq!(home_broken.len(), 2);
    assert!(home_broken.contains(&(format!("{base}/missing"), BrokenReason::Status(404))));
    assert!(home_broken.contains(&(format!("{base}/flaky"), BrokenReason::Status(503))));

    let about_broken = report.broken_on(&format!("{base}/about"));
    assert_eq!(about_broken.len(), 1);
    assert_eq!(about_broken[0].broken_url, format!("{base}/missing"));

    // /, /about, /style.css, /missing, /flaky, /guide.md
    assert_eq!(report.total_urls_crawled, 6);
    assert_eq!(report.external_links_found, 0);
}

#[tokio::test]
async fn test_relative_links_resolve_against_redirect_target() {
    let mut server = Server::new_async().await;
    let base = server.url();

    let _home = html_mock(&mut server, "/", &page(&["/old"])).await;
    let _css = status_mock(&mut server, "/style.css", 200, 1).await;
    let _old = server
        .mock("GET", "/old")
        .with_status(301)
        .with_header("location", "/new/")
        .create_async()
        .await;
    let _new = html_mock(&mut server, "/new/", &page(&["child"])).await;
    let child = status_mock(&mut server, "/new/child", 404, 1).await;

    let report = crawl_website(config(&server)).await.unwrap();

    child.assert_async().await;
    // Filed under the URL the page was linked as
    let broken = report.broken_on(&format!("{base}/old"));
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].broken_url, format!("{base}/new/child"));
}

#[tokio::test]
async fn test_requests_carry_user_agent() {
    let mut server = Server::new_async().await;

    let home = server
        .mock("GET", "/")
        .match_header("user-agent", "warden-test/2.0")
        .match_header("accept", Matcher::Regex("text/html".to_string()))
        .with_status(200)
        .with_header("content-type", "text/html")
        .with_body("<html><body>nothing here</body></html>")
        .expect(1)
        .create_async()
        .await;

    let mut options = CrawlOptions::new(format!("{}/", server.url()));
    options.user_agent = Some("warden-test/2.0".to_string());
    let report = crawl_website(CrawlConfig::from_options(options).unwrap())
        .await
        .unwrap();

    home.assert_async().await;
    assert!(!report.has_broken_links());
    assert_eq!(report.total_urls_crawled, 1);
}
