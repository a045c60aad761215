mod server;

use seoaudit::crawler::{Crawler, CrawlerConfig};
use seoaudit::error::FetchError;
use seoaudit::http_client::{Fetcher, HttpFetcher};
use seoaudit::models::SkipReason;
use server::start_test_server;
use std::time::Duration;

fn fetcher() -> HttpFetcher {
    HttpFetcher::new(Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_fetch_html_page() {
    let base = start_test_server().await;

    let response = fetcher().fetch(&format!("{}/", base)).await.unwrap();

    assert_eq!(response.status, 200);
    assert!(response.is_html());
    assert!(response.body.contains("Local test home page"));
    assert_eq!(
        response.header("Strict-Transport-Security"),
        Some("max-age=31536000")
    );
}

#[tokio::test]
async fn test_fetch_reports_status_and_content_type() {
    let base = start_test_server().await;
    let fetcher = fetcher();

    let missing = fetcher.fetch(&format!("{}/nope", base)).await.unwrap();
    assert_eq!(missing.status, 404);

    let json = fetcher.fetch(&format!("{}/data.json", base)).await.unwrap();
    assert_eq!(json.status, 200);
    assert!(!json.is_html());
    assert_eq!(json.content_type.as_deref(), Some("application/json"));
}

#[tokio::test]
async fn test_redirects_are_not_followed() {
    let base = start_test_server().await;

    let response = fetcher().fetch(&format!("{}/moved", base)).await.unwrap();

    assert_eq!(response.status, 301);
    assert!(response.is_redirect());
    assert_eq!(response.header("location"), Some("/about"));
}

#[tokio::test]
async fn test_invalid_url() {
    let err = fetcher().fetch("not a url").await.unwrap_err();
    assert!(matches!(err, FetchError::InvalidUrl(_)));
}

#[tokio::test]
async fn test_connection_refused_is_a_fetch_error() {
    // Port 9 (discard) is almost never open on a test machine.
    let result = fetcher().fetch("http://127.0.0.1:9/").await;
    assert!(result.is_err());
}

#[tokio::test]
async fn test_crawl_local_server() {
    let base = start_test_server().await;
    let config = CrawlerConfig {
        delay: Duration::ZERO,
        ..CrawlerConfig::default()
    };
    let crawler = Crawler::new(fetcher(), config);

    let result = crawler.crawl(&base).await.unwrap();

    assert_eq!(result.pages.len(), 2);
    assert!(result.pages[0].is_homepage);
    assert!(result.technical.has_robots_txt);
    assert!(!result.technical.has_sitemap);
    assert!(result.technical.has_hsts);
    assert!(
        result
            .skipped
            .iter()
            .any(|s| matches!(s.reason, SkipReason::Redirect { .. }))
    );
}
