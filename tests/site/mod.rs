#![allow(dead_code)]

use chrono::Utc;
use seoaudit::crawler::CrawlerConfig;
use seoaudit::error::FetchError;
use seoaudit::http_client::{FetchResponse, Fetcher};
use seoaudit::keyword_analyzer::{self, Language};
use seoaudit::models::{
    CrawlResult, LinkRecord, PageRecord, PageSignals, Readability, Site, TechnicalSnapshot,
};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

pub const ORIGIN: &str = "https://example.com";

/// An in-memory website. Unknown URLs answer 404.
#[derive(Default)]
pub struct StaticSite {
    responses: HashMap<String, Result<FetchResponse, FetchError>>,
    log: Mutex<Vec<(String, Instant)>>,
}

impl StaticSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// `path` is joined onto [`ORIGIN`]; absolute URLs are used as given.
    pub fn page(self, path: &str, body: &str) -> Self {
        self.respond(path, FetchResponse::html(200, body))
    }

    pub fn respond(mut self, path: &str, response: FetchResponse) -> Self {
        self.responses.insert(url(path), Ok(response));
        self
    }

    pub fn fail(mut self, path: &str, error: FetchError) -> Self {
        self.responses.insert(url(path), Err(error));
        self
    }

    pub fn redirect(self, path: &str, status: u16, location: &str) -> Self {
        self.respond(
            path,
            FetchResponse::new(status, None, "").with_header("Location", location),
        )
    }

    /// Every URL requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.log.lock().unwrap().iter().map(|(url, _)| url.clone()).collect()
    }

    /// When each page URL was requested, leaving out robots.txt and sitemaps.
    pub fn page_request_times(&self) -> Vec<Instant> {
        self.log
            .lock()
            .unwrap()
            .iter()
            .filter(|(url, _)| !is_site_file(url))
            .map(|(_, at)| *at)
            .collect()
    }

    /// Requested page URLs, leaving out robots.txt and sitemap requests.
    pub fn page_requests(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .filter(|u| !is_site_file(u))
            .collect()
    }
}

fn is_site_file(url: &str) -> bool {
    url.ends_with("/robots.txt") || url.ends_with(".xml")
}

impl Fetcher for StaticSite {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        self.log.lock().unwrap().push((url.to_string(), Instant::now()));
        match self.responses.get(url) {
            Some(response) => response.clone(),
            None => Ok(FetchResponse::html(404, "<html><body>Not Found</body></html>")),
        }
    }
}

/// Lets a test keep the site after handing it to a crawler.
impl Fetcher for &StaticSite {
    async fn fetch(&self, url: &str) -> Result<FetchResponse, FetchError> {
        (**self).fetch(url).await
    }
}

pub fn url(path: &str) -> String {
    if path.contains("://") {
        path.to_string()
    } else {
        format!("{}{}", ORIGIN, path)
    }
}

/// Minimal HTML document linking to each of `links`.
pub fn html(title: &str, body: &str, links: &[&str]) -> String {
    let anchors: String = links
        .iter()
        .map(|href| format!("<a href=\"{}\">{}</a>", href, href))
        .collect();
    format!(
        "<html><head><title>{}</title></head><body><p>{}</p>{}</body></html>",
        title, body, anchors
    )
}

pub fn fast_config(max_pages: usize, max_depth: usize) -> CrawlerConfig {
    CrawlerConfig {
        max_pages,
        max_depth,
        delay: Duration::ZERO,
        language: Language::English,
    }
}

/// A crawled page with nothing but a URL and depth filled in.
pub fn page(path: &str, depth: usize) -> PageRecord {
    PageRecord {
        url: url(path),
        title: None,
        meta_description: None,
        h1: None,
        content: String::new(),
        status_code: 200,
        content_type: Some("text/html".to_string()),
        depth,
        is_homepage: depth == 0,
        created_at: Utc::now(),
        links: Vec::new(),
        keywords: Vec::new(),
        readability: Readability::default(),
        signals: PageSignals::default(),
    }
}

pub fn with_content(mut page: PageRecord, content: &str) -> PageRecord {
    page.keywords = keyword_analyzer::analyze(content, Language::English);
    page.readability = keyword_analyzer::readability(content, Language::English);
    page.content = content.to_string();
    page
}

pub fn link(source: &PageRecord, target: &str) -> LinkRecord {
    LinkRecord {
        source_url: source.url.clone(),
        url: url(target),
        text: target.to_string(),
        is_internal: !target.contains("://") || target.starts_with(ORIGIN),
        is_followed: true,
    }
}

pub fn crawl_of(pages: Vec<PageRecord>) -> CrawlResult {
    CrawlResult {
        site: Site {
            url: format!("{}/", ORIGIN),
            domain: "example.com".to_string(),
            created_at: Utc::now(),
        },
        technical: TechnicalSnapshot {
            robots_txt_url: format!("{}/robots.txt", ORIGIN),
            ..TechnicalSnapshot::default()
        },
        pages,
        skipped: Vec::new(),
    }
}
