use crate::error::{AuditError, Result};
use crate::extractor::{Extractor, resolve};
use crate::http_client::{FetchResponse, Fetcher};
use crate::keyword_analyzer::{self, Language};
use crate::models::{CrawlResult, PageRecord, Site, SkipReason, SkippedFetch, TechnicalSnapshot};
use crate::robots::RobotsTxt;
use chrono::Utc;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::time::Duration;
use url::Url;

pub const DEFAULT_MAX_PAGES: usize = 100;
pub const DEFAULT_MAX_DEPTH: usize = 3;
pub const DEFAULT_DELAY_MS: u64 = 1000;

/// Configuration for the crawler
#[derive(Debug, Clone)]
pub struct CrawlerConfig {
    pub max_pages: usize,
    pub max_depth: usize,
    /// Fixed pause before every page fetch except the first.
    pub delay: Duration,
    pub language: Language,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: DEFAULT_MAX_PAGES,
            max_depth: DEFAULT_MAX_DEPTH,
            delay: Duration::from_millis(DEFAULT_DELAY_MS),
            language: Language::DEFAULT,
        }
    }
}

pub struct Crawler<F> {
    fetcher: F,
    config: CrawlerConfig,
    progress_bar: Option<ProgressBar>,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: F, config: CrawlerConfig) -> Self {
        Self {
            fetcher,
            config,
            progress_bar: None,
        }
    }

    pub fn config(&self) -> &CrawlerConfig {
        &self.config
    }

    /// Enable progress bar for crawling
    pub fn enable_progress_bar(&mut self) {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("[{elapsed_precise}] {spinner:.cyan} Crawling: {pos} pages")
                .expect("Progress bar template should be valid"),
        );
        self.progress_bar = Some(pb);
    }

    /// Crawls one site from `seed`. Fails only when the seed is unusable or
    /// no page could be recorded.
    pub async fn crawl(&self, seed: &str) -> Result<CrawlResult> {
        let base_url = normalize_seed(seed)?;
        let domain = registrable_domain(&base_url)?;

        tracing::info!(
            url = %base_url,
            domain = %domain,
            max_pages = self.config.max_pages,
            max_depth = self.config.max_depth,
            "Starting crawl"
        );

        if let Some(ref pb) = self.progress_bar {
            pb.set_position(0);
        }

        let mut session = CrawlSession::new(self, &base_url, &domain);
        let technical = session.probe_site_files().await;
        session.run().await;

        if let Some(ref pb) = self.progress_bar {
            pb.finish_with_message(format!("Crawled {} pages", session.pages.len()));
        }

        tracing::info!(
            pages = session.pages.len(),
            skipped = session.skipped.len(),
            "Crawl finished"
        );

        if session.pages.is_empty() {
            return Err(AuditError::EmptyCrawl {
                seed: base_url.to_string(),
            });
        }

        let has_hsts = session.has_hsts;
        Ok(CrawlResult {
            site: Site {
                url: base_url.to_string(),
                domain,
                created_at: Utc::now(),
            },
            technical: TechnicalSnapshot {
                has_hsts,
                ..technical
            },
            pages: session.pages,
            skipped: session.skipped,
        })
    }
}

/// Adds `https://` when no scheme is given and a trailing slash when the
/// path has none.
pub fn normalize_seed(seed: &str) -> Result<Url> {
    let seed = seed.trim();
    let with_scheme = if seed.contains("://") {
        seed.to_string()
    } else {
        format!("https://{}", seed)
    };

    let mut url = Url::parse(&with_scheme).map_err(|e| AuditError::InvalidSeed {
        url: seed.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => {
            return Err(AuditError::InvalidSeed {
                url: seed.to_string(),
                reason: format!("unsupported scheme '{}'", scheme),
            });
        }
    }

    url.set_fragment(None);
    if !url.path().ends_with('/') && url.query().is_none() {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

/// Seed host without a leading `www.`.
pub fn registrable_domain(url: &Url) -> Result<String> {
    let host = url.host_str().ok_or_else(|| AuditError::InvalidSeed {
        url: url.to_string(),
        reason: "missing host".to_string(),
    })?;
    let host = host.to_lowercase();
    Ok(host.strip_prefix("www.").unwrap_or(&host).to_string())
}

#[derive(Debug, Clone)]
struct FrontierEntry {
    url: Url,
    depth: usize,
    is_homepage: bool,
}

/// State of a single crawl run: its pending stack, visited set and output.
struct CrawlSession<'a, F> {
    crawler: &'a Crawler<F>,
    base_url: Url,
    extractor: Extractor,
    stack: Vec<FrontierEntry>,
    visited: HashSet<String>,
    pages: Vec<PageRecord>,
    skipped: Vec<SkippedFetch>,
    fetches: usize,
    has_hsts: bool,
}

impl<'a, F: Fetcher> CrawlSession<'a, F> {
    fn new(crawler: &'a Crawler<F>, base_url: &Url, domain: &str) -> Self {
        Self {
            crawler,
            base_url: base_url.clone(),
            extractor: Extractor::new(domain),
            stack: vec![FrontierEntry {
                url: base_url.clone(),
                depth: 0,
                is_homepage: true,
            }],
            visited: HashSet::new(),
            pages: Vec::new(),
            skipped: Vec::new(),
            fetches: 0,
            has_hsts: false,
        }
    }

    fn config(&self) -> &CrawlerConfig {
        &self.crawler.config
    }

    /// Looks for robots.txt and a sitemap. Failures only leave the snapshot
    /// fields empty.
    async fn probe_site_files(&self) -> TechnicalSnapshot {
        let robots_url = self.site_file_url("/robots.txt");
        let mut snapshot = TechnicalSnapshot {
            robots_txt_url: robots_url.clone(),
            ..TechnicalSnapshot::default()
        };

        let mut candidates = Vec::new();
        match self.crawler.fetcher.fetch(&robots_url).await {
            Ok(response) if response.status == 200 => {
                let robots = RobotsTxt::parse(&response.body);
                candidates.extend(robots.sitemaps().iter().cloned());
                snapshot.has_robots_txt = true;
                snapshot.robots_txt_content = Some(response.body);
            }
            Ok(response) => {
                tracing::warn!(url = %robots_url, status = response.status, "robots.txt not available");
            }
            Err(e) => {
                tracing::warn!(url = %robots_url, error = %e, "Failed to fetch robots.txt, continuing anyway");
            }
        }

        let conventional = self.site_file_url("/sitemap.xml");
        if !candidates.contains(&conventional) {
            candidates.push(conventional);
        }

        for sitemap_url in candidates {
            match self.crawler.fetcher.fetch(&sitemap_url).await {
                Ok(response) if response.status == 200 => {
                    tracing::info!(url = %sitemap_url, "Found sitemap");
                    snapshot.has_sitemap = true;
                    snapshot.sitemap_url = Some(sitemap_url);
                    snapshot.sitemap_content = Some(response.body);
                    break;
                }
                Ok(response) => {
                    tracing::debug!(url = %sitemap_url, status = response.status, "No sitemap here");
                }
                Err(e) => {
                    tracing::warn!(url = %sitemap_url, error = %e, "Failed to fetch sitemap");
                }
            }
        }

        snapshot
    }

    fn site_file_url(&self, path: &str) -> String {
        self.base_url
            .join(path)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| format!("{}{}", self.base_url.origin().ascii_serialization(), path))
    }

    async fn run(&mut self) {
        while let Some(entry) = self.stack.pop() {
            if self.pages.len() >= self.config().max_pages {
                tracing::info!(max_pages = self.config().max_pages, "Page budget reached");
                break;
            }
            if entry.depth > self.config().max_depth {
                continue;
            }
            if !self.visited.insert(entry.url.to_string()) {
                continue;
            }

            self.visit(entry).await;

            if let Some(ref pb) = self.crawler.progress_bar {
                pb.set_position(self.pages.len() as u64);
            }
        }
    }

    async fn visit(&mut self, entry: FrontierEntry) {
        if self.fetches > 0 && !self.config().delay.is_zero() {
            tokio::time::sleep(self.config().delay).await;
        }
        self.fetches += 1;

        let url = entry.url.to_string();
        tracing::info!(url = %url, depth = entry.depth, "Crawling page");

        let response = match self.crawler.fetcher.fetch(&url).await {
            Ok(response) => response,
            Err(e) => {
                tracing::error!(url = %url, error = %e, "Failed to crawl page");
                self.skip(&entry, None, SkipReason::Transport {
                    error: e.to_string(),
                });
                return;
            }
        };

        if response.is_redirect() {
            self.follow_redirect(&entry, &response);
            return;
        }

        if response.status != 200 {
            tracing::warn!(url = %url, status = response.status, "Skipping page with non-200 status");
            self.skip(&entry, Some(response.status), SkipReason::Status);
            return;
        }

        if !response.is_html() {
            tracing::warn!(
                url = %url,
                content_type = ?response.content_type,
                "Skipping non-HTML page"
            );
            self.skip(&entry, Some(response.status), SkipReason::NotHtml {
                content_type: response.content_type.clone(),
            });
            return;
        }

        if entry.is_homepage && self.pages.iter().all(|p| !p.is_homepage) {
            self.has_hsts = response.header("strict-transport-security").is_some();
        }

        let extraction = self.extractor.extract(&response.body, &entry.url);
        let keywords = keyword_analyzer::analyze(&extraction.content, self.config().language);
        let readability = keyword_analyzer::readability(&extraction.content, self.config().language);

        if entry.depth < self.config().max_depth {
            let children: Vec<FrontierEntry> = extraction
                .links
                .iter()
                .filter(|link| link.is_internal && link.is_followed)
                .filter_map(|link| Url::parse(&link.url).ok())
                .filter(|child| !self.visited.contains(child.as_str()))
                .map(|child| FrontierEntry {
                    url: child,
                    depth: entry.depth + 1,
                    is_homepage: false,
                })
                .collect();
            tracing::debug!(url = %url, children = children.len(), "Queued internal links");
            self.stack.extend(children.into_iter().rev());
        }

        self.pages.push(PageRecord {
            url,
            title: extraction.title,
            meta_description: extraction.meta_description,
            h1: extraction.h1,
            content: extraction.content,
            status_code: response.status,
            content_type: response.content_type,
            depth: entry.depth,
            is_homepage: entry.is_homepage,
            created_at: Utc::now(),
            links: extraction.links,
            keywords,
            readability,
            signals: extraction.signals,
        });
    }

    fn follow_redirect(&mut self, entry: &FrontierEntry, response: &FetchResponse) {
        let location = response.header("location").map(str::to_string);
        let target = location
            .as_deref()
            .and_then(|loc| resolve(&entry.url, loc))
            .filter(|target| self.extractor.is_internal(target));

        tracing::info!(
            url = %entry.url,
            status = response.status,
            location = ?location,
            "Redirect"
        );

        self.skip(entry, Some(response.status), SkipReason::Redirect { location });

        if let Some(target) = target
            && !self.visited.contains(target.as_str())
        {
            self.stack.push(FrontierEntry {
                url: target,
                depth: entry.depth,
                is_homepage: entry.is_homepage,
            });
        }
    }

    fn skip(&mut self, entry: &FrontierEntry, status_code: Option<u16>, reason: SkipReason) {
        self.skipped.push(SkippedFetch {
            url: entry.url.to_string(),
            depth: entry.depth,
            status_code,
            reason,
        });
    }
}
