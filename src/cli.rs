use crate::audit::AuditOptions;
use crate::crawler::{CrawlerConfig, DEFAULT_DELAY_MS, DEFAULT_MAX_DEPTH, DEFAULT_MAX_PAGES};
use crate::http_client::DEFAULT_TIMEOUT_SECS;
use crate::keyword_analyzer::Language;
use crate::page_ranker::DEFAULT_TOP_N;
use crate::scoring::ScoringProfile;
use anyhow::{Result, bail};
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_OUTPUT: &str = "text";
pub const DEFAULT_LANGUAGE: &str = "auto";

#[derive(Parser, Debug, Clone)]
#[command(name = "seoaudit")]
#[command(about = "Crawl a website and grade its technical and on-page SEO", long_about = None)]
pub struct Cli {
    /// The URL to start the audit from (scheme optional)
    #[arg(value_name = "URL")]
    pub url: String,

    /// Maximum crawl depth (default: 3)
    #[arg(short, long, default_value_t = DEFAULT_MAX_DEPTH)]
    pub depth: usize,

    /// Maximum number of pages to crawl (default: 100)
    #[arg(short, long, default_value_t = DEFAULT_MAX_PAGES)]
    pub max_pages: usize,

    /// Number of top-ranked pages to analyze on-page (default: 20)
    #[arg(short = 'n', long, default_value_t = DEFAULT_TOP_N)]
    pub top_n: usize,

    /// Stopword language for keyword analysis: en, ko or auto
    #[arg(short, long, default_value = DEFAULT_LANGUAGE)]
    pub language: String,

    /// Per-request timeout in seconds (default: 10)
    #[arg(short, long, default_value_t = DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Pause between page fetches in milliseconds (default: 1000)
    #[arg(long, default_value_t = DEFAULT_DELAY_MS)]
    pub delay_ms: u64,

    /// Output format: text or json
    #[arg(short, long, default_value = DEFAULT_OUTPUT)]
    pub output: String,

    /// Save the JSON report to file
    #[arg(short, long)]
    pub save: Option<String>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Path to configuration file (JSON, TOML, or YAML)
    #[arg(long)]
    pub config: Option<String>,
}

impl Cli {
    /// Rejects values the audit cannot run with, before any request is sent.
    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            bail!("URL must not be empty");
        }
        if self.depth == 0 {
            bail!("--depth must be at least 1");
        }
        if self.max_pages == 0 {
            bail!("--max-pages must be at least 1");
        }
        if self.top_n == 0 {
            bail!("--top-n must be at least 1");
        }
        if self.timeout == 0 {
            bail!("--timeout must be at least 1 second");
        }
        if !matches!(self.output.as_str(), "text" | "json") {
            bail!("--output must be 'text' or 'json', got '{}'", self.output);
        }
        Ok(())
    }

    pub fn audit_options(&self) -> AuditOptions {
        AuditOptions {
            crawler: CrawlerConfig {
                max_pages: self.max_pages,
                max_depth: self.depth,
                delay: Duration::from_millis(self.delay_ms),
                language: Language::from_hint(Some(&self.language)),
            },
            top_n: self.top_n,
            profile: ScoringProfile::default(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }
}
