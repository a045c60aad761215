use crate::probe::{CoreWebVitals, PageSpeed};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// The audited website. The domain is derived once from the seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Site {
    pub url: String,
    pub domain: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    pub url: String,
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    /// Visible text with whitespace collapsed.
    pub content: String,
    pub status_code: u16,
    pub content_type: Option<String>,
    pub depth: usize,
    pub is_homepage: bool,
    pub created_at: DateTime<Utc>,
    pub links: Vec<LinkRecord>,
    /// At most 30, ordered by descending count.
    pub keywords: Vec<KeywordRecord>,
    #[serde(default)]
    pub readability: Readability,
    pub signals: PageSignals,
}

impl PageRecord {
    pub fn top_keyword(&self) -> Option<&KeywordRecord> {
        self.keywords.first()
    }

    pub fn word_count(&self) -> usize {
        self.content.split_whitespace().count()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub source_url: String,
    pub url: String,
    pub text: String,
    pub is_internal: bool,
    pub is_followed: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub keyword: String,
    pub count: usize,
    /// Percentage of retained tokens, rounded to 2 decimals.
    pub density: f64,
}

/// Sentence-length readability of a page's text.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Readability {
    pub sentence_count: usize,
    pub word_count: usize,
    pub avg_sentence_length: f64,
    pub score: f64,
    pub level: ReadabilityLevel,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadabilityLevel {
    /// No sentences to measure.
    #[default]
    Unknown,
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
}

impl ReadabilityLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReadabilityLevel::Unknown => "unknown",
            ReadabilityLevel::VeryEasy => "very easy",
            ReadabilityLevel::Easy => "easy",
            ReadabilityLevel::FairlyEasy => "fairly easy",
            ReadabilityLevel::Standard => "standard",
            ReadabilityLevel::FairlyDifficult => "fairly difficult",
            ReadabilityLevel::Difficult => "difficult",
            ReadabilityLevel::VeryDifficult => "very difficult",
        }
    }
}

impl fmt::Display for ReadabilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markup signals gathered while the document is parsed, so later stages
/// never need to re-parse HTML.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSignals {
    pub canonical_url: Option<String>,
    pub has_structured_data: bool,
    pub structured_data_types: Vec<String>,
    pub has_viewport: bool,
    pub open_graph: OpenGraphTags,
    pub has_twitter_card: bool,
    pub image_count: usize,
    pub images_missing_alt: usize,
    pub h2_count: usize,
    pub h3_count: usize,
    pub paragraph_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpenGraphTags {
    pub og_title: Option<String>,
    pub og_description: Option<String>,
    pub og_image: Option<String>,
    pub og_url: Option<String>,
    pub og_type: Option<String>,
}

impl OpenGraphTags {
    /// Number of the three essential tags (title, description, image) present.
    pub fn essential_count(&self) -> usize {
        [&self.og_title, &self.og_description, &self.og_image]
            .iter()
            .filter(|tag| tag.is_some())
            .count()
    }
}

/// Site-level facts discovered alongside the crawl.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub robots_txt_url: String,
    pub has_robots_txt: bool,
    pub robots_txt_content: Option<String>,
    pub has_sitemap: bool,
    pub sitemap_url: Option<String>,
    pub sitemap_content: Option<String>,
    pub has_hsts: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum SkipReason {
    /// Non-200, non-redirect status.
    Status,
    NotHtml { content_type: Option<String> },
    Redirect { location: Option<String> },
    Transport { error: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedFetch {
    pub url: String,
    pub depth: usize,
    pub status_code: Option<u16>,
    pub reason: SkipReason,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlResult {
    pub site: Site,
    pub technical: TechnicalSnapshot,
    /// In traversal order.
    pub pages: Vec<PageRecord>,
    pub skipped: Vec<SkippedFetch>,
}

impl CrawlResult {
    pub fn page(&self, url: &str) -> Option<&PageRecord> {
        let wanted = url.trim_end_matches('/');
        self.pages
            .iter()
            .find(|page| page.url == url || page.url.trim_end_matches('/') == wanted)
    }

    pub fn homepage(&self) -> Option<&PageRecord> {
        self.pages.iter().find(|page| page.is_homepage)
    }
}

/// Uniform result of one check or analysis category.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult<C> {
    pub category: C,
    pub score: f64,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
}

impl<C> CheckResult<C> {
    pub fn new(category: C) -> Self {
        Self {
            category,
            score: 0.0,
            issues: Vec::new(),
            recommendations: Vec::new(),
        }
    }

    pub fn with_score(mut self, score: f64) -> Self {
        self.score = score;
        self
    }

    pub fn add(&mut self, points: f64) {
        self.score += points;
    }

    pub fn flag(&mut self, issue: impl Into<String>, recommendation: impl Into<String>) {
        self.issues.push(issue.into());
        self.recommendations.push(recommendation.into());
    }

    /// Clamp the score into `0..=max`.
    pub fn capped(mut self, max: f64) -> Self {
        self.score = self.score.clamp(0.0, max);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechnicalCategory {
    RobotsTxt,
    Sitemap,
    SiteStructure,
    CoreWebVitals,
    Redirects,
    Canonical,
    MetaTags,
    StructuredData,
    Links,
    MobileFriendly,
    Security,
    PageSpeed,
}

impl TechnicalCategory {
    pub const ALL: [TechnicalCategory; 12] = [
        TechnicalCategory::RobotsTxt,
        TechnicalCategory::Sitemap,
        TechnicalCategory::SiteStructure,
        TechnicalCategory::CoreWebVitals,
        TechnicalCategory::Redirects,
        TechnicalCategory::Canonical,
        TechnicalCategory::MetaTags,
        TechnicalCategory::StructuredData,
        TechnicalCategory::Links,
        TechnicalCategory::MobileFriendly,
        TechnicalCategory::Security,
        TechnicalCategory::PageSpeed,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TechnicalCategory::RobotsTxt => "robots_txt",
            TechnicalCategory::Sitemap => "sitemap",
            TechnicalCategory::SiteStructure => "site_structure",
            TechnicalCategory::CoreWebVitals => "core_web_vitals",
            TechnicalCategory::Redirects => "redirects",
            TechnicalCategory::Canonical => "canonical",
            TechnicalCategory::MetaTags => "meta_tags",
            TechnicalCategory::StructuredData => "structured_data",
            TechnicalCategory::Links => "links",
            TechnicalCategory::MobileFriendly => "mobile_friendly",
            TechnicalCategory::Security => "security",
            TechnicalCategory::PageSpeed => "page_speed",
        }
    }
}

impl fmt::Display for TechnicalCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OnPageCategory {
    Title,
    MetaDescription,
    Url,
    Headings,
    Content,
    Images,
    Links,
    MobileFriendly,
    SocialTags,
}

impl OnPageCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            OnPageCategory::Title => "title",
            OnPageCategory::MetaDescription => "meta_description",
            OnPageCategory::Url => "url",
            OnPageCategory::Headings => "headings",
            OnPageCategory::Content => "content",
            OnPageCategory::Images => "images",
            OnPageCategory::Links => "links",
            OnPageCategory::MobileFriendly => "mobile_friendly",
            OnPageCategory::SocialTags => "social_tags",
        }
    }
}

impl fmt::Display for OnPageCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type TechnicalCheck = CheckResult<TechnicalCategory>;
pub type OnPageCheck = CheckResult<OnPageCategory>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RobotsTxtFacts {
    pub exists: bool,
    pub url: String,
    pub content: Option<String>,
    pub sitemap_directives: Vec<String>,
    pub blocked_paths: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SitemapFacts {
    pub exists: bool,
    pub url: Option<String>,
    pub urls_count: usize,
    pub urls_with_lastmod: usize,
    pub child_sitemaps: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StructureFacts {
    pub total_pages: usize,
    pub max_depth: usize,
    pub depth_distribution: BTreeMap<usize, usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedirectFact {
    pub url: String,
    pub status_code: u16,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinkStats {
    pub internal: usize,
    pub external: usize,
    pub nofollow: usize,
    pub avg_internal_per_page: f64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CoverageFacts {
    pub pages_with_canonical: usize,
    pub pages_with_structured_data: usize,
    pub schema_types: BTreeMap<String, usize>,
    pub pages_with_viewport: usize,
    pub pages_with_meta_issues: usize,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SecurityFacts {
    pub is_https: bool,
    pub has_hsts: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TechnicalAudit {
    pub site_url: String,
    pub robots_txt: RobotsTxtFacts,
    pub sitemap: SitemapFacts,
    pub structure: StructureFacts,
    pub redirects: Vec<RedirectFact>,
    pub link_stats: LinkStats,
    pub coverage: CoverageFacts,
    pub security: SecurityFacts,
    pub core_web_vitals: Option<CoreWebVitals>,
    pub page_speed: Option<PageSpeed>,
    pub checks: Vec<TechnicalCheck>,
}

impl TechnicalAudit {
    pub fn check(&self, category: TechnicalCategory) -> Option<&TechnicalCheck> {
        self.checks.iter().find(|check| check.category == category)
    }
}

/// Derived view; recomputed on every ranking run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedPage {
    pub url: String,
    pub title: Option<String>,
    pub is_homepage: bool,
    pub depth: usize,
    pub score: u32,
    pub inbound_links: usize,
    pub outbound_links: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OnPageFinding {
    pub page_url: String,
    /// Sum of category scores clamped to 100.
    pub score: f64,
    pub checks: Vec<OnPageCheck>,
    pub issues: Vec<String>,
    pub recommendations: Vec<String>,
    pub internal_links_count: usize,
    pub external_links_count: usize,
    pub top_keywords: Vec<KeywordRecord>,
    #[serde(default)]
    pub readability: Readability,
}

impl OnPageFinding {
    pub fn check(&self, category: OnPageCategory) -> Option<&OnPageCheck> {
        self.checks.iter().find(|check| check.category == category)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeScore {
    pub overall: f64,
    pub technical: f64,
    pub onpage: f64,
    pub top_issues: Vec<String>,
    pub top_recommendations: Vec<String>,
}
