//! Weights and thresholds used by the checkers and the aggregator.
//!
//! Everything tunable lives here as plain data so the numbers can be audited
//! and tested apart from the code that consumes them.

use crate::models::TechnicalCategory;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LengthRange {
    pub min: usize,
    pub max: usize,
}

impl LengthRange {
    pub const fn contains(&self, len: usize) -> bool {
        len >= self.min && len <= self.max
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScoringProfile {
    pub weights: [(TechnicalCategory, f64); 12],
    pub technical: TechnicalThresholds,
    pub onpage: OnPageThresholds,
    pub ranking: RankingWeights,
    /// How many issues and recommendations the composite score keeps.
    pub top_findings: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TechnicalThresholds {
    pub important_paths: [&'static str; 5],
    /// Points removed per issue in count-based categories.
    pub issue_penalty: f64,
    pub max_recommended_depth: usize,
    pub deep_page_depth: usize,
    pub max_deep_page_ratio: f64,
    pub min_lastmod_ratio: f64,
    pub max_redirects: usize,
    pub title: LengthRange,
    pub meta_description: LengthRange,
    /// Share of pages a meta-tag problem must affect before it is reported.
    pub common_issue_ratio: f64,
    pub min_avg_internal_links: f64,
    pub max_external_link_ratio: f64,
    pub cwv_points: CwvPoints,
    pub min_mobile_speed: f64,
    pub min_desktop_speed: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CwvPoints {
    pub lcp: f64,
    pub fid: f64,
    pub cls: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OnPageThresholds {
    pub category_cap: f64,
    pub title: LengthRange,
    pub meta_description: LengthRange,
    pub h1: LengthRange,
    pub max_url_length: usize,
    pub low_word_count: usize,
    pub high_word_count: usize,
    pub min_density: f64,
    pub max_density: f64,
    pub max_paragraph_words: f64,
    pub min_internal_links: usize,
    pub max_external_per_internal: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RankingWeights {
    pub homepage: u32,
    pub depth_base: u32,
    pub depth_step: u32,
    pub per_inbound_link: u32,
    pub max_inbound: u32,
    pub title_min_len: usize,
    pub meta_min_len: usize,
    pub h1_min_len: usize,
    pub field_bonus: u32,
    pub long_content: (usize, u32),
    pub medium_content: (usize, u32),
}

pub const DEFAULT_PROFILE: ScoringProfile = ScoringProfile {
    weights: [
        (TechnicalCategory::RobotsTxt, 0.05),
        (TechnicalCategory::Sitemap, 0.05),
        (TechnicalCategory::SiteStructure, 0.10),
        (TechnicalCategory::CoreWebVitals, 0.20),
        (TechnicalCategory::Redirects, 0.05),
        (TechnicalCategory::Canonical, 0.05),
        (TechnicalCategory::MetaTags, 0.15),
        (TechnicalCategory::StructuredData, 0.10),
        (TechnicalCategory::Links, 0.10),
        (TechnicalCategory::MobileFriendly, 0.10),
        (TechnicalCategory::Security, 0.05),
        (TechnicalCategory::PageSpeed, 0.10),
    ],
    technical: TechnicalThresholds {
        important_paths: ["/about", "/contact", "/products", "/services", "/blog"],
        issue_penalty: 20.0,
        max_recommended_depth: 4,
        deep_page_depth: 4,
        max_deep_page_ratio: 0.3,
        min_lastmod_ratio: 0.5,
        max_redirects: 10,
        title: LengthRange { min: 30, max: 60 },
        meta_description: LengthRange { min: 70, max: 160 },
        common_issue_ratio: 0.1,
        min_avg_internal_links: 5.0,
        max_external_link_ratio: 0.5,
        cwv_points: CwvPoints {
            lcp: 33.0,
            fid: 33.0,
            cls: 34.0,
        },
        min_mobile_speed: 80.0,
        min_desktop_speed: 90.0,
    },
    onpage: OnPageThresholds {
        category_cap: 15.0,
        title: LengthRange { min: 30, max: 60 },
        meta_description: LengthRange { min: 70, max: 160 },
        h1: LengthRange { min: 20, max: 70 },
        max_url_length: 100,
        low_word_count: 300,
        high_word_count: 600,
        min_density: 0.5,
        max_density: 2.5,
        max_paragraph_words: 150.0,
        min_internal_links: 3,
        max_external_per_internal: 2,
    },
    ranking: RankingWeights {
        homepage: 100,
        depth_base: 10,
        depth_step: 2,
        per_inbound_link: 2,
        max_inbound: 50,
        title_min_len: 10,
        meta_min_len: 50,
        h1_min_len: 5,
        field_bonus: 5,
        long_content: (1000, 10),
        medium_content: (500, 5),
    },
    top_findings: 10,
};

impl ScoringProfile {
    pub fn weight(&self, category: TechnicalCategory) -> f64 {
        self.weights
            .iter()
            .find(|(c, _)| *c == category)
            .map(|(_, w)| *w)
            .unwrap_or(0.0)
    }
}

impl Default for ScoringProfile {
    fn default() -> Self {
        DEFAULT_PROFILE
    }
}

/// Round half away from zero to `places` decimals.
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
