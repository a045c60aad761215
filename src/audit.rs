//! Drives one audit run through the pipeline stages.

use crate::aggregator;
use crate::crawler::{Crawler, CrawlerConfig};
use crate::error::{AuditError, Result};
use crate::http_client::Fetcher;
use crate::keyword_analyzer;
use crate::models::{
    CompositeScore, CrawlResult, KeywordRecord, OnPageFinding, RankedPage, TechnicalAudit,
};
use crate::onpage_analyzer;
use crate::page_ranker::{self, DEFAULT_TOP_N};
use crate::probe::PerformanceProbe;
use crate::scoring::ScoringProfile;
use crate::technical_checker;
use serde::{Deserialize, Serialize};
use std::fmt;

const SITE_KEYWORDS: usize = 20;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditStage {
    #[default]
    Seeded,
    Crawling,
    Crawled,
    TechnicallyAudited,
    Ranked,
    OnPageAnalyzed,
    Aggregated,
    Failed(String),
}

impl AuditStage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, AuditStage::Aggregated | AuditStage::Failed(_))
    }

    /// Terminal stage of a run aborted by `error`, if the error ends the
    /// run in `Failed`. Only an empty crawl does.
    pub fn failure(error: &AuditError) -> Option<AuditStage> {
        match error {
            AuditError::EmptyCrawl { .. } => Some(AuditStage::Failed(error.to_string())),
            _ => None,
        }
    }
}

/// Current stage of one run plus which post-crawl branches are done.
/// Technical checks and ranking may run in either order, but both must
/// finish before on-page analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuditProgress {
    stage: AuditStage,
    technically_audited: bool,
    ranked: bool,
}

impl AuditProgress {
    pub fn stage(&self) -> &AuditStage {
        &self.stage
    }

    pub fn can_advance_to(&self, next: &AuditStage) -> bool {
        use AuditStage::*;
        match (&self.stage, next) {
            (Seeded, Crawling)
            | (Crawling, Crawled)
            | (Crawling, Failed(_))
            | (OnPageAnalyzed, Aggregated) => true,
            (Crawled | TechnicallyAudited | Ranked, TechnicallyAudited) => !self.technically_audited,
            (Crawled | TechnicallyAudited | Ranked, Ranked) => !self.ranked,
            (TechnicallyAudited | Ranked, OnPageAnalyzed) => self.technically_audited && self.ranked,
            _ => false,
        }
    }

    /// Moves to `next`, logging the transition. Illegal moves are refused
    /// and leave the progress unchanged.
    pub fn advance(&mut self, next: AuditStage) -> bool {
        if !self.can_advance_to(&next) {
            tracing::error!(from = %self.stage, to = %next, "Illegal audit transition");
            return false;
        }
        tracing::info!(from = %self.stage, to = %next, "Audit stage");
        match next {
            AuditStage::TechnicallyAudited => self.technically_audited = true,
            AuditStage::Ranked => self.ranked = true,
            _ => {}
        }
        self.stage = next;
        true
    }
}

impl fmt::Display for AuditStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuditStage::Seeded => f.write_str("seeded"),
            AuditStage::Crawling => f.write_str("crawling"),
            AuditStage::Crawled => f.write_str("crawled"),
            AuditStage::TechnicallyAudited => f.write_str("technically_audited"),
            AuditStage::Ranked => f.write_str("ranked"),
            AuditStage::OnPageAnalyzed => f.write_str("on_page_analyzed"),
            AuditStage::Aggregated => f.write_str("aggregated"),
            AuditStage::Failed(reason) => write!(f, "failed: {}", reason),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AuditOptions {
    pub crawler: CrawlerConfig,
    pub top_n: usize,
    pub profile: ScoringProfile,
}

impl Default for AuditOptions {
    fn default() -> Self {
        Self {
            crawler: CrawlerConfig::default(),
            top_n: DEFAULT_TOP_N,
            profile: ScoringProfile::default(),
        }
    }
}

/// Every record produced by one successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditReport {
    pub stage: AuditStage,
    pub crawl: CrawlResult,
    pub technical: TechnicalAudit,
    pub ranked: Vec<RankedPage>,
    pub findings: Vec<OnPageFinding>,
    pub score: CompositeScore,
    pub site_keywords: Vec<KeywordRecord>,
}

pub struct Auditor<F, P> {
    crawler: Crawler<F>,
    probe: P,
    top_n: usize,
    profile: ScoringProfile,
}

impl<F: Fetcher, P: PerformanceProbe> Auditor<F, P> {
    pub fn new(fetcher: F, probe: P, options: AuditOptions) -> Self {
        Self {
            crawler: Crawler::new(fetcher, options.crawler),
            probe,
            top_n: options.top_n,
            profile: options.profile,
        }
    }

    pub fn enable_progress_bar(&mut self) {
        self.crawler.enable_progress_bar();
    }

    pub async fn run(&self, seed: &str) -> Result<AuditReport> {
        let mut progress = AuditProgress::default();
        progress.advance(AuditStage::Crawling);

        let crawl = match self.crawler.crawl(seed).await {
            Ok(crawl) => crawl,
            Err(e) => {
                if let Some(failed) = AuditStage::failure(&e) {
                    progress.advance(failed);
                }
                return Err(e);
            }
        };
        progress.advance(AuditStage::Crawled);

        let signals = self.probe.probe(&crawl.site.url).await;
        let technical = technical_checker::check_site(&crawl, &signals, &self.profile);
        progress.advance(AuditStage::TechnicallyAudited);

        let ranked = page_ranker::rank(&crawl, self.top_n, &self.profile);
        progress.advance(AuditStage::Ranked);

        let findings = onpage_analyzer::analyze_ranked(&crawl, &ranked, &self.profile)?;
        progress.advance(AuditStage::OnPageAnalyzed);

        let score = aggregator::aggregate(Some(&technical), &findings, &self.profile);
        progress.advance(AuditStage::Aggregated);

        tracing::info!(
            overall = score.overall,
            technical = score.technical,
            onpage = score.onpage,
            "Audit complete"
        );

        let site_keywords = keyword_analyzer::site_keywords(&crawl.pages, SITE_KEYWORDS);
        Ok(AuditReport {
            stage: progress.stage().clone(),
            crawl,
            technical,
            ranked,
            findings,
            score,
            site_keywords,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn progress_through(stages: &[AuditStage]) -> AuditProgress {
        let mut progress = AuditProgress::default();
        for stage in stages {
            assert!(progress.advance(stage.clone()), "{} -> {}", progress.stage(), stage);
        }
        progress
    }

    #[test]
    fn test_happy_path_transitions() {
        let progress = progress_through(&[
            AuditStage::Crawling,
            AuditStage::Crawled,
            AuditStage::TechnicallyAudited,
            AuditStage::Ranked,
            AuditStage::OnPageAnalyzed,
            AuditStage::Aggregated,
        ]);
        assert_eq!(progress.stage(), &AuditStage::Aggregated);
        assert!(progress.stage().is_terminal());
    }

    #[test]
    fn test_ranking_may_precede_technical_checks() {
        let progress = progress_through(&[
            AuditStage::Crawling,
            AuditStage::Crawled,
            AuditStage::Ranked,
            AuditStage::TechnicallyAudited,
            AuditStage::OnPageAnalyzed,
        ]);
        assert_eq!(progress.stage(), &AuditStage::OnPageAnalyzed);
    }

    #[test]
    fn test_on_page_analysis_needs_both_branches() {
        let mut progress =
            progress_through(&[AuditStage::Crawling, AuditStage::Crawled, AuditStage::Ranked]);
        assert!(!progress.can_advance_to(&AuditStage::OnPageAnalyzed));
        assert!(!progress.advance(AuditStage::OnPageAnalyzed));
        assert_eq!(progress.stage(), &AuditStage::Ranked);

        let mut progress = progress_through(&[
            AuditStage::Crawling,
            AuditStage::Crawled,
            AuditStage::TechnicallyAudited,
        ]);
        assert!(!progress.can_advance_to(&AuditStage::OnPageAnalyzed));
        assert!(!progress.can_advance_to(&AuditStage::TechnicallyAudited));
        assert!(progress.advance(AuditStage::Ranked));
        assert!(!progress.can_advance_to(&AuditStage::Ranked));
        assert!(progress.can_advance_to(&AuditStage::OnPageAnalyzed));
    }

    #[test]
    fn test_failure_only_from_crawling() {
        let failed = AuditStage::Failed("no pages".to_string());
        assert!(!AuditProgress::default().can_advance_to(&failed));

        let crawling = progress_through(&[AuditStage::Crawling]);
        assert!(crawling.can_advance_to(&failed));

        let crawled = progress_through(&[AuditStage::Crawling, AuditStage::Crawled]);
        assert!(!crawled.can_advance_to(&failed));
        assert!(!crawled.can_advance_to(&AuditStage::OnPageAnalyzed));
        assert!(failed.is_terminal());
    }

    #[test]
    fn test_only_empty_crawl_fails_the_run() {
        let empty = AuditError::EmptyCrawl {
            seed: "https://example.com/".to_string(),
        };
        assert_eq!(
            AuditStage::failure(&empty),
            Some(AuditStage::Failed(
                "crawl of https://example.com/ produced no pages".to_string()
            ))
        );
        assert_eq!(
            AuditStage::failure(&AuditError::PageNotFound("x".to_string())),
            None
        );
    }
}
