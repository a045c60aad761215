//! Site-level technical SEO checks over a finished crawl.
//!
//! Every check produces a [`TechnicalCheck`] and never fails: missing or
//! malformed inputs turn into an issue with a zero score for that category.

use crate::models::{
    CoverageFacts, CrawlResult, LinkStats, PageRecord, RedirectFact, RobotsTxtFacts,
    SecurityFacts, SitemapFacts, StructureFacts, TechnicalAudit, TechnicalCategory,
    TechnicalCheck,
};
use crate::probe::{CoreWebVitals, ExternalSignals, Metric, PageSpeed, Rating};
use crate::robots::RobotsTxt;
use crate::scoring::{LengthRange, ScoringProfile, TechnicalThresholds};
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use sitemap::structs::LastMod;
use std::collections::BTreeMap;
use std::io::Cursor;

pub fn check_site(
    crawl: &CrawlResult,
    signals: &ExternalSignals,
    profile: &ScoringProfile,
) -> TechnicalAudit {
    let t = &profile.technical;
    tracing::info!(url = %crawl.site.url, pages = crawl.pages.len(), "Running technical checks");

    let (robots_txt, robots_check) = check_robots_txt(crawl, t);
    let (sitemap, sitemap_check) = check_sitemap(crawl, t);
    let (structure, structure_check) = check_site_structure(&crawl.pages, t);
    let cwv_check = check_core_web_vitals(signals.core_web_vitals.as_ref(), t);
    let (redirects, redirect_check) = check_redirects(crawl, t);
    let coverage = coverage_facts(&crawl.pages, t);
    let canonical_check = check_canonical(&crawl.pages, &coverage);
    let meta_check = check_meta_tags(&crawl.pages, t);
    let structured_check = check_structured_data(&crawl.pages, &coverage);
    let (link_stats, links_check) = check_links(&crawl.pages, t);
    let mobile_check = check_mobile_friendly(&crawl.pages, &coverage, signals.mobile_friendly);
    let security = SecurityFacts {
        is_https: crawl.site.url.starts_with("https://"),
        has_hsts: crawl.technical.has_hsts,
    };
    let security_check = check_security(&security);
    let speed_check = check_page_speed(signals.page_speed.as_ref(), t);

    let checks = vec![
        robots_check,
        sitemap_check,
        structure_check,
        cwv_check,
        redirect_check,
        canonical_check,
        meta_check,
        structured_check,
        links_check,
        mobile_check,
        security_check,
        speed_check,
    ];

    for check in &checks {
        tracing::debug!(
            category = %check.category,
            score = check.score,
            issues = check.issues.len(),
            "Technical check"
        );
    }

    TechnicalAudit {
        site_url: crawl.site.url.clone(),
        robots_txt,
        sitemap,
        structure,
        redirects,
        link_stats,
        coverage,
        security,
        core_web_vitals: signals.core_web_vitals.clone(),
        page_speed: signals.page_speed.clone(),
        checks,
    }
}

/// `part / whole * 100`, or 0 when there is nothing to measure.
fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

fn penalized(mut check: TechnicalCheck, penalty: f64) -> TechnicalCheck {
    check.score = 100.0 - penalty * check.issues.len() as f64;
    check.capped(100.0)
}

fn no_pages(category: TechnicalCategory) -> TechnicalCheck {
    let mut check = TechnicalCheck::new(category);
    check.flag(
        "No pages were crawled, nothing to measure",
        "Make sure the site's pages are reachable and return HTML",
    );
    check
}

fn check_robots_txt(crawl: &CrawlResult, t: &TechnicalThresholds) -> (RobotsTxtFacts, TechnicalCheck) {
    let snapshot = &crawl.technical;
    let mut facts = RobotsTxtFacts {
        exists: snapshot.has_robots_txt,
        url: snapshot.robots_txt_url.clone(),
        content: snapshot.robots_txt_content.clone(),
        ..RobotsTxtFacts::default()
    };
    let mut check = TechnicalCheck::new(TechnicalCategory::RobotsTxt);

    let content = match (&snapshot.robots_txt_content, snapshot.has_robots_txt) {
        (Some(content), true) => content,
        _ => {
            check.flag(
                "missing robots.txt",
                "Add a robots.txt file to control how search engines crawl the site",
            );
            return (facts, check);
        }
    };

    let robots = RobotsTxt::parse(content);
    facts.sitemap_directives = robots.sitemaps().to_vec();
    facts.blocked_paths = t
        .important_paths
        .iter()
        .filter(|path| !robots.is_allowed(path, "*"))
        .map(|path| path.to_string())
        .collect();

    if facts.sitemap_directives.is_empty() {
        check.flag(
            "robots.txt has no Sitemap directive",
            "Add a Sitemap: line to robots.txt so crawlers can find the sitemap",
        );
    }
    if !facts.blocked_paths.is_empty() {
        check.flag(
            format!(
                "robots.txt blocks important paths: {}",
                facts.blocked_paths.join(", ")
            ),
            "Allow important pages in robots.txt so they can be indexed",
        );
    }

    (facts, penalized(check, t.issue_penalty))
}

fn check_sitemap(crawl: &CrawlResult, t: &TechnicalThresholds) -> (SitemapFacts, TechnicalCheck) {
    let snapshot = &crawl.technical;
    let mut facts = SitemapFacts {
        exists: snapshot.has_sitemap,
        url: snapshot.sitemap_url.clone(),
        ..SitemapFacts::default()
    };
    let mut check = TechnicalCheck::new(TechnicalCategory::Sitemap);

    let content = match (&snapshot.sitemap_content, snapshot.has_sitemap) {
        (Some(content), true) => content,
        _ => {
            check.flag(
                "missing sitemap.xml",
                "Publish a sitemap.xml listing the site's important URLs",
            );
            return (facts, check);
        }
    };

    let mut parse_error = None;
    for entity in SiteMapReader::new(Cursor::new(content.as_bytes())) {
        match entity {
            SiteMapEntity::Url(entry) => {
                facts.urls_count += 1;
                if !matches!(entry.lastmod, LastMod::None) {
                    facts.urls_with_lastmod += 1;
                }
            }
            SiteMapEntity::SiteMap(_) => facts.child_sitemaps += 1,
            SiteMapEntity::Err(e) => {
                parse_error.get_or_insert_with(|| format!("{:?}", e));
            }
        }
    }

    if let Some(error) = parse_error {
        tracing::warn!(url = ?facts.url, error = %error, "Sitemap could not be parsed");
        check.flag(
            format!("sitemap.xml could not be parsed: {}", error),
            "Fix the sitemap so it is valid XML",
        );
    }
    if facts.urls_count == 0 && facts.child_sitemaps == 0 {
        check.flag(
            "sitemap.xml lists no URLs",
            "Include every important URL of the site in the sitemap",
        );
    }
    if facts.urls_count > 0
        && (facts.urls_with_lastmod as f64) < facts.urls_count as f64 * t.min_lastmod_ratio
    {
        check.flag(
            format!(
                "Only {} of {} sitemap URLs carry a lastmod date",
                facts.urls_with_lastmod, facts.urls_count
            ),
            "Add lastmod to sitemap entries so crawlers notice updated content",
        );
    }

    (facts, penalized(check, t.issue_penalty))
}

fn check_site_structure(
    pages: &[PageRecord],
    t: &TechnicalThresholds,
) -> (StructureFacts, TechnicalCheck) {
    let mut distribution: BTreeMap<usize, usize> = BTreeMap::new();
    for page in pages {
        *distribution.entry(page.depth).or_default() += 1;
    }
    let facts = StructureFacts {
        total_pages: pages.len(),
        max_depth: distribution.keys().next_back().copied().unwrap_or(0),
        depth_distribution: distribution,
    };

    if pages.is_empty() {
        return (facts, no_pages(TechnicalCategory::SiteStructure));
    }

    let mut check = TechnicalCheck::new(TechnicalCategory::SiteStructure);
    if facts.max_depth > t.max_recommended_depth {
        check.flag(
            format!(
                "Deepest page is {} clicks from the homepage (recommended: {} or fewer)",
                facts.max_depth, t.max_recommended_depth
            ),
            "Flatten the site structure so important pages are within a few clicks of the homepage",
        );
    }

    let deep_pages: usize = facts
        .depth_distribution
        .range(t.deep_page_depth..)
        .map(|(_, count)| count)
        .sum();
    let deep_ratio = deep_pages as f64 / facts.total_pages as f64;
    if deep_ratio > t.max_deep_page_ratio {
        check.flag(
            format!(
                "{:.2}% of pages sit at depth {} or deeper",
                deep_ratio * 100.0,
                t.deep_page_depth
            ),
            "Improve internal linking so deep pages are easier to reach",
        );
    }

    (facts, penalized(check, t.issue_penalty))
}

fn metric_points(
    check: &mut TechnicalCheck,
    name: &str,
    metric: Option<&Metric>,
    points: f64,
    recommendation: &str,
) {
    match metric {
        Some(metric) => match metric.rating {
            Rating::Good => check.add(points),
            Rating::NeedsImprovement => {
                check.add(points / 2.0);
                check.flag(
                    format!("{} ({}) needs improvement", name, metric.value),
                    recommendation,
                );
            }
            Rating::Poor => check.flag(format!("{} ({}) is poor", name, metric.value), recommendation),
        },
        None => check.flag(format!("{} was not measured", name), recommendation),
    }
}

fn check_core_web_vitals(cwv: Option<&CoreWebVitals>, t: &TechnicalThresholds) -> TechnicalCheck {
    let mut check = TechnicalCheck::new(TechnicalCategory::CoreWebVitals);
    let Some(cwv) = cwv else {
        check.flag(
            "Core Web Vitals measurements are unavailable",
            "Measure LCP, FID and CLS with a field or lab performance tool",
        );
        return check;
    };

    let points = &t.cwv_points;
    metric_points(
        &mut check,
        "LCP",
        cwv.lcp.as_ref(),
        points.lcp,
        "Speed up server responses, remove render-blocking resources and optimize images",
    );
    metric_points(
        &mut check,
        "FID",
        cwv.fid.as_ref(),
        points.fid,
        "Break up long tasks and reduce JavaScript execution time",
    );
    metric_points(
        &mut check,
        "CLS",
        cwv.cls.as_ref(),
        points.cls,
        "Reserve space for images and dynamic content to avoid layout shifts",
    );

    check.capped(100.0)
}

fn check_redirects(
    crawl: &CrawlResult,
    t: &TechnicalThresholds,
) -> (Vec<RedirectFact>, TechnicalCheck) {
    let is_counted = |status: u16| matches!(status, 301 | 302);

    let redirects: Vec<RedirectFact> = crawl
        .pages
        .iter()
        .filter(|page| is_counted(page.status_code))
        .map(|page| RedirectFact {
            url: page.url.clone(),
            status_code: page.status_code,
        })
        .chain(crawl.skipped.iter().filter_map(|skip| {
            skip.status_code
                .filter(|status| is_counted(*status))
                .map(|status_code| RedirectFact {
                    url: skip.url.clone(),
                    status_code,
                })
        }))
        .collect();

    let mut check = TechnicalCheck::new(TechnicalCategory::Redirects);
    if redirects.len() > t.max_redirects {
        check.flag(
            format!("Too many redirects ({})", redirects.len()),
            "Remove unnecessary redirects and link to final URLs directly",
        );
    }

    (redirects, penalized(check, t.issue_penalty))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum MetaProblem {
    MissingTitle,
    ShortTitle,
    LongTitle,
    MissingDescription,
    ShortDescription,
    LongDescription,
}

impl MetaProblem {
    fn describe(&self) -> &'static str {
        match self {
            MetaProblem::MissingTitle => "missing title tag",
            MetaProblem::ShortTitle => "title too short",
            MetaProblem::LongTitle => "title too long",
            MetaProblem::MissingDescription => "missing meta description",
            MetaProblem::ShortDescription => "meta description too short",
            MetaProblem::LongDescription => "meta description too long",
        }
    }

    fn is_title(&self) -> bool {
        matches!(
            self,
            MetaProblem::MissingTitle | MetaProblem::ShortTitle | MetaProblem::LongTitle
        )
    }
}

fn length_problem(
    value: Option<&str>,
    range: LengthRange,
    problems: [MetaProblem; 3],
) -> Option<MetaProblem> {
    let len = value.map(|v| v.chars().count()).unwrap_or(0);
    if len == 0 {
        Some(problems[0])
    } else if len < range.min {
        Some(problems[1])
    } else if len > range.max {
        Some(problems[2])
    } else {
        None
    }
}

fn meta_problems(page: &PageRecord, t: &TechnicalThresholds) -> Vec<MetaProblem> {
    let title = length_problem(
        page.title.as_deref(),
        t.title,
        [
            MetaProblem::MissingTitle,
            MetaProblem::ShortTitle,
            MetaProblem::LongTitle,
        ],
    );
    let description = length_problem(
        page.meta_description.as_deref(),
        t.meta_description,
        [
            MetaProblem::MissingDescription,
            MetaProblem::ShortDescription,
            MetaProblem::LongDescription,
        ],
    );
    title.into_iter().chain(description).collect()
}

fn coverage_facts(pages: &[PageRecord], t: &TechnicalThresholds) -> CoverageFacts {
    let mut facts = CoverageFacts::default();
    for page in pages {
        let signals = &page.signals;
        if signals.canonical_url.is_some() {
            facts.pages_with_canonical += 1;
        }
        if signals.has_structured_data {
            facts.pages_with_structured_data += 1;
        }
        for schema in &signals.structured_data_types {
            *facts.schema_types.entry(schema.clone()).or_default() += 1;
        }
        if signals.has_viewport {
            facts.pages_with_viewport += 1;
        }
        if !meta_problems(page, t).is_empty() {
            facts.pages_with_meta_issues += 1;
        }
    }
    facts
}

fn check_canonical(pages: &[PageRecord], coverage: &CoverageFacts) -> TechnicalCheck {
    if pages.is_empty() {
        return no_pages(TechnicalCategory::Canonical);
    }

    let mut check = TechnicalCheck::new(TechnicalCategory::Canonical)
        .with_score(percent(coverage.pages_with_canonical, pages.len()));
    let missing = pages.len() - coverage.pages_with_canonical;
    if missing > 0 {
        check.flag(
            format!("{} page(s) have no canonical tag", missing),
            "Add a canonical tag to every page to prevent duplicate content",
        );
    }
    check
}

fn check_meta_tags(pages: &[PageRecord], t: &TechnicalThresholds) -> TechnicalCheck {
    if pages.is_empty() {
        return no_pages(TechnicalCategory::MetaTags);
    }

    let mut counts: BTreeMap<MetaProblem, usize> = BTreeMap::new();
    let mut pages_with_issues = 0;
    for page in pages {
        let problems = meta_problems(page, t);
        if !problems.is_empty() {
            pages_with_issues += 1;
        }
        for problem in problems {
            *counts.entry(problem).or_default() += 1;
        }
    }

    let mut check = TechnicalCheck::new(TechnicalCategory::MetaTags)
        .with_score(100.0 - percent(pages_with_issues, pages.len()));

    for (problem, count) in &counts {
        let ratio = *count as f64 / pages.len() as f64;
        if ratio > t.common_issue_ratio {
            check.issues.push(format!(
                "{}: {} page(s) ({:.2}%)",
                problem.describe(),
                count,
                ratio * 100.0
            ));
        }
    }

    if counts.keys().any(MetaProblem::is_title) {
        check.recommendations.push(format!(
            "Give every page a unique, descriptive title of {}-{} characters",
            t.title.min, t.title.max
        ));
    }
    if counts.keys().any(|p| !p.is_title()) {
        check.recommendations.push(format!(
            "Give every page a meta description of {}-{} characters",
            t.meta_description.min, t.meta_description.max
        ));
    }

    check.capped(100.0)
}

fn check_structured_data(pages: &[PageRecord], coverage: &CoverageFacts) -> TechnicalCheck {
    if pages.is_empty() {
        return no_pages(TechnicalCategory::StructuredData);
    }

    let mut check = TechnicalCheck::new(TechnicalCategory::StructuredData)
        .with_score(percent(coverage.pages_with_structured_data, pages.len()));
    if coverage.pages_with_structured_data == 0 {
        check.flag(
            "No structured data (Schema.org) found",
            "Add Schema.org markup to key pages to enable rich results",
        );
    } else if coverage.pages_with_structured_data < pages.len() {
        check.flag(
            format!(
                "{} page(s) have no structured data",
                pages.len() - coverage.pages_with_structured_data
            ),
            "Extend Schema.org markup to the remaining pages",
        );
    }
    check
}

fn check_links(pages: &[PageRecord], t: &TechnicalThresholds) -> (LinkStats, TechnicalCheck) {
    let mut stats = LinkStats::default();
    for link in pages.iter().flat_map(|page| page.links.iter()) {
        if link.is_internal {
            stats.internal += 1;
        } else {
            stats.external += 1;
        }
        if !link.is_followed {
            stats.nofollow += 1;
        }
    }
    stats.avg_internal_per_page = stats.internal as f64 / pages.len().max(1) as f64;

    let mut check = TechnicalCheck::new(TechnicalCategory::Links);
    if stats.avg_internal_per_page < t.min_avg_internal_links {
        check.flag(
            format!(
                "Few internal links per page ({:.2} on average)",
                stats.avg_internal_per_page
            ),
            "Link related pages to each other to improve navigation and crawlability",
        );
    }

    let total = stats.internal + stats.external;
    let external_ratio = if total == 0 {
        0.0
    } else {
        stats.external as f64 / total as f64
    };
    if external_ratio > t.max_external_link_ratio {
        check.flag(
            format!("High share of external links ({:.2}%)", external_ratio * 100.0),
            "Balance outbound links with more internal links",
        );
    }

    (stats, penalized(check, t.issue_penalty))
}

fn check_mobile_friendly(
    pages: &[PageRecord],
    coverage: &CoverageFacts,
    verdict: Option<bool>,
) -> TechnicalCheck {
    let mut check = TechnicalCheck::new(TechnicalCategory::MobileFriendly);
    let recommendation = "Use a responsive layout with a viewport meta tag";

    match verdict {
        Some(true) => check.with_score(100.0),
        Some(false) => {
            check.flag("The site is not mobile friendly", recommendation);
            check
        }
        None if pages.is_empty() => no_pages(TechnicalCategory::MobileFriendly),
        None => {
            let missing = pages.len() - coverage.pages_with_viewport;
            if missing > 0 {
                check.flag(
                    format!("{} page(s) have no viewport meta tag", missing),
                    recommendation,
                );
            }
            check.with_score(percent(coverage.pages_with_viewport, pages.len()))
        }
    }
}

fn check_security(facts: &SecurityFacts) -> TechnicalCheck {
    let mut check = TechnicalCheck::new(TechnicalCategory::Security);
    if facts.is_https {
        check.add(50.0);
    } else {
        check.flag(
            "The site is not served over HTTPS",
            "Serve every page over HTTPS",
        );
    }
    if facts.has_hsts {
        check.add(50.0);
    } else {
        check.flag(
            "HSTS (Strict-Transport-Security) is not enabled",
            "Send a Strict-Transport-Security header from the homepage",
        );
    }
    check
}

fn check_page_speed(speed: Option<&PageSpeed>, t: &TechnicalThresholds) -> TechnicalCheck {
    let mut check = TechnicalCheck::new(TechnicalCategory::PageSpeed);
    let Some(speed) = speed else {
        check.flag(
            "Page speed scores are unavailable",
            "Measure mobile and desktop page speed with a performance tool",
        );
        return check;
    };

    if speed.mobile_score < t.min_mobile_speed {
        check.flag(
            format!("Mobile page speed score is low ({})", speed.mobile_score),
            "Optimize images, minify scripts and styles and enable browser caching",
        );
    }
    if speed.desktop_score < t.min_desktop_speed {
        check.flag(
            format!("Desktop page speed score is low ({})", speed.desktop_score),
            "Reduce server response time and remove render-blocking resources",
        );
    }

    check
        .with_score((speed.mobile_score + speed.desktop_score) / 2.0)
        .capped(100.0)
}
