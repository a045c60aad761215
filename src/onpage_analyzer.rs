//! Per-page on-page SEO analysis.
//!
//! Works from the stored [`PageRecord`] only: the page signals captured at
//! extraction time stand in for a second pass over the HTML.

use crate::error::{AuditError, Result};
use crate::models::{
    CrawlResult, KeywordRecord, OnPageCategory, OnPageCheck, OnPageFinding, PageRecord,
    RankedPage,
};
use crate::scoring::{LengthRange, OnPageThresholds, ScoringProfile};
use url::Url;

const TOP_KEYWORDS_REPORTED: usize = 10;

/// Analyzes the crawled page at `url`.
pub fn analyze_page(
    crawl: &CrawlResult,
    url: &str,
    profile: &ScoringProfile,
) -> Result<OnPageFinding> {
    let page = crawl
        .page(url)
        .ok_or_else(|| AuditError::PageNotFound(url.to_string()))?;
    Ok(analyze_record(page, &profile.onpage))
}

/// Analyzes each ranked page in rank order.
pub fn analyze_ranked(
    crawl: &CrawlResult,
    ranked: &[RankedPage],
    profile: &ScoringProfile,
) -> Result<Vec<OnPageFinding>> {
    ranked
        .iter()
        .map(|r| analyze_page(crawl, &r.url, profile))
        .collect()
}

pub fn analyze_record(page: &PageRecord, t: &OnPageThresholds) -> OnPageFinding {
    let keyword = page.top_keyword();
    let internal = page.links.iter().filter(|l| l.is_internal).count();
    let external = page.links.len() - internal;

    let checks: Vec<OnPageCheck> = vec![
        analyze_title(page, keyword, t),
        analyze_meta_description(page, keyword, t),
        analyze_url(page, keyword, t),
        analyze_headings(page, keyword, t),
        analyze_content(page, keyword, t),
        analyze_images(page),
        analyze_links(page, internal, external, t),
        analyze_mobile(page),
        analyze_social_tags(page),
    ]
    .into_iter()
    .map(|check| check.capped(t.category_cap))
    .collect();

    let score = checks.iter().map(|c| c.score).sum::<f64>().min(100.0);
    let issues = checks.iter().flat_map(|c| c.issues.iter().cloned()).collect();
    let recommendations = checks
        .iter()
        .flat_map(|c| c.recommendations.iter().cloned())
        .collect();

    tracing::debug!(url = %page.url, score, "Analyzed page");

    OnPageFinding {
        page_url: page.url.clone(),
        score,
        checks,
        issues,
        recommendations,
        internal_links_count: internal,
        external_links_count: external,
        top_keywords: page
            .keywords
            .iter()
            .take(TOP_KEYWORDS_REPORTED)
            .cloned()
            .collect(),
        readability: page.readability.clone(),
    }
}

fn contains_keyword(haystack: &str, keyword: &KeywordRecord) -> bool {
    haystack.to_lowercase().contains(&keyword.keyword.to_lowercase())
}

/// Shared shape of the title and meta description checks.
fn analyze_text_field(
    category: OnPageCategory,
    label: &str,
    value: Option<&str>,
    range: LengthRange,
    keyword: Option<&KeywordRecord>,
) -> OnPageCheck {
    let mut check = OnPageCheck::new(category);
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        check.flag(
            format!("Page has no {}", label),
            format!("Add a descriptive {} containing the main keyword", label),
        );
        return check;
    };

    let len = value.chars().count();
    if len < range.min {
        check.add(5.0);
        check.flag(
            format!("{} is too short ({} chars)", capitalize(label), len),
            format!("Lengthen the {} to {}-{} characters", label, range.min, range.max),
        );
    } else if len > range.max {
        check.add(5.0);
        check.flag(
            format!("{} is too long ({} chars)", capitalize(label), len),
            format!("Shorten the {} to at most {} characters", label, range.max),
        );
    } else {
        check.add(10.0);
    }

    if let Some(keyword) = keyword {
        if contains_keyword(value, keyword) {
            check.add(5.0);
        } else {
            check.flag(
                format!("{} does not contain the main keyword \"{}\"", capitalize(label), keyword.keyword),
                format!("Include the main keyword in the {}", label),
            );
        }
    }

    check
}

fn capitalize(label: &str) -> String {
    let mut chars = label.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn analyze_title(page: &PageRecord, keyword: Option<&KeywordRecord>, t: &OnPageThresholds) -> OnPageCheck {
    analyze_text_field(OnPageCategory::Title, "title", page.title.as_deref(), t.title, keyword)
}

fn analyze_meta_description(
    page: &PageRecord,
    keyword: Option<&KeywordRecord>,
    t: &OnPageThresholds,
) -> OnPageCheck {
    analyze_text_field(
        OnPageCategory::MetaDescription,
        "meta description",
        page.meta_description.as_deref(),
        t.meta_description,
        keyword,
    )
}

/// The part of the URL after the host, without the leading slash. The query
/// string is included.
fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => {
            let mut path = parsed.path().trim_start_matches('/').to_string();
            if let Some(query) = parsed.query() {
                path.push('?');
                path.push_str(query);
            }
            path
        }
        Err(_) => url
            .split("://")
            .last()
            .and_then(|rest| rest.split_once('/'))
            .map(|(_, path)| path.to_string())
            .unwrap_or_default(),
    }
}

fn analyze_url(page: &PageRecord, keyword: Option<&KeywordRecord>, t: &OnPageThresholds) -> OnPageCheck {
    let mut check = OnPageCheck::new(OnPageCategory::Url);
    let path = url_path(&page.url);
    let len = path.chars().count();

    if len > t.max_url_length {
        check.flag(
            format!("URL is too long ({} chars)", len),
            "Use shorter, more concise URLs",
        );
    } else {
        check.add(5.0);
    }

    if path.chars().all(|c| c.is_ascii_alphanumeric() || c == '/' || c == '-') {
        check.add(5.0);
    } else {
        check.flag(
            "URL contains special characters",
            "Use only letters, digits and hyphens in URLs",
        );
    }

    if let Some(keyword) = keyword {
        if contains_keyword(&path, keyword) {
            check.add(5.0);
        } else {
            check.flag(
                format!("URL does not contain the main keyword \"{}\"", keyword.keyword),
                "Include the main keyword in the URL",
            );
        }
    }

    check
}

fn analyze_headings(page: &PageRecord, keyword: Option<&KeywordRecord>, t: &OnPageThresholds) -> OnPageCheck {
    let mut check = OnPageCheck::new(OnPageCategory::Headings);

    match page.h1.as_deref().filter(|h1| !h1.is_empty()) {
        None => check.flag(
            "Page has no H1 heading",
            "Add an H1 heading containing the main keyword",
        ),
        Some(h1) => {
            check.add(5.0);

            let len = h1.chars().count();
            if len < t.h1.min {
                check.flag(
                    format!("H1 is too short ({} chars)", len),
                    "Make the H1 more descriptive and include the main keyword",
                );
            } else if len > t.h1.max {
                check.flag(
                    format!("H1 is too long ({} chars)", len),
                    "Make the H1 more concise while keeping the main keyword",
                );
            } else {
                check.add(5.0);
            }

            if let Some(keyword) = keyword {
                if contains_keyword(h1, keyword) {
                    check.add(5.0);
                } else {
                    check.flag(
                        format!("H1 does not contain the main keyword \"{}\"", keyword.keyword),
                        "Include the main keyword in the H1",
                    );
                }
            }
        }
    }

    if page.signals.h2_count > 0 {
        check.add(5.0);
    } else {
        check.flag(
            "Page has no H2 subheadings",
            "Structure the content with H2 subheadings",
        );
    }

    check
}

fn analyze_content(page: &PageRecord, keyword: Option<&KeywordRecord>, t: &OnPageThresholds) -> OnPageCheck {
    let mut check = OnPageCheck::new(OnPageCategory::Content);
    if page.content.trim().is_empty() {
        check.flag(
            "Page has no content",
            "Add useful, relevant content to the page",
        );
        return check;
    }

    let words = page.word_count();
    if words < t.low_word_count {
        check.add(2.0);
        check.flag(
            format!("Content is thin ({} words)", words),
            format!("Expand the content to at least {} words", t.low_word_count),
        );
    } else if words < t.high_word_count {
        check.add(5.0);
    } else {
        check.add(10.0);
    }

    if let Some(keyword) = keyword {
        if keyword.density < t.min_density {
            check.flag(
                format!("Main keyword \"{}\" density is too low ({}%)", keyword.keyword, keyword.density),
                format!("Keep the main keyword density between {}% and {}%", t.min_density, t.max_density),
            );
        } else if keyword.density > t.max_density {
            check.flag(
                format!("Main keyword \"{}\" density is too high ({}%)", keyword.keyword, keyword.density),
                format!(
                    "Avoid keyword stuffing and keep the density between {}% and {}%",
                    t.min_density, t.max_density
                ),
            );
        } else {
            check.add(5.0);
        }
    }

    let avg_paragraph = words as f64 / page.signals.paragraph_count.max(1) as f64;
    if avg_paragraph > t.max_paragraph_words {
        check.flag(
            format!("Paragraphs are long ({:.1} words on average)", avg_paragraph),
            "Split long paragraphs to improve readability",
        );
    } else {
        check.add(5.0);
    }

    check
}

fn analyze_images(page: &PageRecord) -> OnPageCheck {
    let mut check = OnPageCheck::new(OnPageCategory::Images);
    let signals = &page.signals;
    if signals.image_count == 0 {
        return check.with_score(10.0);
    }

    let with_alt = signals.image_count - signals.images_missing_alt.min(signals.image_count);
    check.add((10.0 * with_alt as f64 / signals.image_count as f64).round());
    if signals.images_missing_alt > 0 {
        check.flag(
            format!("{} image(s) missing alt text", signals.images_missing_alt),
            "Add descriptive alt text to every image",
        );
    }
    check
}

fn analyze_links(page: &PageRecord, internal: usize, external: usize, t: &OnPageThresholds) -> OnPageCheck {
    let mut check = OnPageCheck::new(OnPageCategory::Links);

    if internal < t.min_internal_links {
        check.flag(
            format!("Too few internal links ({})", internal),
            "Add more internal links to related pages",
        );
    } else {
        check.add(5.0);
    }

    if external > internal * t.max_external_per_internal {
        check.flag(
            format!(
                "External links far outnumber internal links (external: {}, internal: {})",
                external, internal
            ),
            "Reduce external links and link to your own pages more",
        );
    } else {
        check.add(5.0);
    }

    let empty_anchors = page.links.iter().filter(|l| l.text.trim().is_empty()).count();
    if empty_anchors > 0 {
        check.flag(
            format!("{} link(s) have no anchor text", empty_anchors),
            "Use descriptive anchor text for every link",
        );
    } else {
        check.add(5.0);
    }

    check
}

fn analyze_mobile(page: &PageRecord) -> OnPageCheck {
    let mut check = OnPageCheck::new(OnPageCategory::MobileFriendly);
    if page.signals.has_viewport {
        check.add(10.0);
    } else {
        check.flag(
            "Page has no viewport meta tag",
            "Add <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">",
        );
    }
    check
}

fn analyze_social_tags(page: &PageRecord) -> OnPageCheck {
    let mut check = OnPageCheck::new(OnPageCategory::SocialTags);
    let signals = &page.signals;

    match signals.open_graph.essential_count() {
        3 => check.add(5.0),
        0 => check.flag(
            "Page has no Open Graph tags",
            "Add og:title, og:description and og:image for social sharing",
        ),
        _ => {
            check.add(2.0);
            check.flag(
                "Page is missing some Open Graph tags",
                "Complete og:title, og:description and og:image",
            );
        }
    }

    if signals.has_twitter_card {
        check.add(5.0);
    } else {
        check.flag(
            "Page has no Twitter Card tags",
            "Add a twitter:card meta tag",
        );
    }

    check
}
