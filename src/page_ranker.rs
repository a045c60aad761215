use crate::models::{CrawlResult, PageRecord, RankedPage};
use crate::scoring::{RankingWeights, ScoringProfile};
use std::collections::HashMap;

pub const DEFAULT_TOP_N: usize = 20;

/// Scores every crawled page and returns the `top_n` most important,
/// highest score first. Equal scores keep traversal order.
pub fn rank(crawl: &CrawlResult, top_n: usize, profile: &ScoringProfile) -> Vec<RankedPage> {
    let (inbound, outbound) = link_counts(&crawl.pages);

    let mut ranked: Vec<RankedPage> = crawl
        .pages
        .iter()
        .enumerate()
        .map(|(i, page)| RankedPage {
            url: page.url.clone(),
            title: page.title.clone(),
            is_homepage: page.is_homepage,
            depth: page.depth,
            score: page_score(page, inbound[i], &profile.ranking),
            inbound_links: inbound[i],
            outbound_links: outbound[i],
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(top_n);

    tracing::debug!(ranked = ranked.len(), top_n, "Ranked pages");
    ranked
}

/// Inbound and outbound counts per page index, over internal followed links
/// whose target is a crawled page. Targets match with or without a trailing
/// slash.
fn link_counts(pages: &[PageRecord]) -> (Vec<usize>, Vec<usize>) {
    let mut by_url: HashMap<&str, usize> = HashMap::new();
    for (i, page) in pages.iter().enumerate() {
        by_url.entry(page.url.trim_end_matches('/')).or_insert(i);
    }

    let mut inbound = vec![0; pages.len()];
    let mut outbound = vec![0; pages.len()];
    for (source, page) in pages.iter().enumerate() {
        for link in page.links.iter().filter(|l| l.is_internal && l.is_followed) {
            if let Some(&target) = by_url.get(link.url.trim_end_matches('/')) {
                inbound[target] += 1;
                outbound[source] += 1;
            }
        }
    }

    (inbound, outbound)
}

fn longer_than(value: Option<&str>, min: usize) -> bool {
    value.is_some_and(|v| v.chars().count() > min)
}

pub fn page_score(page: &PageRecord, inbound: usize, w: &RankingWeights) -> u32 {
    let mut score = 0;

    if page.is_homepage {
        score += w.homepage;
    }

    let depth_penalty = (page.depth as u32).saturating_mul(w.depth_step);
    score += w.depth_base.saturating_sub(depth_penalty);

    let inbound = u32::try_from(inbound).unwrap_or(u32::MAX);
    score += inbound.saturating_mul(w.per_inbound_link).min(w.max_inbound);

    if longer_than(page.title.as_deref(), w.title_min_len) {
        score += w.field_bonus;
    }
    if longer_than(page.meta_description.as_deref(), w.meta_min_len) {
        score += w.field_bonus;
    }
    if longer_than(page.h1.as_deref(), w.h1_min_len) {
        score += w.field_bonus;
    }

    let content_len = page.content.chars().count();
    if content_len > w.long_content.0 {
        score += w.long_content.1;
    } else if content_len > w.medium_content.0 {
        score += w.medium_content.1;
    }

    score
}
