mod site;

use seoaudit::page_ranker::{page_score, rank};
use seoaudit::scoring::ScoringProfile;
use site::{crawl_of, link, page, url};

#[test]
fn test_homepage_outranks_deep_page() {
    let profile = ScoringProfile::default();
    let mut home = page("/", 0);
    let mut deep = page("/shop/item", 2);
    deep.content = "x".repeat(200);
    home.links = vec![link(&home, "/shop/item")];

    let mut pages = vec![home];
    for i in 0..5 {
        let mut child = page(&format!("/p{}", i), 1);
        child.links = vec![link(&child, "/")];
        pages.push(child);
    }
    pages.push(deep);
    let crawl = crawl_of(pages);

    let ranked = rank(&crawl, 20, &profile);

    assert_eq!(ranked[0].url, url("/"));
    assert_eq!(ranked[0].inbound_links, 5);
    assert_eq!(ranked[0].score, 120);

    let deep = ranked.iter().find(|r| r.url == url("/shop/item")).unwrap();
    assert_eq!(deep.inbound_links, 1);
    assert_eq!(deep.score, 8);
}

#[test]
fn test_equal_scores_keep_traversal_order() {
    let crawl = crawl_of(vec![
        page("/", 0),
        page("/first", 1),
        page("/second", 1),
        page("/third", 1),
    ]);

    let ranked = rank(&crawl, 20, &ScoringProfile::default());

    let urls: Vec<&str> = ranked.iter().map(|r| r.url.as_str()).collect();
    assert_eq!(
        urls,
        vec![url("/"), url("/first"), url("/second"), url("/third")]
    );
}

#[test]
fn test_top_n_truncates() {
    let pages = (0..30).map(|i| page(&format!("/p{}", i), 1)).collect();
    let crawl = crawl_of(pages);

    assert_eq!(rank(&crawl, 20, &ScoringProfile::default()).len(), 20);
    assert_eq!(rank(&crawl, 3, &ScoringProfile::default()).len(), 3);
}

#[test]
fn test_field_and_content_bonuses() {
    let weights = ScoringProfile::default().ranking;
    let mut rich = page("/guide", 1);
    rich.title = Some("A complete guide".to_string());
    rich.meta_description =
        Some("Everything you need to know about glazing stoneware at home.".to_string());
    rich.h1 = Some("Glazing guide".to_string());
    rich.content = "y".repeat(1200);

    // 8 (depth 1) + 15 (title, meta, h1) + 10 (long content) + 4 (two inbound)
    assert_eq!(page_score(&rich, 2, &weights), 37);
}

#[test]
fn test_inbound_bonus_is_capped() {
    let weights = ScoringProfile::default().ranking;
    let hub = page("/hub", 1);

    assert_eq!(page_score(&hub, 1_000, &weights), 8 + 50);
}
