mod site;

use seoaudit::error::AuditError;
use seoaudit::models::OnPageCategory;
use seoaudit::onpage_analyzer::{analyze_page, analyze_ranked};
use seoaudit::page_ranker::rank;
use seoaudit::scoring::ScoringProfile;
use site::{crawl_of, link, page, url, with_content};

const CONTENT: &str = "ceramic mugs ceramic bowls ceramic plates glaze kiln";

#[test]
fn test_title_in_range_with_keyword_scores_full() {
    let mut home = with_content(page("/", 0), CONTENT);
    home.title = Some("Handmade ceramic mugs and bowls for every day".to_string());
    assert_eq!(home.title.as_ref().unwrap().chars().count(), 45);
    assert_eq!(home.top_keyword().unwrap().keyword, "ceramic");
    let crawl = crawl_of(vec![home]);

    let finding = analyze_page(&crawl, &url("/"), &ScoringProfile::default()).unwrap();

    let title = finding.check(OnPageCategory::Title).unwrap();
    assert_eq!(title.score, 15.0);
    assert!(title.issues.is_empty());
}

#[test]
fn test_finding_reports_page_readability() {
    let home = with_content(page("/", 0), "Ceramic mugs. Ceramic bowls fired in a kiln.");
    let expected = home.readability.clone();
    assert_eq!(expected.sentence_count, 2);
    let crawl = crawl_of(vec![home]);

    let finding = analyze_page(&crawl, &url("/"), &ScoringProfile::default()).unwrap();

    assert_eq!(finding.readability, expected);
    assert_eq!(finding.readability.avg_sentence_length, 4.0);
}

#[test]
fn test_title_without_keyword_loses_keyword_points() {
    let mut home = with_content(page("/", 0), CONTENT);
    home.title = Some("A studio making things by hand since 1987".to_string());
    let crawl = crawl_of(vec![home]);

    let finding = analyze_page(&crawl, &url("/"), &ScoringProfile::default()).unwrap();

    let title = finding.check(OnPageCategory::Title).unwrap();
    assert_eq!(title.score, 10.0);
    assert_eq!(title.issues.len(), 1);
}

#[test]
fn test_missing_title_scores_zero() {
    let crawl = crawl_of(vec![with_content(page("/", 0), CONTENT)]);

    let finding = analyze_page(&crawl, &url("/"), &ScoringProfile::default()).unwrap();

    assert_eq!(finding.check(OnPageCategory::Title).unwrap().score, 0.0);
    assert!(finding.issues.iter().any(|i| i.contains("no title")));
}

#[test]
fn test_unknown_page_is_an_error() {
    let crawl = crawl_of(vec![page("/", 0)]);

    let err = analyze_page(&crawl, &url("/nowhere"), &ScoringProfile::default()).unwrap_err();
    assert!(matches!(err, AuditError::PageNotFound(ref u) if u == &url("/nowhere")));
}

#[test]
fn test_lookup_tolerates_trailing_slash() {
    let crawl = crawl_of(vec![page("/", 0), page("/about/", 1)]);
    let profile = ScoringProfile::default();

    assert!(analyze_page(&crawl, "https://example.com", &profile).is_ok());
    assert!(analyze_page(&crawl, &url("/about"), &profile).is_ok());
}

#[test]
fn test_score_bounds() {
    let mut rich = with_content(page("/", 0), &"ceramic studio ".repeat(400));
    rich.title = Some("Ceramic studio - Handmade mugs, bowls and plates".to_string());
    rich.meta_description = Some(
        "Our ceramic studio makes mugs, bowls and plates by hand, glazed and fired in small batches."
            .to_string(),
    );
    rich.h1 = Some("Handmade ceramic tableware".to_string());
    rich.signals.has_viewport = true;
    rich.signals.h2_count = 3;
    let crawl = crawl_of(vec![rich, page("/bare", 1)]);
    let profile = ScoringProfile::default();

    for target in ["/", "/bare"] {
        let finding = analyze_page(&crawl, &url(target), &profile).unwrap();
        assert!((0.0..=100.0).contains(&finding.score));
        assert_eq!(finding.checks.len(), 9);
        for check in &finding.checks {
            assert!(
                (0.0..=15.0).contains(&check.score),
                "{} scored {}",
                check.category,
                check.score
            );
        }
    }
}

#[test]
fn test_link_counts_and_top_keywords() {
    let mut home = with_content(
        page("/", 0),
        "one two three four five six seven eight nine ten eleven twelve",
    );
    home.links = vec![
        link(&home, "/a"),
        link(&home, "/b"),
        link(&home, "https://other.org/"),
    ];
    let crawl = crawl_of(vec![home]);

    let finding = analyze_page(&crawl, &url("/"), &ScoringProfile::default()).unwrap();

    assert_eq!(finding.internal_links_count, 2);
    assert_eq!(finding.external_links_count, 1);
    assert_eq!(finding.top_keywords.len(), 10);
}

#[test]
fn test_analyze_ranked_follows_rank_order() {
    let home = page("/", 0);
    let mut about = page("/about", 1);
    about.links = vec![link(&about, "/")];
    let crawl = crawl_of(vec![about, home]);
    let profile = ScoringProfile::default();

    let ranked = rank(&crawl, 10, &profile);
    let findings = analyze_ranked(&crawl, &ranked, &profile).unwrap();

    let urls: Vec<&str> = findings.iter().map(|f| f.page_url.as_str()).collect();
    assert_eq!(urls, vec![url("/"), url("/about")]);
}
