use crate::models::{LinkRecord, OpenGraphTags, PageSignals};
use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use url::Url;

// Cached selectors
static TITLE_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("title").expect("title selector should be valid"));
static META_DESC_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name='description']").expect("meta description selector should be valid")
});
static H1_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h1").expect("h1 selector should be valid"));
static H2_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h2").expect("h2 selector should be valid"));
static H3_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("h3").expect("h3 selector should be valid"));
static P_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("p").expect("p selector should be valid"));
static ANCHOR_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("a[href]").expect("a[href] selector should be valid"));
static IMG_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("img").expect("img selector should be valid"));
static CANONICAL_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("link[rel='canonical'][href]").expect("canonical selector should be valid")
});
static VIEWPORT_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name='viewport']").expect("viewport selector should be valid")
});
static OG_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[property^='og:']").expect("open graph selector should be valid")
});
static TWITTER_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("meta[name^='twitter:']").expect("twitter selector should be valid")
});
static JSON_LD_SELECTOR: Lazy<Selector> = Lazy::new(|| {
    Selector::parse("script[type='application/ld+json']").expect("json-ld selector should be valid")
});
static MICRODATA_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("[itemscope]").expect("microdata selector should be valid"));

/// Elements whose text never counts as visible content.
const HIDDEN_ELEMENTS: [&str; 5] = ["script", "style", "meta", "noscript", "template"];

#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub title: Option<String>,
    pub meta_description: Option<String>,
    pub h1: Option<String>,
    pub content: String,
    pub links: Vec<LinkRecord>,
    pub signals: PageSignals,
}

/// Parses HTML documents belonging to one site.
#[derive(Debug, Clone)]
pub struct Extractor {
    domain: String,
}

impl Extractor {
    pub fn new(domain: &str) -> Self {
        Self {
            domain: domain.to_lowercase(),
        }
    }

    /// Internal iff the host contains the site's domain. Subdomains and
    /// look-alike hosts such as `notexample.com` are classified as internal.
    pub fn is_internal(&self, url: &Url) -> bool {
        url.host_str()
            .is_some_and(|host| host.to_lowercase().contains(&self.domain))
    }

    pub fn extract(&self, html: &str, page_url: &Url) -> Extraction {
        let document = Html::parse_document(html);

        Extraction {
            title: first_text(&document, &TITLE_SELECTOR),
            meta_description: Self::extract_meta_description(&document),
            h1: first_text(&document, &H1_SELECTOR),
            content: Self::extract_text_content(&document),
            links: self.extract_links(&document, page_url),
            signals: Self::extract_signals(&document, page_url),
        }
    }

    fn extract_meta_description(document: &Html) -> Option<String> {
        document
            .select(&META_DESC_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("content"))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    }

    fn extract_text_content(document: &Html) -> String {
        let mut words: Vec<&str> = Vec::new();

        for node in document.root_element().descendants() {
            let Some(text) = node.value().as_text() else {
                continue;
            };
            let hidden = node.ancestors().any(|ancestor| {
                ancestor
                    .value()
                    .as_element()
                    .is_some_and(|el| HIDDEN_ELEMENTS.contains(&el.name()))
            });
            if !hidden {
                words.extend(text.split_whitespace());
            }
        }

        words.join(" ")
    }

    fn extract_links(&self, document: &Html, page_url: &Url) -> Vec<LinkRecord> {
        let mut links = Vec::new();

        for element in document.select(&ANCHOR_SELECTOR) {
            let Some(href) = element.value().attr("href").map(str::trim) else {
                continue;
            };
            if href.is_empty() {
                continue;
            }

            let Some(absolute_url) = resolve(page_url, href) else {
                tracing::debug!(href = %href, page = %page_url, "Skipping unresolvable link");
                continue;
            };

            let is_followed = !element.value().attr("rel").is_some_and(|rel| {
                rel.split_whitespace()
                    .any(|value| value.eq_ignore_ascii_case("nofollow"))
            });

            links.push(LinkRecord {
                source_url: page_url.to_string(),
                is_internal: self.is_internal(&absolute_url),
                url: absolute_url.to_string(),
                text: collapsed_text(&element),
                is_followed,
            });
        }

        links
    }

    fn extract_signals(document: &Html, page_url: &Url) -> PageSignals {
        let canonical_url = document
            .select(&CANONICAL_SELECTOR)
            .next()
            .and_then(|el| el.value().attr("href"))
            .and_then(|href| page_url.join(href.trim()).ok())
            .map(|url| url.to_string());

        let mut structured_data_types = Vec::new();
        let mut json_ld_blocks = 0;
        for script in document.select(&JSON_LD_SELECTOR) {
            json_ld_blocks += 1;
            let raw: String = script.text().collect();
            match serde_json::from_str::<serde_json::Value>(&raw) {
                Ok(value) => collect_schema_types(&value, &mut structured_data_types),
                Err(e) => tracing::debug!(page = %page_url, error = %e, "Malformed JSON-LD block"),
            }
        }
        let mut microdata_items = 0;
        for item in document.select(&MICRODATA_SELECTOR) {
            microdata_items += 1;
            if let Some(item_type) = item.value().attr("itemtype")
                && let Some(name) = item_type.trim_end_matches('/').rsplit('/').next()
                && !name.is_empty()
            {
                structured_data_types.push(name.to_string());
            }
        }
        structured_data_types.sort();
        structured_data_types.dedup();

        let mut open_graph = OpenGraphTags::default();
        for meta in document.select(&OG_SELECTOR) {
            let (Some(property), Some(content)) =
                (meta.value().attr("property"), meta.value().attr("content"))
            else {
                continue;
            };
            let content = Some(content.trim().to_string()).filter(|c| !c.is_empty());
            let slot = match property {
                "og:title" => &mut open_graph.og_title,
                "og:description" => &mut open_graph.og_description,
                "og:image" => &mut open_graph.og_image,
                "og:url" => &mut open_graph.og_url,
                "og:type" => &mut open_graph.og_type,
                _ => continue,
            };
            if slot.is_none() {
                *slot = content;
            }
        }

        let mut image_count = 0;
        let mut images_missing_alt = 0;
        for img in document.select(&IMG_SELECTOR) {
            image_count += 1;
            if img.value().attr("alt").is_none_or(|alt| alt.trim().is_empty()) {
                images_missing_alt += 1;
            }
        }

        PageSignals {
            canonical_url,
            has_structured_data: json_ld_blocks + microdata_items > 0,
            structured_data_types,
            has_viewport: document.select(&VIEWPORT_SELECTOR).next().is_some(),
            open_graph,
            has_twitter_card: document.select(&TWITTER_SELECTOR).next().is_some(),
            image_count,
            images_missing_alt,
            h2_count: document.select(&H2_SELECTOR).count(),
            h3_count: document.select(&H3_SELECTOR).count(),
            paragraph_count: document
                .select(&P_SELECTOR)
                .filter(|p| p.text().any(|t| !t.trim().is_empty()))
                .count(),
        }
    }
}

/// Resolves `href` against the page URL, dropping the fragment. Only
/// http(s) targets are kept.
pub fn resolve(page_url: &Url, href: &str) -> Option<Url> {
    let mut url = page_url.join(href).ok()?;
    if !matches!(url.scheme(), "http" | "https") {
        return None;
    }
    url.set_fragment(None);
    Some(url)
}

fn first_text(document: &Html, selector: &Selector) -> Option<String> {
    document
        .select(selector)
        .next()
        .map(|el| collapsed_text(&el))
        .filter(|text| !text.is_empty())
}

fn collapsed_text(element: &ElementRef) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_schema_types(value: &serde_json::Value, types: &mut Vec<String>) {
    match value {
        serde_json::Value::Array(items) => {
            for item in items {
                collect_schema_types(item, types);
            }
        }
        serde_json::Value::Object(map) => {
            match map.get("@type") {
                Some(serde_json::Value::String(name)) => types.push(name.clone()),
                Some(serde_json::Value::Array(names)) => types.extend(
                    names
                        .iter()
                        .filter_map(|n| n.as_str().map(str::to_string)),
                ),
                _ => {}
            }
            if let Some(graph) = map.get("@graph") {
                collect_schema_types(graph, types);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<!DOCTYPE html>
<html>
<head>
  <title>  Rust Crawler   Guide </title>
  <meta name="description" content=" A practical guide to crawling websites with Rust and async IO. ">
  <meta name="viewport" content="width=device-width">
  <meta property="og:title" content="Rust Crawler Guide">
  <meta property="og:image" content="/cover.png">
  <meta name="twitter:card" content="summary">
  <link rel="canonical" href="/guide/">
  <script type="application/ld+json">{"@context":"https://schema.org","@graph":[{"@type":"Article"},{"@type":["WebPage","Thing"]}]}</script>
  <style>body { color: red; }</style>
</head>
<body>
  <h1>Crawling
     with Rust</h1>
  <h2>Setup</h2><h2>Fetching</h2><h3>Timeouts</h3>
  <p>First paragraph.</p>
  <p>   </p>
  <p>Second <b>paragraph</b>.</p>
  <script>var hidden = "do not index";</script>
  <noscript>enable javascript</noscript>
  <img src="/a.png" alt="diagram"><img src="/b.png"><img src="/c.png" alt=" ">
  <a href="/docs/intro#top">Intro</a>
  <a href="sibling.html">Sibling</a>
  <a href="https://blog.example.com/post" rel="external NoFollow">Blog</a>
  <a href="https://other.org/">Other</a>
  <a href="mailto:team@example.com">Mail</a>
  <a href="">Empty</a>
  <a href="/img-link"><img src="/d.png" alt="icon"></a>
</body>
</html>"#;

    fn extract() -> Extraction {
        let page_url = Url::parse("https://www.example.com/guide/start").unwrap();
        Extractor::new("example.com").extract(PAGE, &page_url)
    }

    #[test]
    fn test_extracts_head_fields() {
        let extraction = extract();
        assert_eq!(extraction.title.as_deref(), Some("Rust Crawler Guide"));
        assert_eq!(
            extraction.meta_description.as_deref(),
            Some("A practical guide to crawling websites with Rust and async IO.")
        );
        assert_eq!(extraction.h1.as_deref(), Some("Crawling with Rust"));
    }

    #[test]
    fn test_visible_text_skips_scripts_and_styles() {
        let content = extract().content;
        assert!(content.contains("First paragraph."));
        assert!(content.contains("Second paragraph ."));
        assert!(!content.contains("do not index"));
        assert!(!content.contains("color: red"));
        assert!(!content.contains("enable javascript"));
        assert!(!content.contains("  "), "whitespace should be collapsed");
    }

    #[test]
    fn test_links_resolve_against_page_url() {
        let links = extract().links;
        let urls: Vec<&str> = links.iter().map(|l| l.url.as_str()).collect();

        assert_eq!(
            urls,
            vec![
                "https://www.example.com/docs/intro",
                "https://www.example.com/guide/sibling.html",
                "https://blog.example.com/post",
                "https://other.org/",
                "https://www.example.com/img-link",
            ]
        );
        assert!(links.iter().all(|l| l.source_url == "https://www.example.com/guide/start"));
    }

    #[test]
    fn test_link_classification() {
        let links = extract().links;

        let blog = links.iter().find(|l| l.text == "Blog").unwrap();
        assert!(blog.is_internal, "subdomains count as internal");
        assert!(!blog.is_followed, "rel=nofollow is case-insensitive");

        let other = links.iter().find(|l| l.text == "Other").unwrap();
        assert!(!other.is_internal);
        assert!(other.is_followed);

        let image_link = links.iter().find(|l| l.url.ends_with("/img-link")).unwrap();
        assert_eq!(image_link.text, "");
    }

    #[test]
    fn test_signals() {
        let signals = extract().signals;
        assert_eq!(
            signals.canonical_url.as_deref(),
            Some("https://www.example.com/guide/")
        );
        assert!(signals.has_structured_data);
        assert_eq!(
            signals.structured_data_types,
            vec!["Article".to_string(), "Thing".to_string(), "WebPage".to_string()]
        );
        assert!(signals.has_viewport);
        assert!(signals.has_twitter_card);
        assert_eq!(signals.open_graph.essential_count(), 2);
        assert_eq!(signals.image_count, 4);
        assert_eq!(signals.images_missing_alt, 2);
        assert_eq!(signals.h2_count, 2);
        assert_eq!(signals.h3_count, 1);
        assert_eq!(signals.paragraph_count, 2);
    }

    #[test]
    fn test_empty_document() {
        let page_url = Url::parse("https://example.com/").unwrap();
        let extraction = Extractor::new("example.com").extract("", &page_url);
        assert!(extraction.title.is_none());
        assert!(extraction.h1.is_none());
        assert!(extraction.content.is_empty());
        assert!(extraction.links.is_empty());
        assert!(!extraction.signals.has_structured_data);
    }
}
