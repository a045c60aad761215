//! Keyword frequency, density and readability for page text.
//!
//! There is no language detection: callers pass a [`Language`] and anything
//! that cannot be mapped (including `"auto"`) falls back to
//! [`Language::DEFAULT`].

use crate::models::{KeywordRecord, PageRecord, Readability, ReadabilityLevel};
use crate::scoring::round_to;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

pub const MAX_KEYWORDS: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    English,
    Korean,
}

impl Language {
    pub const DEFAULT: Language = Language::English;

    pub fn from_hint(hint: Option<&str>) -> Self {
        match hint.map(|h| h.trim().to_lowercase()).as_deref() {
            Some("en") | Some("english") => Language::English,
            Some("ko") | Some("korean") => Language::Korean,
            Some(other) => {
                if other != "auto" && !other.is_empty() {
                    tracing::warn!(language = %other, "Unknown language hint, using default");
                }
                Self::DEFAULT
            }
            None => Self::DEFAULT,
        }
    }

    fn stopwords(&self) -> &'static HashSet<&'static str> {
        match self {
            Language::English => &ENGLISH_STOPWORDS,
            Language::Korean => &KOREAN_STOPWORDS,
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::English => f.write_str("en"),
            Language::Korean => f.write_str("ko"),
        }
    }
}

static ENGLISH_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "i", "me", "my", "myself", "we", "our", "ours", "ourselves", "you", "your", "yours",
        "yourself", "yourselves", "he", "him", "his", "himself", "she", "her", "hers", "herself",
        "it", "its", "itself", "they", "them", "their", "theirs", "themselves", "what", "which",
        "who", "whom", "this", "that", "these", "those", "am", "is", "are", "was", "were", "be",
        "been", "being", "have", "has", "had", "having", "do", "does", "did", "doing", "a", "an",
        "the", "and", "but", "if", "or", "because", "as", "until", "while", "of", "at", "by",
        "for", "with", "about", "against", "between", "into", "through", "during", "before",
        "after", "above", "below", "to", "from", "up", "down", "in", "out", "on", "off", "over",
        "under", "again", "further", "then", "once", "here", "there", "when", "where", "why",
        "how", "all", "any", "both", "each", "few", "more", "most", "other", "some", "such", "no",
        "nor", "not", "only", "own", "same", "so", "than", "too", "very", "can", "will", "just",
        "don", "should", "now", "also", "would", "could", "may", "might", "must", "shall",
    ]
    .into_iter()
    .collect()
});

static KOREAN_STOPWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "그리고", "그러나", "하지만", "그래서", "또는", "및", "등", "이", "그", "저", "것",
        "수", "들", "에서", "으로", "에게", "부터", "까지", "하는", "있는", "있다", "없다",
        "합니다", "입니다", "있습니다", "위해", "통해", "대한", "대해", "때문에", "같은",
        "이런", "저런", "그런", "여기", "거기", "우리", "저희", "당신", "또한", "더", "가장",
        "모든", "각", "좀", "잘", "안", "못",
    ]
    .into_iter()
    .collect()
});

/// Retained tokens of `text` in document order.
///
/// Apostrophes inside a word are kept long enough to strip English clitics,
/// so `don't` yields `do` (a stopword) rather than `don` and `t`. Words that
/// still contain an apostrophe after that (`o'brien`) are dropped.
pub fn tokenize(text: &str, language: Language) -> Vec<String> {
    let stopwords = language.stopwords();
    text.to_lowercase()
        .replace('\u{2019}', "'")
        .split(|c: char| !c.is_alphanumeric() && c != '\'')
        .map(|word| strip_clitic(word.trim_matches('\'')))
        .filter(|token| {
            token.chars().count() > 1
                && token.chars().all(char::is_alphanumeric)
                && !stopwords.contains(token)
        })
        .map(str::to_string)
        .collect()
}

fn strip_clitic(word: &str) -> &str {
    match word {
        "can't" => return "can",
        "won't" => return "will",
        _ => {}
    }
    if let Some(stem) = word.strip_suffix("n't") {
        return stem;
    }
    ["'s", "'re", "'ve", "'ll", "'d", "'m"]
        .iter()
        .find_map(|clitic| word.strip_suffix(clitic))
        .unwrap_or(word)
}

/// Korean tiers: average sentence length below the bound earns the score.
const KOREAN_TIERS: [(f64, f64, ReadabilityLevel); 4] = [
    (10.0, 90.0, ReadabilityLevel::VeryEasy),
    (15.0, 80.0, ReadabilityLevel::Easy),
    (20.0, 70.0, ReadabilityLevel::Standard),
    (25.0, 60.0, ReadabilityLevel::FairlyDifficult),
];

/// English bands over the reading-ease score, checked top down.
const ENGLISH_BANDS: [(f64, ReadabilityLevel); 6] = [
    (90.0, ReadabilityLevel::VeryEasy),
    (80.0, ReadabilityLevel::Easy),
    (70.0, ReadabilityLevel::FairlyEasy),
    (60.0, ReadabilityLevel::Standard),
    (50.0, ReadabilityLevel::FairlyDifficult),
    (30.0, ReadabilityLevel::Difficult),
];

/// Readability from the average sentence length. Sentences end at `.`, `!`
/// or `?`; words are whitespace separated.
///
/// English uses a simplified Flesch reading ease, `206.835 - 1.015 * avg`,
/// which ignores syllables. Korean maps the average onto fixed tiers.
pub fn readability(text: &str, language: Language) -> Readability {
    let word_count = text.split_whitespace().count();
    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|sentence| !sentence.trim().is_empty())
        .count();
    if word_count == 0 || sentence_count == 0 {
        return Readability::default();
    }

    let avg = word_count as f64 / sentence_count as f64;
    let (score, level) = match language {
        Language::Korean => KOREAN_TIERS
            .iter()
            .find(|(bound, _, _)| avg < *bound)
            .map(|&(_, score, level)| (score, level))
            .unwrap_or((50.0, ReadabilityLevel::Difficult)),
        Language::English => {
            let score = 206.835 - 1.015 * avg;
            let level = ENGLISH_BANDS
                .iter()
                .find(|(floor, _)| score > *floor)
                .map(|&(_, level)| level)
                .unwrap_or(ReadabilityLevel::VeryDifficult);
            (score, level)
        }
    };

    Readability {
        sentence_count,
        word_count,
        avg_sentence_length: round_to(avg, 2),
        score: round_to(score, 2),
        level,
    }
}

/// Top keywords by count, ties in first-occurrence order.
pub fn analyze(text: &str, language: Language) -> Vec<KeywordRecord> {
    let tokens = tokenize(text, language);
    rank_counts(tokens.iter().map(String::as_str).map(|t| (t, 1)), MAX_KEYWORDS)
}

/// Site-wide keyword totals summed from each page's keyword records.
pub fn site_keywords(pages: &[PageRecord], limit: usize) -> Vec<KeywordRecord> {
    rank_counts(
        pages
            .iter()
            .flat_map(|page| page.keywords.iter())
            .map(|kw| (kw.keyword.as_str(), kw.count)),
        limit,
    )
}

fn rank_counts<'a>(
    counts: impl Iterator<Item = (&'a str, usize)>,
    limit: usize,
) -> Vec<KeywordRecord> {
    let mut totals: HashMap<&str, (usize, usize)> = HashMap::new();
    let mut total = 0usize;

    for (order, (token, count)) in counts.enumerate() {
        total += count;
        totals.entry(token).or_insert((0, order)).0 += count;
    }

    if total == 0 {
        return Vec::new();
    }

    let mut ranked: Vec<(&str, usize, usize)> = totals
        .into_iter()
        .map(|(token, (count, first_seen))| (token, count, first_seen))
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.2.cmp(&b.2)));
    ranked.truncate(limit);

    ranked
        .into_iter()
        .map(|(token, count, _)| KeywordRecord {
            keyword: token.to_string(),
            count,
            density: round_to(count as f64 / total as f64 * 100.0, 2),
        })
        .collect()
}
