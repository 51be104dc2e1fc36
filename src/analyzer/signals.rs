//! Per-page signal extractors
//!
//! Each extractor looks at one aspect of a parsed page and returns a score in
//! `0..=100` with a short message. [`SignalSource`] is the seam the page
//! analyzer calls through; [`DefaultSignals`] carries the stock heuristics.

use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashMap;
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// Elements whose text does not count as page content
const NON_CONTENT_ELEMENTS: &[&str] = &[
    "nav", "footer", "header", "script", "style", "noscript", "iframe",
];

const STOP_WORDS: &[&str] = &[
    "der", "die", "das", "ein", "eine", "und", "oder", "aber", "wenn", "weil", "von", "mit",
    "ohne", "für", "gegen", "um", "durch", "auf", "in", "aus", "the", "a", "an", "and", "or",
    "but", "if", "because", "from", "with", "without", "for", "against", "by", "on", "in", "out",
];

/// Errors raised while extracting signals from one page
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("{extractor} extractor failed: {reason}")]
    Extractor {
        extractor: &'static str,
        reason: String,
    },

    #[error("analysis panicked: {0}")]
    Panicked(String),
}

/// Everything an extractor may look at
pub struct PageContext<'a> {
    pub document: &'a Html,
    pub url: &'a Url,
    /// Time the page took to fetch
    pub load_time: Duration,
}

/// A plain score with its explanation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Signal {
    pub score: u32,
    pub message: String,
}

/// Title or meta description
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TextSignal {
    pub text: String,
    /// Length in characters
    pub length: usize,
    pub score: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MetaSignals {
    pub title: TextSignal,
    pub description: TextSignal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingSignals {
    /// Number of `h1`..`h6` elements
    pub counts: [usize; 6],
    /// Trimmed text of every `h1`
    pub h1: Vec<String>,
    pub score: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageSignals {
    pub total: usize,
    /// Images with a non-blank `alt`
    pub with_alt: usize,
    pub with_dimensions: usize,
    /// Images declaring a width or height over 1000px
    pub large: usize,
    pub score: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentSignals {
    pub word_count: usize,
    pub sentence_count: usize,
    pub readability: f64,
    /// Share of the most frequent keyword in percent
    pub keyword_density: f64,
    pub top_keywords: Vec<(String, usize)>,
    pub score: u32,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PerformanceSignals {
    pub load_time_secs: f64,
    pub load_speed: Signal,
    pub mobile: Signal,
}

/// Source of per-page signals
///
/// Implementations must be cheap to share between worker threads.
pub trait SignalSource: Send + Sync {
    fn meta(&self, page: &PageContext<'_>) -> Result<MetaSignals, AnalysisError>;
    fn headings(&self, page: &PageContext<'_>) -> Result<HeadingSignals, AnalysisError>;
    fn images(&self, page: &PageContext<'_>) -> Result<ImageSignals, AnalysisError>;
    fn content(&self, page: &PageContext<'_>) -> Result<ContentSignals, AnalysisError>;
    fn performance(&self, page: &PageContext<'_>) -> Result<PerformanceSignals, AnalysisError>;
}

/// Stock extractors
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultSignals;

impl SignalSource for DefaultSignals {
    fn meta(&self, page: &PageContext<'_>) -> Result<MetaSignals, AnalysisError> {
        Ok(analyze_meta(page.document))
    }

    fn headings(&self, page: &PageContext<'_>) -> Result<HeadingSignals, AnalysisError> {
        Ok(analyze_headings(page.document))
    }

    fn images(&self, page: &PageContext<'_>) -> Result<ImageSignals, AnalysisError> {
        Ok(analyze_images(page.document))
    }

    fn content(&self, page: &PageContext<'_>) -> Result<ContentSignals, AnalysisError> {
        Ok(analyze_content(page.document))
    }

    fn performance(&self, page: &PageContext<'_>) -> Result<PerformanceSignals, AnalysisError> {
        Ok(analyze_performance(page.document, page.load_time))
    }
}

/// Selects all elements matching `css`; an unparsable selector matches nothing
pub(crate) fn select<'a>(document: &'a Html, css: &str) -> Vec<ElementRef<'a>> {
    match Selector::parse(css) {
        Ok(selector) => document.select(&selector).collect(),
        Err(_) => Vec::new(),
    }
}

pub fn analyze_meta(document: &Html) -> MetaSignals {
    // Text of every <title> element, joined
    let title = select(document, "title")
        .iter()
        .flat_map(|el| el.text())
        .collect::<String>()
        .trim()
        .to_string();
    let description = select(document, r#"meta[name="description"]"#)
        .first()
        .and_then(|el| el.value().attr("content"))
        .unwrap_or("")
        .to_string();

    MetaSignals {
        title: score_title(title),
        description: score_description(description),
    }
}

fn score_title(text: String) -> TextSignal {
    let length = text.chars().count();
    let (score, message) = match length {
        0 => (0, "No title found"),
        1..=9 => (30, "Title is too short (under 10 characters)"),
        10..=29 => (60, "Title could be longer (50-60 characters is ideal)"),
        30..=60 => (100, "Title length is optimal"),
        61..=70 => (80, "Title is slightly long but acceptable"),
        _ => (50, "Title is too long (over 70 characters) and will be truncated"),
    };
    TextSignal {
        text,
        length,
        score,
        message: message.to_string(),
    }
}

fn score_description(text: String) -> TextSignal {
    let length = text.chars().count();
    let (score, message) = match length {
        0 => (0, "No meta description found"),
        1..=49 => (40, "Meta description is too short (under 50 characters)"),
        50..=119 => (70, "Meta description could be longer (150-160 characters is ideal)"),
        120..=160 => (100, "Meta description length is optimal"),
        161..=320 => (80, "Meta description is long for mobile but fine on desktop"),
        _ => (50, "Meta description is too long (over 320 characters)"),
    };
    TextSignal {
        text,
        length,
        score,
        message: message.to_string(),
    }
}

pub fn analyze_headings(document: &Html) -> HeadingSignals {
    let mut counts = [0usize; 6];
    for (level, count) in counts.iter_mut().enumerate() {
        *count = select(document, &format!("h{}", level + 1)).len();
    }
    let h1: Vec<String> = select(document, "h1")
        .iter()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .collect();

    let [h1_count, h2_count, h3_count, h4_count, _, _] = counts;
    let (structure, message) = if h1_count == 0 {
        (30.0, "No h1 heading found")
    } else if h1_count > 1 {
        (50.0, "Multiple h1 headings found; use a single h1 per page")
    } else if h2_count == 0 {
        (70.0, "One h1 but no h2 headings")
    } else if h1_count <= h2_count && h2_count >= h3_count && h3_count >= h4_count {
        (100.0, "Heading structure has a proper hierarchy")
    } else {
        (80.0, "Headings present but the hierarchy could be improved")
    };

    let content = match h1.first().map(|text| text.chars().count()) {
        None => 0.0,
        Some(len) if !(20..=70).contains(&len) => 70.0,
        Some(_) => 100.0,
    };

    HeadingSignals {
        counts,
        h1,
        score: (structure * 0.7 + content * 0.3_f64).round() as u32,
        message: message.to_string(),
    }
}

pub fn analyze_images(document: &Html) -> ImageSignals {
    let images = select(document, "img");
    let total = images.len();
    let mut with_alt = 0;
    let mut with_dimensions = 0;
    let mut large = 0;

    for image in &images {
        let attrs = image.value();
        if attrs.attr("alt").is_some_and(|alt| !alt.trim().is_empty()) {
            with_alt += 1;
        }
        if let (Some(width), Some(height)) = (attrs.attr("width"), attrs.attr("height")) {
            if !width.is_empty() && !height.is_empty() {
                with_dimensions += 1;
                if leading_int(width) > 1000 || leading_int(height) > 1000 {
                    large += 1;
                }
            }
        }
    }

    if total == 0 {
        return ImageSignals {
            total,
            with_alt,
            with_dimensions,
            large,
            score: 50,
            message: "No images found on the page".to_string(),
        };
    }

    let alt_pct = with_alt as f64 / total as f64 * 100.0;
    let (mut score, mut message) = if with_alt == total {
        (100, "All images have alt text".to_string())
    } else if alt_pct >= 80.0 {
        (90, format!("{}% of images have alt text", alt_pct.round()))
    } else if alt_pct >= 50.0 {
        (70, format!("Only {}% of images have alt text", alt_pct.round()))
    } else {
        (40, format!("Only {}% of images have alt text", alt_pct.round()))
    };

    if (with_dimensions as f64 / total as f64) < 0.5 {
        score -= 10;
        message.push_str("; many images lack width/height");
    }
    if large > 3 {
        score -= 10;
        message.push_str("; several very large images");
    }

    ImageSignals {
        total,
        with_alt,
        with_dimensions,
        large,
        score,
        message,
    }
}

/// Parses the leading digits of an attribute the way browsers read `width="640px"`
fn leading_int(value: &str) -> u64 {
    let digits: String = value
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(0)
}

pub fn analyze_content(document: &Html) -> ContentSignals {
    let text = body_text(document);
    let words: Vec<&str> = text.split_whitespace().collect();
    let word_count = words.len();

    let length_score = match word_count {
        0..=299 => 30.0,
        300..=599 => 60.0,
        600..=1199 => 90.0,
        _ => 100.0,
    };

    let sentence_count = text
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count();
    let avg_sentence = if sentence_count > 0 {
        word_count as f64 / sentence_count as f64
    } else {
        0.0
    };
    let avg_word = if word_count > 0 {
        words.iter().map(|w| w.chars().count()).sum::<usize>() as f64 / word_count as f64
    } else {
        0.0
    };
    let readability = if avg_sentence > 0.0 && avg_word > 0.0 {
        (100.0 - (0.39 * avg_sentence + 11.8 * avg_word - 15.59)).clamp(0.0, 100.0)
    } else {
        0.0
    };

    let top_keywords = top_keywords(&words, 10);
    let keyword_density = match top_keywords.first() {
        Some((_, count)) => *count as f64 / word_count as f64 * 100.0,
        None => 0.0,
    };
    let stuffed = keyword_density > 5.0;

    let score = (length_score * 0.5
        + readability * 0.3
        + if stuffed { 0.0 } else { 100.0 } * 0.2)
        .round() as u32;

    let mut message = match word_count {
        0..=299 => "Thin content (under 300 words)".to_string(),
        300..=599 => "Adequate content; 600+ words would be better".to_string(),
        600..=1199 => "Good content length".to_string(),
        _ => "Excellent content length".to_string(),
    };
    if readability < 60.0 {
        message.push_str("; text is hard to read");
    }
    if stuffed {
        message.push_str("; possible keyword stuffing (density over 5%)");
    }

    ContentSignals {
        word_count,
        sentence_count,
        readability,
        keyword_density,
        top_keywords,
        score,
        message,
    }
}

/// Collects body text outside navigation, chrome and script elements
fn body_text(document: &Html) -> String {
    let Some(body) = select(document, "body").into_iter().next() else {
        return String::new();
    };

    let mut chunks = Vec::new();
    for node in body.descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let excluded = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| NON_CONTENT_ELEMENTS.contains(&el.name()))
        });
        if !excluded {
            chunks.push(&**text);
        }
    }
    chunks.join(" ")
}

/// Most frequent non-stopword words longer than three characters
///
/// Ties keep first-occurrence order.
fn top_keywords(words: &[&str], limit: usize) -> Vec<(String, usize)> {
    let mut order: Vec<String> = Vec::new();
    let mut counts: HashMap<String, usize> = HashMap::new();

    for word in words {
        let cleaned: String = word
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ',' | '.' | ';' | ':' | '!' | '?' | '(' | ')'))
            .collect();
        if cleaned.chars().count() <= 3 || STOP_WORDS.contains(&cleaned.as_str()) {
            continue;
        }
        let count = counts.entry(cleaned.clone()).or_insert(0);
        if *count == 0 {
            order.push(cleaned);
        }
        *count += 1;
    }

    let mut ranked: Vec<(String, usize)> = order
        .into_iter()
        .map(|word| {
            let count = counts.get(&word).copied().unwrap_or(0);
            (word, count)
        })
        .collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    ranked.truncate(limit);
    ranked
}

pub fn analyze_performance(document: &Html, load_time: Duration) -> PerformanceSignals {
    let secs = load_time.as_secs_f64();
    let (score, message) = if secs < 1.0 {
        (100, "Excellent load time (under 1 second)")
    } else if secs < 2.0 {
        (90, "Very good load time (under 2 seconds)")
    } else if secs < 3.0 {
        (80, "Good load time (under 3 seconds)")
    } else if secs < 4.0 {
        (60, "Acceptable load time (under 4 seconds)")
    } else if secs < 6.0 {
        (40, "Slow load time (over 4 seconds)")
    } else {
        (20, "Very slow load time (over 6 seconds)")
    };

    PerformanceSignals {
        load_time_secs: (secs * 10.0).round() / 10.0,
        load_speed: Signal {
            score,
            message: message.to_string(),
        },
        mobile: mobile_signal(document),
    }
}

fn mobile_signal(document: &Html) -> Signal {
    let viewport = select(document, r#"meta[name="viewport"]"#)
        .first()
        .map(|el| el.value().attr("content").unwrap_or("").to_ascii_lowercase());

    let (score, message) = match viewport {
        Some(content) if content.contains("width=device-width") => {
            (100, "Responsive viewport declared")
        }
        Some(_) => (70, "Viewport declared without device-width"),
        None => (40, "No viewport meta tag; page is likely not mobile friendly"),
    };
    Signal {
        score,
        message: message.to_string(),
    }
}
