//! Page analysis
//!
//! [`PageAnalyzer`] runs the signal extractors over one fetched page, folds
//! their scores into the composite score and extracts the structured
//! metadata reported per page. It never fails: an extractor error or panic
//! turns into [`PageResult::Failed`] for that page alone.

use super::signals::{select, AnalysisError, DefaultSignals, PageContext, SignalSource};
use crate::crawler::{
    extract_classified, FailedPage, HreflangTag, PageAnalysis, PageResult, SchemaMarkup,
};
use scraper::Html;
use serde_json::Value;
use std::collections::BTreeMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

/// Composite score weights
const WEIGHT_TITLE: f64 = 1.5;
const WEIGHT_DESCRIPTION: f64 = 1.5;
const WEIGHT_HEADINGS: f64 = 1.0;
const WEIGHT_IMAGES: f64 = 1.0;
const WEIGHT_CONTENT: f64 = 2.0;
const WEIGHT_LOAD_SPEED: f64 = 1.5;
const WEIGHT_MOBILE: f64 = 1.5;

/// One fetched page ready for analysis
#[derive(Debug, Clone, Copy)]
pub struct PageInput<'a> {
    /// URL the page is reported under
    pub url: &'a str,
    /// URL the body was served from, after redirects; links resolve against it
    pub final_url: &'a Url,
    pub depth: u32,
    pub base_host: &'a str,
    pub load_time: Duration,
}

/// Scores pages with a [`SignalSource`]
pub struct PageAnalyzer {
    signals: Box<dyn SignalSource>,
}

impl Default for PageAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PageAnalyzer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageAnalyzer").finish_non_exhaustive()
    }
}

impl PageAnalyzer {
    /// Analyzer using the stock extractors
    pub fn new() -> Self {
        Self::with_signals(DefaultSignals)
    }

    pub fn with_signals(signals: impl SignalSource + 'static) -> Self {
        Self {
            signals: Box::new(signals),
        }
    }

    /// Analyzes one page
    ///
    /// Always returns a result for the page; failures of the extractors are
    /// reported as [`PageResult::Failed`].
    pub fn analyze(&self, document: &Html, input: PageInput<'_>) -> PageResult {
        let outcome = catch_unwind(AssertUnwindSafe(|| self.try_analyze(document, &input)))
            .unwrap_or_else(|payload| Err(AnalysisError::Panicked(panic_message(&*payload))));

        match outcome {
            Ok(page) => PageResult::Analyzed(Box::new(page)),
            Err(e) => {
                warn!(url = %input.url, error = %e, "page analysis failed");
                PageResult::Failed(FailedPage {
                    url: input.url.to_string(),
                    crawl_depth: input.depth,
                    error: e.to_string(),
                })
            }
        }
    }

    fn try_analyze(
        &self,
        document: &Html,
        input: &PageInput<'_>,
    ) -> Result<PageAnalysis, AnalysisError> {
        let context = PageContext {
            document,
            url: input.final_url,
            load_time: input.load_time,
        };

        let meta = self.signals.meta(&context)?;
        let headings = self.signals.headings(&context)?;
        let images = self.signals.images(&context)?;
        let content = self.signals.content(&context)?;
        let performance = self.signals.performance(&context)?;

        let weighted = [
            (meta.title.score, WEIGHT_TITLE),
            (meta.description.score, WEIGHT_DESCRIPTION),
            (headings.score, WEIGHT_HEADINGS),
            (images.score, WEIGHT_IMAGES),
            (content.score, WEIGHT_CONTENT),
            (performance.load_speed.score, WEIGHT_LOAD_SPEED),
            (performance.mobile.score, WEIGHT_MOBILE),
        ];
        let score = composite_score(&weighted);

        let links = extract_classified(document, input.final_url, input.base_host);
        let json_ld = json_ld_blocks(document);
        let microdata = microdata_items(document);

        let mut schema: Vec<SchemaMarkup> = json_ld
            .iter()
            .cloned()
            .map(|data| SchemaMarkup::JsonLd { data })
            .collect();
        schema.extend(microdata);

        let hreflang = hreflang_tags(document);

        debug!(url = %input.url, score, "page analyzed");

        Ok(PageAnalysis {
            url: input.url.to_string(),
            crawl_depth: input.depth,
            title: meta.title.text,
            description: meta.description.text,
            h1: headings.h1,
            score,
            internal_links_count: links.internal.len(),
            external_links_count: links.external.len(),
            internal_links: links.internal,
            external_links: links.external,
            structured_data: non_empty(json_ld),
            canonical_url: canonical_url(document),
            hreflang_tags: non_empty(hreflang),
            has_mobile_viewport: has_viewport(document),
            schema_markup: non_empty(schema),
            word_count: content.word_count,
            images_count: images.total,
            images_with_alt_text: images.with_alt,
        })
    }
}

/// Weighted mean of `(score, weight)` pairs, rounded
pub fn composite_score(weighted: &[(u32, f64)]) -> u32 {
    let total_weight: f64 = weighted.iter().map(|(_, w)| w).sum();
    if total_weight <= 0.0 {
        return 0;
    }
    let sum: f64 = weighted.iter().map(|(s, w)| f64::from(*s) * w).sum();
    (sum / total_weight).round() as u32
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() {
        None
    } else {
        Some(items)
    }
}

fn canonical_url(document: &Html) -> Option<String> {
    select(document, r#"link[rel="canonical"]"#)
        .first()
        .and_then(|el| el.value().attr("href"))
        .map(str::to_string)
}

fn hreflang_tags(document: &Html) -> Vec<HreflangTag> {
    select(document, r#"link[rel="alternate"][hreflang]"#)
        .iter()
        .filter_map(|el| {
            let attrs = el.value();
            Some(HreflangTag {
                hreflang: attrs.attr("hreflang")?.to_string(),
                href: attrs.attr("href").unwrap_or("").to_string(),
            })
        })
        .collect()
}

fn has_viewport(document: &Html) -> bool {
    !select(document, r#"meta[name="viewport"]"#).is_empty()
}

/// Parses every `application/ld+json` script; blocks that are not valid JSON are skipped
fn json_ld_blocks(document: &Html) -> Vec<Value> {
    select(document, r#"script[type="application/ld+json"]"#)
        .iter()
        .filter_map(|el| {
            let raw = el.text().collect::<String>();
            match serde_json::from_str::<Value>(&raw) {
                Ok(value) => Some(value),
                Err(e) => {
                    debug!(error = %e, "skipping malformed JSON-LD block");
                    None
                }
            }
        })
        .collect()
}

fn microdata_items(document: &Html) -> Vec<SchemaMarkup> {
    let Ok(prop_selector) = scraper::Selector::parse("[itemprop]") else {
        return Vec::new();
    };

    select(document, "[itemscope][itemtype]")
        .iter()
        .map(|item| {
            let mut properties = BTreeMap::new();
            for prop in item.select(&prop_selector) {
                let Some(name) = prop.value().attr("itemprop") else {
                    continue;
                };
                let value = match prop.value().attr("content") {
                    Some(content) => content.to_string(),
                    None => prop.text().collect::<String>().trim().to_string(),
                };
                properties.insert(name.to_string(), value);
            }
            SchemaMarkup::Microdata {
                item_type: item.value().attr("itemtype").unwrap_or("").to_string(),
                properties,
            }
        })
        .collect()
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
