//! Per-job crawl options
//!
//! Callers hand in a loosely specified [`CrawlOptionsInput`] (every field
//! optional). It is merged with mode-specific defaults and clamped exactly
//! once, producing an immutable [`CrawlOptions`] for the lifetime of a job.

use crate::ConfigResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Lower and upper bound for `max_depth`
pub const DEPTH_LIMITS: (u32, u32) = (1, 5);

/// Upper bound for `max_urls` in analysis mode
pub const ANALYSIS_MAX_URLS: usize = 100;

/// Upper bound for `max_urls` in sitemap mode
pub const SITEMAP_MAX_URLS: usize = 500;

/// The two kinds of crawl job, which differ only in defaults and limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrawlMode {
    Analysis,
    Sitemap,
}

impl CrawlMode {
    /// Upper bound for `max_urls` in this mode
    pub fn max_urls_limit(&self) -> usize {
        match self {
            Self::Analysis => ANALYSIS_MAX_URLS,
            Self::Sitemap => SITEMAP_MAX_URLS,
        }
    }

    fn defaults(&self) -> CrawlOptions {
        match self {
            Self::Analysis => CrawlOptions {
                max_depth: 2,
                max_urls: 20,
                include_images: true,
                include_external_links: false,
                follow_robots_txt: true,
                analyze_javascript: false,
                analyze_css: false,
                only_html_pages: true,
                exclude_url_patterns: BTreeSet::new(),
                inclusion_paths: BTreeSet::new(),
            },
            Self::Sitemap => CrawlOptions {
                max_depth: 3,
                max_urls: 100,
                include_images: false,
                include_external_links: false,
                follow_robots_txt: true,
                analyze_javascript: false,
                analyze_css: false,
                only_html_pages: true,
                exclude_url_patterns: BTreeSet::new(),
                inclusion_paths: BTreeSet::new(),
            },
        }
    }
}

/// Unvalidated crawl options as supplied by a caller
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct CrawlOptionsInput {
    pub max_depth: Option<i64>,
    pub max_urls: Option<i64>,
    pub include_images: Option<bool>,
    pub include_external_links: Option<bool>,
    pub follow_robots_txt: Option<bool>,
    pub analyze_javascript: Option<bool>,
    pub analyze_css: Option<bool>,
    pub only_html_pages: Option<bool>,
    pub exclude_url_patterns: Option<Vec<String>>,
    pub inclusion_paths: Option<Vec<String>>,
}

impl CrawlOptionsInput {
    /// Parses options from a JSON object
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Layers `overrides` on top of `self`; fields set in `overrides` win
    pub fn merge(self, overrides: CrawlOptionsInput) -> Self {
        Self {
            max_depth: overrides.max_depth.or(self.max_depth),
            max_urls: overrides.max_urls.or(self.max_urls),
            include_images: overrides.include_images.or(self.include_images),
            include_external_links: overrides
                .include_external_links
                .or(self.include_external_links),
            follow_robots_txt: overrides.follow_robots_txt.or(self.follow_robots_txt),
            analyze_javascript: overrides.analyze_javascript.or(self.analyze_javascript),
            analyze_css: overrides.analyze_css.or(self.analyze_css),
            only_html_pages: overrides.only_html_pages.or(self.only_html_pages),
            exclude_url_patterns: overrides
                .exclude_url_patterns
                .or(self.exclude_url_patterns),
            inclusion_paths: overrides.inclusion_paths.or(self.inclusion_paths),
        }
    }
}

/// Validated, clamped crawl options
///
/// Constructed once per job through [`CrawlOptions::for_analysis`] or
/// [`CrawlOptions::for_sitemap`] and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlOptions {
    pub max_depth: u32,
    pub max_urls: usize,
    pub include_images: bool,
    pub include_external_links: bool,
    pub follow_robots_txt: bool,
    pub analyze_javascript: bool,
    pub analyze_css: bool,
    pub only_html_pages: bool,
    pub exclude_url_patterns: BTreeSet<String>,
    pub inclusion_paths: BTreeSet<String>,
}

impl CrawlOptions {
    /// Builds options for an analysis crawl (`max_urls` clamped to 1..=100)
    pub fn for_analysis(input: CrawlOptionsInput) -> Self {
        Self::resolve(CrawlMode::Analysis, input)
    }

    /// Builds options for a sitemap crawl (`max_urls` clamped to 1..=500)
    pub fn for_sitemap(input: CrawlOptionsInput) -> Self {
        Self::resolve(CrawlMode::Sitemap, input)
    }

    /// Merges `input` over the defaults of `mode` and clamps the bounds
    pub fn resolve(mode: CrawlMode, input: CrawlOptionsInput) -> Self {
        let defaults = mode.defaults();

        let max_depth = input
            .max_depth
            .map(|d| d.clamp(DEPTH_LIMITS.0 as i64, DEPTH_LIMITS.1 as i64) as u32)
            .unwrap_or(defaults.max_depth);
        let max_urls = input
            .max_urls
            .map(|n| n.clamp(1, mode.max_urls_limit() as i64) as usize)
            .unwrap_or(defaults.max_urls);

        Self {
            max_depth,
            max_urls,
            include_images: input.include_images.unwrap_or(defaults.include_images),
            include_external_links: input
                .include_external_links
                .unwrap_or(defaults.include_external_links),
            follow_robots_txt: input
                .follow_robots_txt
                .unwrap_or(defaults.follow_robots_txt),
            analyze_javascript: input
                .analyze_javascript
                .unwrap_or(defaults.analyze_javascript),
            analyze_css: input.analyze_css.unwrap_or(defaults.analyze_css),
            only_html_pages: input.only_html_pages.unwrap_or(defaults.only_html_pages),
            exclude_url_patterns: non_empty_set(input.exclude_url_patterns),
            inclusion_paths: non_empty_set(input.inclusion_paths),
        }
    }
}

impl Default for CrawlOptions {
    fn default() -> Self {
        CrawlMode::Analysis.defaults()
    }
}

/// Collects patterns into a set, dropping empty strings (which would match everything)
fn non_empty_set(values: Option<Vec<String>>) -> BTreeSet<String> {
    values
        .unwrap_or_default()
        .into_iter()
        .filter(|v| !v.is_empty())
        .collect()
}
