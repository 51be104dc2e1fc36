//! Crawl summary aggregation
//!
//! [`summarize`] is a pure function over the page and error lists of a
//! finished crawl. Pages that failed analysis count towards the totals but
//! carry no title, description, H1, canonical or viewport.

use crate::config::CrawlOptions;
use crate::crawler::{CrawlError, PageResult};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;
use std::time::Duration;

/// Missing alt text becomes an issue above this share of images (percent)
const MISSING_ALT_THRESHOLD: u32 = 20;

/// Issue priority bucket
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Critical,
    Major,
    Minor,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Critical => "critical",
            Self::Major => "major",
            Self::Minor => "minor",
        })
    }
}

/// Kind of aggregate finding
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    DuplicateTitles,
    DuplicateDescriptions,
    MissingH1,
    MultipleH1,
    MissingCanonical,
    NotMobileFriendly,
    MissingAltText,
    CrawlErrors,
}

impl IssueKind {
    pub fn severity(&self) -> Severity {
        match self {
            Self::CrawlErrors => Severity::Critical,
            Self::DuplicateTitles
            | Self::DuplicateDescriptions
            | Self::MissingH1
            | Self::NotMobileFriendly
            | Self::MissingAltText => Severity::Major,
            Self::MultipleH1 | Self::MissingCanonical => Severity::Minor,
        }
    }
}

/// One aggregate finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Issue {
    #[serde(rename = "type")]
    pub kind: IssueKind,
    pub count: usize,
    pub message: String,
    pub severity: Severity,
}

impl Issue {
    fn new(kind: IssueKind, count: usize, message: String) -> Self {
        Self {
            kind,
            count,
            message,
            severity: kind.severity(),
        }
    }
}

/// Issues grouped by severity, each list in detection order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Issues {
    pub critical: Vec<Issue>,
    pub major: Vec<Issue>,
    pub minor: Vec<Issue>,
}

impl Issues {
    fn push(&mut self, issue: Issue) {
        match issue.severity {
            Severity::Critical => self.critical.push(issue),
            Severity::Major => self.major.push(issue),
            Severity::Minor => self.minor.push(issue),
        }
    }

    pub fn len(&self) -> usize {
        self.critical.len() + self.major.len() + self.minor.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All issues, most severe first
    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.critical
            .iter()
            .chain(self.major.iter())
            .chain(self.minor.iter())
    }
}

/// Aggregate statistics of one crawl
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlSummary {
    /// Wall-clock crawl time in seconds
    pub duration: f64,
    pub options: CrawlOptions,
    pub total_pages: usize,
    pub total_errors: usize,
    pub avg_score: u32,
    pub max_depth: u32,
    pub duplicate_titles_count: usize,
    pub duplicate_descriptions_count: usize,
    pub pages_without_h1: usize,
    pub pages_with_multiple_h1: usize,
    pub pages_with_canonical: usize,
    pub mobile_optimized_pages: usize,
    pub total_internal_links: usize,
    pub total_external_links: usize,
    pub avg_internal_links_per_page: usize,
    pub avg_external_links_per_page: usize,
    pub total_images: usize,
    pub images_with_alt: usize,
    pub missing_alt_text_percentage: u32,
    pub pages_with_structured_data: usize,
    pub pages_with_hreflang: usize,
    pub issues: Issues,
}

/// Aggregates page results and fetch errors into a [`CrawlSummary`]
pub fn summarize(
    pages: &[PageResult],
    errors: &[CrawlError],
    duration: Duration,
    options: &CrawlOptions,
) -> CrawlSummary {
    let total_pages = pages.len();
    let total_errors = errors.len();
    let analyzed = || pages.iter().filter_map(PageResult::as_analysis);

    let score_sum: u64 = analyzed().map(|p| u64::from(p.score)).sum();
    let avg_score = rounded_ratio(score_sum as f64, total_pages) as u32;
    let max_depth = pages.iter().map(PageResult::crawl_depth).max().unwrap_or(0);

    let titles: Vec<Option<&str>> = pages
        .iter()
        .map(|p| p.as_analysis().map(|a| a.title.as_str()))
        .collect();
    let descriptions: Vec<Option<&str>> = pages
        .iter()
        .map(|p| p.as_analysis().map(|a| a.description.as_str()))
        .collect();
    let duplicate_titles_count = duplicate_count(&titles);
    let duplicate_descriptions_count = duplicate_count(&descriptions);

    let h1_count = |p: &PageResult| p.as_analysis().map_or(0, |a| a.h1.len());
    let pages_without_h1 = pages.iter().filter(|p| h1_count(*p) == 0).count();
    let pages_with_multiple_h1 = pages.iter().filter(|p| h1_count(*p) > 1).count();

    let pages_with_canonical = analyzed().filter(|p| p.canonical_url.is_some()).count();
    let mobile_optimized_pages = analyzed().filter(|p| p.has_mobile_viewport).count();

    let total_internal_links: usize = analyzed().map(|p| p.internal_links_count).sum();
    let total_external_links: usize = analyzed().map(|p| p.external_links_count).sum();
    let avg_internal_links_per_page = rounded_ratio(total_internal_links as f64, total_pages);
    let avg_external_links_per_page = rounded_ratio(total_external_links as f64, total_pages);

    let total_images: usize = analyzed().map(|p| p.images_count).sum();
    let images_with_alt: usize = analyzed().map(|p| p.images_with_alt_text).sum();
    let missing_alt_text_percentage = if total_images > 0 {
        ((total_images - images_with_alt) as f64 / total_images as f64 * 100.0).round() as u32
    } else {
        0
    };

    let pages_with_structured_data = analyzed()
        .filter(|p| p.structured_data.is_some() || p.schema_markup.is_some())
        .count();
    let pages_with_hreflang = analyzed().filter(|p| p.hreflang_tags.is_some()).count();

    let mut issues = Issues::default();
    if duplicate_titles_count > 0 {
        issues.push(Issue::new(
            IssueKind::DuplicateTitles,
            duplicate_titles_count,
            format!("{} pages have duplicate title tags", duplicate_titles_count),
        ));
    }
    if duplicate_descriptions_count > 0 {
        issues.push(Issue::new(
            IssueKind::DuplicateDescriptions,
            duplicate_descriptions_count,
            format!(
                "{} pages have duplicate meta descriptions",
                duplicate_descriptions_count
            ),
        ));
    }
    if pages_without_h1 > 0 {
        issues.push(Issue::new(
            IssueKind::MissingH1,
            pages_without_h1,
            format!("{} pages have no H1 heading", pages_without_h1),
        ));
    }
    if pages_with_multiple_h1 > 0 {
        issues.push(Issue::new(
            IssueKind::MultipleH1,
            pages_with_multiple_h1,
            format!("{} pages have multiple H1 headings", pages_with_multiple_h1),
        ));
    }
    if pages_with_canonical < total_pages {
        let missing = total_pages - pages_with_canonical;
        issues.push(Issue::new(
            IssueKind::MissingCanonical,
            missing,
            format!("{} pages have no canonical tag", missing),
        ));
    }
    if mobile_optimized_pages < total_pages {
        let missing = total_pages - mobile_optimized_pages;
        issues.push(Issue::new(
            IssueKind::NotMobileFriendly,
            missing,
            format!("{} pages are not optimized for mobile devices", missing),
        ));
    }
    if missing_alt_text_percentage > MISSING_ALT_THRESHOLD {
        issues.push(Issue::new(
            IssueKind::MissingAltText,
            total_images - images_with_alt,
            format!(
                "{}% of images have no alt text",
                missing_alt_text_percentage
            ),
        ));
    }
    if total_errors > 0 {
        issues.push(Issue::new(
            IssueKind::CrawlErrors,
            total_errors,
            format!("{} pages could not be crawled", total_errors),
        ));
    }

    CrawlSummary {
        duration: (duration.as_secs_f64() * 100.0).round() / 100.0,
        options: options.clone(),
        total_pages,
        total_errors,
        avg_score,
        max_depth,
        duplicate_titles_count,
        duplicate_descriptions_count,
        pages_without_h1,
        pages_with_multiple_h1,
        pages_with_canonical,
        mobile_optimized_pages,
        total_internal_links,
        total_external_links,
        avg_internal_links_per_page,
        avg_external_links_per_page,
        total_images,
        images_with_alt,
        missing_alt_text_percentage,
        pages_with_structured_data,
        pages_with_hreflang,
        issues,
    }
}

/// `values.len() - |unique values|`, comparing values literally
fn duplicate_count<T: Eq + std::hash::Hash>(values: &[T]) -> usize {
    let unique: HashSet<&T> = values.iter().collect();
    values.len() - unique.len()
}

fn rounded_ratio(total: f64, count: usize) -> usize {
    if count == 0 {
        0
    } else {
        (total / count as f64).round() as usize
    }
}
