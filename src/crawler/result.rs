//! Result types produced by a crawl job

use super::parser::LinkRecord;
use crate::output::CrawlSummary;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// An `hreflang` alternate of a page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HreflangTag {
    pub hreflang: String,
    pub href: String,
}

/// One structured-data block found on a page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum SchemaMarkup {
    #[serde(rename = "JSON-LD")]
    JsonLd { data: Value },

    #[serde(rename = "Microdata", rename_all = "camelCase")]
    Microdata {
        item_type: String,
        properties: BTreeMap<String, String>,
    },
}

/// Everything recorded about a successfully analyzed page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageAnalysis {
    pub url: String,
    pub crawl_depth: u32,
    pub title: String,
    pub description: String,
    pub h1: Vec<String>,
    /// Weighted composite of the signal scores, 0..=100
    pub score: u32,
    pub internal_links_count: usize,
    pub external_links_count: usize,
    pub internal_links: Vec<LinkRecord>,
    pub external_links: Vec<LinkRecord>,
    /// Parsed JSON-LD blocks
    pub structured_data: Option<Vec<Value>>,
    pub canonical_url: Option<String>,
    pub hreflang_tags: Option<Vec<HreflangTag>>,
    pub has_mobile_viewport: bool,
    pub schema_markup: Option<Vec<SchemaMarkup>>,
    pub word_count: usize,
    pub images_count: usize,
    pub images_with_alt_text: usize,
}

/// A page that was fetched but could not be analyzed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedPage {
    pub url: String,
    pub crawl_depth: u32,
    pub error: String,
}

/// Outcome of analyzing one page
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum PageResult {
    Analyzed(Box<PageAnalysis>),
    Failed(FailedPage),
}

impl PageResult {
    pub fn url(&self) -> &str {
        match self {
            Self::Analyzed(page) => &page.url,
            Self::Failed(page) => &page.url,
        }
    }

    pub fn crawl_depth(&self) -> u32 {
        match self {
            Self::Analyzed(page) => page.crawl_depth,
            Self::Failed(page) => page.crawl_depth,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    pub fn as_analysis(&self) -> Option<&PageAnalysis> {
        match self {
            Self::Analyzed(page) => Some(&**page),
            Self::Failed(_) => None,
        }
    }
}

/// A page that could not be fetched
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlError {
    pub url: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<u16>,
}

/// The complete output of one analysis job
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrawlResult {
    /// The base URL as given by the caller
    pub base_url: String,
    #[serde(rename = "crawledPages")]
    pub pages: Vec<PageResult>,
    pub errors: Vec<CrawlError>,
    pub summary: CrawlSummary,
}
