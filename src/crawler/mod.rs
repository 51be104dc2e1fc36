//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with redirect and content-type handling
//! - HTML parsing and link extraction
//! - The breadth-first frontier and its visited set
//! - The worker pool driving one crawl job

mod coordinator;
mod fetcher;
mod frontier;
mod parser;
mod result;

pub use coordinator::{crawl_site, generate_sitemap, CrawlJob};
pub use fetcher::{build_http_client, fetch_url, FetchResult};
pub use frontier::{ClaimedEntry, Frontier, FrontierEntry, Next};
pub use parser::{
    extract_classified, extract_frontier_links, parse_html, ClassifiedLinks, LinkRecord,
};
pub use result::{
    CrawlError, CrawlResult, FailedPage, HreflangTag, PageAnalysis, PageResult, SchemaMarkup,
};
