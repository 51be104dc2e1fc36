//! Output module for crawl summaries and reports
//!
//! This module handles:
//! - Aggregating page results into a summary with prioritized issues
//! - Rendering the XML sitemap
//! - Generating the markdown issue report

mod markdown;
mod sitemap;
mod summary;

pub use markdown::{format_markdown_report, generate_markdown_report};
pub use sitemap::{build_sitemap, build_sitemap_on, SitemapOutput, SitemapStats};
pub use summary::{summarize, CrawlSummary, Issue, IssueKind, Issues, Severity};
