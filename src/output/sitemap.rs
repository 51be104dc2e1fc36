//! XML sitemap generation
//!
//! Only pages that were analyzed without error make it into the sitemap.
//! Priority and change frequency are guessed from crawl depth and URL path
//! since no last-modified signal is fetched.

use crate::crawler::{PageAnalysis, PageResult};
use chrono::{NaiveDate, Utc};
use quick_xml::escape::escape;
use serde::Serialize;

const SITEMAP_NAMESPACE: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";

/// Result of a sitemap crawl
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SitemapOutput {
    pub sitemap: String,
    pub stats: SitemapStats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SitemapStats {
    /// Number of crawled pages, including those that failed analysis
    pub total_urls: usize,
    /// Number of fetch errors
    pub errors: usize,
}

/// Renders `pages` as a sitemap with today's date as `lastmod`
pub fn build_sitemap(pages: &[PageResult]) -> String {
    build_sitemap_on(pages, Utc::now().date_naive())
}

/// Renders `pages` as a sitemap with `lastmod` set to `date`
pub fn build_sitemap_on(pages: &[PageResult], date: NaiveDate) -> String {
    let lastmod = date.format("%Y-%m-%d").to_string();

    let mut xml = String::from("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str(&format!("<urlset xmlns=\"{}\">\n", SITEMAP_NAMESPACE));

    for page in pages.iter().filter_map(PageResult::as_analysis) {
        xml.push_str("  <url>\n");
        xml.push_str(&format!("    <loc>{}</loc>\n", escape(page.url.as_str())));
        xml.push_str(&format!(
            "    <priority>{:.1}</priority>\n",
            priority(page.crawl_depth)
        ));
        xml.push_str(&format!(
            "    <changefreq>{}</changefreq>\n",
            change_frequency(page)
        ));
        xml.push_str(&format!("    <lastmod>{}</lastmod>\n", lastmod));
        xml.push_str("  </url>\n");
    }

    xml.push_str("</urlset>");
    xml
}

/// `1.0` for the base URL, `0.2` less per hop, never below `0.1`
fn priority(depth: u32) -> f64 {
    (1.0 - f64::from(depth) * 0.2).max(0.1)
}

fn change_frequency(page: &PageAnalysis) -> &'static str {
    let url = page.url.as_str();
    if page.crawl_depth == 0 {
        "daily"
    } else if url.contains("/blog/") || url.contains("/news/") {
        "weekly"
    } else if url.contains("/product/") || url.contains("/products/") {
        "weekly"
    } else if page.crawl_depth == 1 {
        "monthly"
    } else {
        "yearly"
    }
}
