//! Link extraction from fetched HTML
//!
//! Two views over the same `<a href>` set:
//! - [`extract_frontier_links`] produces the absolute URLs worth crawling next
//! - [`extract_classified`] produces the internal/external link records that
//!   end up in the page result

use crate::config::CrawlOptions;
use crate::url::{classify, path_extension, LinkScope};
use scraper::{Html, Selector};
use serde::Serialize;
use std::collections::HashSet;
use url::Url;

/// Extensions never worth following from a page when only HTML is wanted
const NON_HTML_LINK_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "css", "js", "zip", "doc", "docx", "xls", "xlsx",
];

/// A single outbound link as reported in a page result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkRecord {
    /// Absolute URL, fragment removed
    pub url: String,
    /// Trimmed anchor text
    pub anchor_text: String,
    /// `rel` contains the `nofollow` token
    pub nofollow: bool,
    pub scope: LinkScope,
}

/// Links of one page split by scope
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClassifiedLinks {
    pub internal: Vec<LinkRecord>,
    pub external: Vec<LinkRecord>,
}

/// Parses an HTML document
///
/// Parsing never fails; malformed markup is repaired the way browsers do.
pub fn parse_html(html: &str) -> Html {
    Html::parse_document(html)
}

/// Extracts the URLs to feed back into the frontier
///
/// # Link Extraction Rules
///
/// **Exclude:**
/// - `javascript:`, `mailto:`, `tel:` and other non-HTTP(S) links
/// - Fragment-only links and links back to `page_url` (with or without a
///   trailing slash)
/// - External links unless `include_external_links` is set
/// - Links matching an exclude pattern
/// - Links outside `inclusion_paths` when that set is non-empty
/// - Obvious non-HTML resources when `only_html_pages` is set
///
/// The result is deduplicated and keeps document order. Deduplication across
/// pages is the frontier's job.
pub fn extract_frontier_links(
    document: &Html,
    page_url: &Url,
    base_host: &str,
    options: &CrawlOptions,
) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut links = Vec::new();

    for anchor in anchors(document) {
        let Some(url) = resolve_link(anchor.href, page_url) else {
            continue;
        };

        if !options.include_external_links && classify(&url, base_host) == LinkScope::External {
            continue;
        }

        if options
            .exclude_url_patterns
            .iter()
            .any(|pattern| url.as_str().contains(pattern.as_str()))
        {
            continue;
        }

        if !options.inclusion_paths.is_empty()
            && !options
                .inclusion_paths
                .iter()
                .any(|prefix| url.path().starts_with(prefix.as_str()))
        {
            continue;
        }

        if options.only_html_pages {
            if let Some(ext) = path_extension(&url) {
                if NON_HTML_LINK_EXTENSIONS.contains(&ext.as_str()) {
                    continue;
                }
            }
        }

        let url = String::from(url);
        if seen.insert(url.clone()) {
            links.push(url);
        }
    }

    links
}

/// Extracts every HTTP(S) link of the page, split into internal and external
///
/// Unlike [`extract_frontier_links`] no option filters apply; the records
/// describe the page as published.
pub fn extract_classified(document: &Html, page_url: &Url, base_host: &str) -> ClassifiedLinks {
    let mut seen = HashSet::new();
    let mut classified = ClassifiedLinks::default();

    for anchor in anchors(document) {
        let Some(url) = resolve_link(anchor.href, page_url) else {
            continue;
        };
        if !seen.insert(url.to_string()) {
            continue;
        }

        let scope = classify(&url, base_host);
        let record = LinkRecord {
            url: url.into(),
            anchor_text: anchor.text,
            nofollow: anchor.nofollow,
            scope,
        };
        match scope {
            LinkScope::Internal => classified.internal.push(record),
            LinkScope::External => classified.external.push(record),
        }
    }

    classified
}

struct Anchor<'a> {
    href: &'a str,
    text: String,
    nofollow: bool,
}

fn anchors(document: &Html) -> Vec<Anchor<'_>> {
    let Ok(selector) = Selector::parse("a[href]") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?;
            let nofollow = element
                .value()
                .attr("rel")
                .map(|rel| {
                    rel.split_ascii_whitespace()
                        .any(|token| token.eq_ignore_ascii_case("nofollow"))
                })
                .unwrap_or(false);
            let text = element
                .text()
                .collect::<String>()
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ");
            Some(Anchor {
                href,
                text,
                nofollow,
            })
        })
        .collect()
}

/// Resolves an href against the page URL
///
/// Returns None for links that do not lead to another page:
/// - empty and fragment-only hrefs
/// - non-HTTP(S) schemes after resolution
/// - links back to the page itself
fn resolve_link(href: &str, page_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let mut url = page_url.join(href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }
    url.set_fragment(None);

    if is_self_link(&url, page_url) {
        return None;
    }
    Some(url)
}

fn is_self_link(url: &Url, page_url: &Url) -> bool {
    let mut page = page_url.clone();
    page.set_fragment(None);
    let page = page.as_str();
    let candidate = url.as_str();

    candidate == page
        || candidate.strip_suffix('/') == Some(page)
        || page.strip_suffix('/') == Some(candidate)
}
