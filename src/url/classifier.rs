//! Frontier admission rules
//!
//! Every candidate URL passes through [`skip_reason`] before it is fetched.
//! Rules are evaluated in a fixed order and the first match wins.

use crate::config::CrawlOptions;
use crate::robots::RobotsPolicy;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Extensions skipped when only HTML pages are wanted
const NON_HTML_EXTENSIONS: &[&str] = &[
    "pdf", "jpg", "jpeg", "png", "gif", "zip", "doc", "docx", "xls", "xlsx",
];

/// Whether a link stays on the audited host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkScope {
    Internal,
    External,
}

/// Why a candidate URL was rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    External,
    RobotsDisallowed,
    Excluded,
    Script,
    Stylesheet,
    NonHtml,
    Malformed,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::External => "external host",
            Self::RobotsDisallowed => "disallowed by robots.txt",
            Self::Excluded => "matches exclude pattern",
            Self::Script => "javascript resource",
            Self::Stylesheet => "css resource",
            Self::NonHtml => "non-html resource",
            Self::Malformed => "malformed url",
        };
        f.write_str(reason)
    }
}

/// Classifies `url` by comparing its hostname with `base_host`
///
/// Scheme and port are ignored, so `http://example.com` and
/// `https://example.com:8443` are both internal to `example.com`.
pub fn classify(url: &Url, base_host: &str) -> LinkScope {
    match url.host_str() {
        Some(host) if host.eq_ignore_ascii_case(base_host) => LinkScope::Internal,
        _ => LinkScope::External,
    }
}

/// Returns true when the crawler must not fetch `url`
pub fn should_skip(
    url: &str,
    base_host: &str,
    robots: &RobotsPolicy,
    options: &CrawlOptions,
) -> bool {
    skip_reason(url, base_host, robots, options).is_some()
}

/// Returns the first rule that rejects `url`, or `None` when it may be fetched
pub fn skip_reason(
    url: &str,
    base_host: &str,
    robots: &RobotsPolicy,
    options: &CrawlOptions,
) -> Option<SkipReason> {
    let parsed = match Url::parse(url) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => parsed,
        _ => return Some(SkipReason::Malformed),
    };

    if !options.include_external_links && classify(&parsed, base_host) == LinkScope::External {
        return Some(SkipReason::External);
    }

    if options.follow_robots_txt && robots.is_disallowed(parsed.path()) {
        return Some(SkipReason::RobotsDisallowed);
    }

    if options
        .exclude_url_patterns
        .iter()
        .any(|pattern| url.contains(pattern.as_str()))
    {
        return Some(SkipReason::Excluded);
    }

    let extension = path_extension(&parsed);
    match extension.as_deref() {
        Some("js") if !options.analyze_javascript => return Some(SkipReason::Script),
        Some("css") if !options.analyze_css => return Some(SkipReason::Stylesheet),
        Some(ext) if options.only_html_pages && NON_HTML_EXTENSIONS.contains(&ext) => {
            return Some(SkipReason::NonHtml)
        }
        _ => {}
    }

    None
}

/// Lowercased extension of the last path segment, if it has one
pub fn path_extension(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.next_back()?;
    let (stem, ext) = segment.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
