use crate::{UrlError, UrlResult};
use url::Url;

/// Click identifiers removed during normalization, besides any `utm_*` key
const TRACKING_PARAMS: &[&str] = &["fbclid", "gclid"];

/// Normalizes a URL into the key used by the visited set
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an `http` or `https` scheme and a host
/// 3. Remove fragment (everything after #)
/// 4. Remove `utm_*`, `fbclid` and `gclid` query parameters
/// 5. Sort remaining query parameters by key
/// 6. Remove empty query string (trailing ?)
///
/// Query pairs are kept byte for byte as the site wrote them; nothing is
/// decoded or re-encoded, so `?q=a%20b` and a bare `?print` survive as is.
///
/// Scheme, `www.` prefix and trailing slashes are left alone: `/a` and `/a/`
/// may be different resources on the audited site. Host lowercasing and dot
/// segment removal are already done by the URL parser.
///
/// # Examples
///
/// ```
/// use site_audit::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.com/page/?b=2&a=1#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/page/?a=1&b=2");
/// ```
pub fn normalize_url(url_str: &str) -> UrlResult<Url> {
    let mut url = parse_http_url(url_str)?;

    url.set_fragment(None);

    if let Some(query) = url.query().map(filter_and_sort_query) {
        url.set_query((!query.is_empty()).then_some(query.as_str()));
    }

    Ok(url)
}

/// Returns true when `url_str` is an absolute `http`/`https` URL with a host
pub fn is_valid_url(url_str: &str) -> bool {
    parse_http_url(url_str).is_ok()
}

/// Prepends `https://` to input that carries no scheme, e.g. `example.com`
pub fn with_default_scheme(input: &str) -> String {
    let trimmed = input.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Validates a crawl base URL
///
/// This is the only job-level URL check; a failure here aborts the job before
/// any request is made.
pub fn parse_base_url(url_str: &str) -> UrlResult<Url> {
    let mut url = parse_http_url(url_str)?;
    url.set_fragment(None);
    Ok(url)
}

fn parse_http_url(url_str: &str) -> UrlResult<Url> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    match url.host_str() {
        Some(host) if !host.is_empty() => Ok(url),
        _ => Err(UrlError::MissingHost),
    }
}

/// Filters out tracking parameters and sorts the remaining raw pairs by key
fn filter_and_sort_query(query: &str) -> String {
    let mut params: Vec<&str> = query
        .split('&')
        .filter(|pair| !pair.is_empty() && !is_tracking_param(query_key(pair)))
        .collect();

    // Stable sort keeps repeated keys in their original order
    params.sort_by(|a, b| query_key(a).cmp(query_key(b)));

    params.join("&")
}

fn query_key(pair: &str) -> &str {
    pair.split_once('=').map_or(pair, |(key, _)| key)
}

/// Checks if a query parameter is a tracking parameter
fn is_tracking_param(key: &str) -> bool {
    TRACKING_PARAMS.contains(&key) || key.starts_with("utm_")
}
