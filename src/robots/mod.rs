//! Robots.txt handling module
//!
//! Fetching never fails: an unreachable, non-2xx or unreadable robots.txt
//! yields an empty [`RobotsPolicy`] and the crawl proceeds unrestricted.

mod parser;

pub use parser::RobotsPolicy;

use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Fetches and parses `/robots.txt` on the host of `base_url`
pub async fn fetch_robots(
    client: &reqwest::Client,
    base_url: &Url,
    timeout: Duration,
) -> RobotsPolicy {
    let robots_url = match base_url.join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            warn!("Cannot build robots.txt URL for {}: {}", base_url, e);
            return RobotsPolicy::default();
        }
    };

    match fetch_robots_body(client, &robots_url, timeout).await {
        Ok(body) => {
            let policy = RobotsPolicy::parse(&body);
            info!(
                "Loaded {} with {} disallowed paths",
                robots_url,
                policy.disallowed_paths().len()
            );
            for sitemap in policy.sitemaps() {
                debug!("robots.txt announces sitemap {}", sitemap);
            }
            policy
        }
        Err(e) => {
            warn!("Could not load {}, crawling unrestricted: {}", robots_url, e);
            RobotsPolicy::default()
        }
    }
}

async fn fetch_robots_body(
    client: &reqwest::Client,
    robots_url: &Url,
    timeout: Duration,
) -> Result<String, reqwest::Error> {
    client
        .get(robots_url.clone())
        .timeout(timeout)
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}
