//! Crawl job coordinator - worker pool orchestration
//!
//! A [`CrawlJob`] owns everything one crawl needs: the validated options,
//! its own frontier, robots policy and HTTP client. `run` drives a fixed pool
//! of tokio workers over the shared frontier:
//! - a worker claims an entry under the frontier lock, fetches it without
//!   holding the lock, parses and analyzes it on the blocking pool, then
//!   reports the outcome and its links back under the lock
//! - a worker with nothing to do waits on a [`Notify`] until another worker
//!   completes an entry
//! - the job ends when the frontier reports [`Next::Done`] to every worker

use crate::analyzer::{PageAnalyzer, PageInput};
use crate::config::{validate, Config, CrawlOptions};
use crate::crawler::frontier::{ClaimedEntry, Frontier, Next};
use crate::crawler::parser::{extract_frontier_links, parse_html};
use crate::crawler::result::{CrawlError, CrawlResult, FailedPage, PageResult};
use crate::crawler::{build_http_client, fetch_url, FetchResult};
use crate::output::{build_sitemap, summarize, SitemapOutput, SitemapStats};
use crate::robots::{fetch_robots, RobotsPolicy};
use crate::state::PageState;
use crate::url::{normalize_url, parse_base_url, skip_reason};
use crate::{AuditError, Result, UrlError};
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, Notify};
use tokio::task::JoinSet;
use url::Url;

/// Emit a progress line every this many claimed pages
const PROGRESS_INTERVAL: usize = 10;

/// One crawl of one site
#[derive(Debug)]
pub struct CrawlJob {
    /// Base URL exactly as the caller gave it
    base_input: String,
    /// Normalized base URL, the frontier seed
    seed: Url,
    base_host: String,
    options: CrawlOptions,
    client: Client,
    workers: usize,
    robots_timeout: Duration,
    analyzer: PageAnalyzer,
}

/// State shared by the workers of one job
struct Shared {
    frontier: Mutex<Frontier>,
    progress: Notify,
    robots: RobotsPolicy,
    options: CrawlOptions,
    base_host: String,
    client: Client,
    analyzer: PageAnalyzer,
}

/// What a worker produced for one claimed entry
enum Record {
    Page(PageResult),
    Error(CrawlError),
}

impl CrawlJob {
    /// Validates the base URL and prepares a job
    ///
    /// This is the only fallible step before crawling starts; an invalid base
    /// URL or config is rejected here without any network activity.
    pub fn new(base_url: &str, options: CrawlOptions, config: &Config) -> Result<Self> {
        validate(config)?;
        let parsed = parse_base_url(base_url)?;
        let seed = normalize_url(parsed.as_str())?;
        let base_host = seed
            .host_str()
            .ok_or(UrlError::MissingHost)?
            .to_ascii_lowercase();
        let client = build_http_client(config)?;

        Ok(Self {
            base_input: base_url.to_string(),
            seed,
            base_host,
            options,
            client,
            workers: config.crawler.workers as usize,
            robots_timeout: Duration::from_secs(config.crawler.robots_timeout_secs),
            analyzer: PageAnalyzer::new(),
        })
    }

    /// Replaces the page analyzer, e.g. to plug in different signal extractors
    pub fn with_analyzer(mut self, analyzer: PageAnalyzer) -> Self {
        self.analyzer = analyzer;
        self
    }

    /// Normalized base URL the crawl starts from
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// Runs the crawl to completion
    ///
    /// Per-page failures are recorded in the result. Only a failure of the
    /// worker pool itself is returned as an error.
    pub async fn run(self) -> Result<CrawlResult> {
        let started = Instant::now();
        tracing::info!(
            "Starting crawl of {} (max depth {}, max urls {}, {} workers)",
            self.seed,
            self.options.max_depth,
            self.options.max_urls,
            self.workers
        );

        let robots = if self.options.follow_robots_txt {
            fetch_robots(&self.client, &self.seed, self.robots_timeout).await
        } else {
            RobotsPolicy::default()
        };

        let frontier = Frontier::new(
            self.seed.clone(),
            self.options.max_depth,
            self.options.max_urls,
        );

        let shared = Arc::new(Shared {
            frontier: Mutex::new(frontier),
            progress: Notify::new(),
            robots,
            options: self.options,
            base_host: self.base_host,
            client: self.client,
            analyzer: self.analyzer,
        });

        let mut pool = JoinSet::new();
        for id in 0..self.workers {
            pool.spawn(run_worker(id, Arc::clone(&shared)));
        }

        let mut records = Vec::new();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(Ok(mut produced)) => records.append(&mut produced),
                Ok(Err(e)) => {
                    pool.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    pool.abort_all();
                    return Err(AuditError::Worker(e.to_string()));
                }
            }
        }

        records.sort_by_key(|(seq, _)| *seq);
        let mut pages = Vec::new();
        let mut errors = Vec::new();
        for (_, record) in records {
            match record {
                Record::Page(page) => pages.push(page),
                Record::Error(error) => errors.push(error),
            }
        }

        let duration = started.elapsed();
        let summary = summarize(&pages, &errors, duration, &shared.options);

        tracing::info!(
            "Crawl completed: {} pages, {} errors in {:?}",
            pages.len(),
            errors.len(),
            duration
        );

        Ok(CrawlResult {
            base_url: self.base_input,
            pages,
            errors,
            summary,
        })
    }
}

/// Crawls `base_url` and returns the full analysis result
///
/// # Example
///
/// ```no_run
/// use site_audit::{crawl_site, Config, CrawlOptions, CrawlOptionsInput};
///
/// # async fn demo() -> site_audit::Result<()> {
/// let options = CrawlOptions::for_analysis(CrawlOptionsInput::default());
/// let result = crawl_site("https://example.com", options, &Config::default()).await?;
/// println!("{} pages, score {}", result.pages.len(), result.summary.avg_score);
/// # Ok(())
/// # }
/// ```
pub async fn crawl_site(
    base_url: &str,
    options: CrawlOptions,
    config: &Config,
) -> Result<CrawlResult> {
    CrawlJob::new(base_url, options, config)?.run().await
}

/// Crawls `base_url` and renders the successfully analyzed pages as a sitemap
///
/// `options` should come from [`CrawlOptions::for_sitemap`].
pub async fn generate_sitemap(
    base_url: &str,
    options: CrawlOptions,
    config: &Config,
) -> Result<SitemapOutput> {
    let result = crawl_site(base_url, options, config).await?;
    Ok(SitemapOutput {
        sitemap: build_sitemap(&result.pages),
        stats: SitemapStats {
            total_urls: result.pages.len(),
            errors: result.errors.len(),
        },
    })
}

async fn run_worker(id: usize, shared: Arc<Shared>) -> Result<Vec<(usize, Record)>> {
    let mut produced = Vec::new();

    loop {
        let entry = {
            let mut frontier = shared.frontier.lock().await;
            let next = frontier.next_entry(|url| {
                skip_reason(
                    url.as_str(),
                    &shared.base_host,
                    &shared.robots,
                    &shared.options,
                )
            })?;

            match next {
                Next::Entry(entry) => entry,
                Next::Done => break,
                Next::Wait => {
                    // Registered before the lock is released so a completion
                    // between unlock and await is not missed
                    let progressed = shared.progress.notified();
                    drop(frontier);
                    progressed.await;
                    continue;
                }
            }
        };

        tracing::debug!("Worker {} fetching {} (depth {})", id, entry.url, entry.depth);
        let (outcome, links, record) = process_entry(&shared, &entry).await;

        {
            let mut frontier = shared.frontier.lock().await;
            let added = frontier.complete(&entry, outcome, &links)?;
            tracing::trace!(
                "{} -> {}, {} new entries, {} queued",
                entry.url,
                outcome,
                added,
                frontier.queue_len()
            );
            if outcome.consumed_slot() && frontier.claimed() % PROGRESS_INTERVAL == 0 {
                tracing::info!(
                    "Progress: {} pages claimed, {} in frontier",
                    frontier.claimed(),
                    frontier.queue_len()
                );
            }
        }
        shared.progress.notify_waiters();

        if let Some(record) = record {
            produced.push((entry.seq, record));
        }
    }

    // Wake idle workers so they observe the end of the crawl
    shared.progress.notify_waiters();
    Ok(produced)
}

/// Fetches and analyzes one entry
///
/// Returns the entry's terminal state, the links to enqueue and what to
/// record in the result.
async fn process_entry(
    shared: &Arc<Shared>,
    entry: &ClaimedEntry,
) -> (PageState, Vec<String>, Option<Record>) {
    let fetched = fetch_url(&shared.client, &entry.url, shared.options.only_html_pages).await;

    let (final_url, body, elapsed) = match fetched {
        FetchResult::Success {
            final_url,
            body,
            elapsed,
            ..
        } => (final_url, body, elapsed),
        FetchResult::ContentMismatch { content_type } => {
            tracing::debug!("Discarding {}: content type {}", entry.url, content_type);
            return (PageState::Discarded, Vec::new(), None);
        }
        failed @ (FetchResult::HttpError { .. } | FetchResult::NetworkError { .. }) => {
            let (error, status_code) = failed.failure().unwrap_or_default();
            tracing::warn!("Failed to fetch {}: {}", entry.url, error);
            let record = Record::Error(CrawlError {
                url: entry.url.to_string(),
                error,
                status_code,
            });
            return (PageState::Failed, Vec::new(), Some(record));
        }
    };

    let worker_shared = Arc::clone(shared);
    let url = entry.url.clone();
    let depth = entry.depth;

    // scraper::Html is !Send, so parsing and analysis stay on one blocking thread
    let analyzed = tokio::task::spawn_blocking(move || {
        let document = parse_html(&body);
        let links = extract_frontier_links(
            &document,
            &final_url,
            &worker_shared.base_host,
            &worker_shared.options,
        );
        let page = worker_shared.analyzer.analyze(
            &document,
            PageInput {
                url: url.as_str(),
                final_url: &final_url,
                depth,
                base_host: &worker_shared.base_host,
                load_time: elapsed,
            },
        );
        (page, links)
    })
    .await;

    match analyzed {
        Ok((page, links)) => {
            let outcome = if page.is_error() {
                PageState::Failed
            } else {
                PageState::Analyzed
            };
            (outcome, links, Some(Record::Page(page)))
        }
        Err(e) => {
            tracing::warn!("Analysis task for {} failed: {}", entry.url, e);
            let page = PageResult::Failed(FailedPage {
                url: entry.url.to_string(),
                crawl_depth: entry.depth,
                error: format!("Analysis failed: {}", e),
            });
            (PageState::Failed, Vec::new(), Some(Record::Page(page)))
        }
    }
}
