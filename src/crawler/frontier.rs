//! Breadth-first crawl frontier
//!
//! The frontier owns the FIFO work queue, the visited set and the job's page
//! budget. Workers share it behind one mutex; every method here is a short
//! critical section that never awaits.
//!
//! Two rules keep depth accounting exact with several workers:
//! - a URL is marked visited the moment it is popped, before any fetch
//! - an entry of depth d+1 is not handed out while an entry of depth d is
//!   still in flight, because that entry may yet discover URLs at depth d+1

use crate::state::PageState;
use crate::url::{normalize_url, SkipReason};
use crate::AuditError;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use tracing::{debug, trace};
use url::Url;

/// A URL waiting in the queue together with its hop count from the base URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    pub url: Url,
    pub depth: u32,
}

/// An entry handed to a worker
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimedEntry {
    pub url: Url,
    pub depth: u32,
    /// Dispatch order, used to report results deterministically
    pub seq: usize,
}

/// What a worker should do next
#[derive(Debug, PartialEq, Eq)]
pub enum Next {
    /// Fetch this entry
    Entry(ClaimedEntry),
    /// Nothing dispatchable right now; wait for an in-flight entry to complete
    Wait,
    /// The crawl is over
    Done,
}

/// Work queue, visited set and budget of one crawl job
#[derive(Debug)]
pub struct Frontier {
    queue: VecDeque<FrontierEntry>,
    /// Keys of everything in `queue`
    queued: HashSet<String>,
    /// Visited set: every URL ever popped, with its current state
    states: HashMap<String, PageState>,
    /// In-flight entries per depth
    in_flight: BTreeMap<u32, usize>,
    claimed: usize,
    max_depth: u32,
    max_urls: usize,
}

impl Frontier {
    /// Creates a frontier seeded with `(seed, 0)`
    pub fn new(seed: Url, max_depth: u32, max_urls: usize) -> Self {
        let mut frontier = Self {
            queue: VecDeque::new(),
            queued: HashSet::new(),
            states: HashMap::new(),
            in_flight: BTreeMap::new(),
            claimed: 0,
            max_depth,
            max_urls,
        };
        frontier.push(seed, 0);
        frontier
    }

    /// Hands out the next entry to fetch
    ///
    /// `skip` decides whether a popped URL may be fetched at all; rejected URLs
    /// stay in the visited set as [`PageState::Skipped`] and cost no budget.
    pub fn next_entry<F>(&mut self, mut skip: F) -> Result<Next, AuditError>
    where
        F: FnMut(&Url) -> Option<SkipReason>,
    {
        loop {
            if self.claimed >= self.max_urls {
                return Ok(Next::Done);
            }

            let Some(front) = self.queue.front() else {
                return Ok(self.idle());
            };

            if let Some(&shallowest) = self.in_flight.keys().next() {
                if front.depth > shallowest {
                    trace!(
                        "Holding depth {} until depth {} completes",
                        front.depth,
                        shallowest
                    );
                    return Ok(Next::Wait);
                }
            }

            let Some(entry) = self.queue.pop_front() else {
                return Ok(self.idle());
            };
            let key = entry.url.to_string();
            self.queued.remove(&key);

            if self.states.contains_key(&key) {
                trace!("Already visited {}", key);
                continue;
            }
            self.states.insert(key.clone(), PageState::Queued);

            if entry.depth > self.max_depth {
                trace!("Dropping {} beyond max depth", key);
                self.set_state(&key, PageState::Skipped)?;
                continue;
            }

            if let Some(reason) = skip(&entry.url) {
                debug!("Skipping {}: {}", key, reason);
                self.set_state(&key, PageState::Skipped)?;
                continue;
            }

            self.set_state(&key, PageState::Fetching)?;
            let seq = self.claimed;
            self.claimed += 1;
            *self.in_flight.entry(entry.depth).or_insert(0) += 1;

            return Ok(Next::Entry(ClaimedEntry {
                url: entry.url,
                depth: entry.depth,
                seq,
            }));
        }
    }

    /// Records the outcome of a claimed entry and enqueues its links
    ///
    /// Links are enqueued at `depth + 1`. Returns the number of new entries.
    pub fn complete(
        &mut self,
        entry: &ClaimedEntry,
        outcome: PageState,
        links: &[String],
    ) -> Result<usize, AuditError> {
        self.set_state(entry.url.as_str(), outcome)?;

        if let Some(count) = self.in_flight.get_mut(&entry.depth) {
            *count -= 1;
            if *count == 0 {
                self.in_flight.remove(&entry.depth);
            }
        }

        let depth = entry.depth + 1;
        let mut added = 0;
        for link in links {
            match normalize_url(link) {
                Ok(url) => {
                    if self.push(url, depth) {
                        added += 1;
                    }
                }
                Err(e) => trace!("Ignoring link {}: {}", link, e),
            }
        }
        Ok(added)
    }

    /// Number of entries handed out so far
    pub fn claimed(&self) -> usize {
        self.claimed
    }

    /// Number of entries waiting in the queue
    pub fn queue_len(&self) -> usize {
        self.queue.len()
    }

    /// Current state of `url`, if it has been popped
    pub fn state_of(&self, url: &str) -> Option<PageState> {
        self.states.get(url).copied()
    }

    fn idle(&self) -> Next {
        if self.in_flight.is_empty() {
            Next::Done
        } else {
            Next::Wait
        }
    }

    fn push(&mut self, url: Url, depth: u32) -> bool {
        if depth > self.max_depth {
            return false;
        }
        let key = url.to_string();
        if self.states.contains_key(&key) || self.queued.contains(&key) {
            return false;
        }
        self.queued.insert(key);
        self.queue.push_back(FrontierEntry { url, depth });
        true
    }

    fn set_state(&mut self, key: &str, next: PageState) -> Result<(), AuditError> {
        let current = self
            .states
            .get_mut(key)
            .ok_or_else(|| AuditError::Worker(format!("{} was never claimed", key)))?;
        *current = current.transition(next)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn no_skip(_: &Url) -> Option<SkipReason> {
        None
    }

    fn claim(frontier: &mut Frontier) -> ClaimedEntry {
        match frontier.next_entry(no_skip).unwrap() {
            Next::Entry(entry) => entry,
            other => panic!("expected an entry, got {:?}", other),
        }
    }

    fn links(urls: &[&str]) -> Vec<String> {
        urls.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_seed_is_first_entry() {
        let mut frontier = Frontier::new(url("https://example.com/"), 2, 10);
        let entry = claim(&mut frontier);
        assert_eq!(entry.url.as_str(), "https://example.com/");
        assert_eq!(entry.depth, 0);
        assert_eq!(entry.seq, 0);
        assert_eq!(frontier.state_of("https://example.com/"), Some(PageState::Fetching));
    }

    #[test]
    fn test_fifo_order_and_depths() {
        let mut frontier = Frontier::new(url("https://example.com/"), 3, 10);
        let root = claim(&mut frontier);
        frontier
            .complete(
                &root,
                PageState::Analyzed,
                &links(&["https://example.com/a", "https://example.com/b"]),
            )
            .unwrap();

        let a = claim(&mut frontier);
        let b = claim(&mut frontier);
        assert_eq!(a.url.path(), "/a");
        assert_eq!(b.url.path(), "/b");
        assert_eq!((a.depth, b.depth), (1, 1));
        assert_eq!((a.seq, b.seq), (1, 2));
    }

    #[test]
    fn test_wait_while_in_flight_then_done() {
        let mut frontier = Frontier::new(url("https://example.com/"), 2, 10);
        let root = claim(&mut frontier);

        assert_eq!(frontier.next_entry(no_skip).unwrap(), Next::Wait);

        frontier.complete(&root, PageState::Analyzed, &[]).unwrap();
        assert_eq!(frontier.next_entry(no_skip).unwrap(), Next::Done);
    }

    #[test]
    fn test_level_barrier_holds_deeper_entries() {
        let mut frontier = Frontier::new(url("https://example.com/"), 3, 10);
        let root = claim(&mut frontier);
        frontier
            .complete(
                &root,
                PageState::Analyzed,
                &links(&["https://example.com/a", "https://example.com/b"]),
            )
            .unwrap();

        let a = claim(&mut frontier);
        let b = claim(&mut frontier);

        // /a finishes first and discovers /c at depth 2 while /b is in flight
        frontier
            .complete(&a, PageState::Analyzed, &links(&["https://example.com/c"]))
            .unwrap();
        assert_eq!(frontier.next_entry(no_skip).unwrap(), Next::Wait);

        frontier.complete(&b, PageState::Analyzed, &[]).unwrap();
        let c = claim(&mut frontier);
        assert_eq!(c.url.path(), "/c");
        assert_eq!(c.depth, 2);
    }

    #[test]
    fn test_no_duplicate_claims() {
        let mut frontier = Frontier::new(url("https://example.com/"), 3, 10);
        let root = claim(&mut frontier);
        frontier
            .complete(
                &root,
                PageState::Analyzed,
                &links(&[
                    "https://example.com/a",
                    "https://example.com/a#frag",
                    "https://example.com/?utm_source=x",
                ]),
            )
            .unwrap();
        assert_eq!(frontier.queue_len(), 1);

        let a = claim(&mut frontier);
        frontier
            .complete(&a, PageState::Analyzed, &links(&["https://example.com/a"]))
            .unwrap();
        assert_eq!(frontier.next_entry(no_skip).unwrap(), Next::Done);
        assert_eq!(frontier.claimed(), 2);
    }

    #[test]
    fn test_max_depth_bounds_enqueue() {
        let mut frontier = Frontier::new(url("https://example.com/"), 1, 10);
        let root = claim(&mut frontier);
        frontier
            .complete(&root, PageState::Analyzed, &links(&["https://example.com/a"]))
            .unwrap();
        let a = claim(&mut frontier);
        let added = frontier
            .complete(&a, PageState::Analyzed, &links(&["https://example.com/c"]))
            .unwrap();
        assert_eq!(added, 0);
        assert_eq!(frontier.next_entry(no_skip).unwrap(), Next::Done);
    }

    #[test]
    fn test_max_urls_stops_dispatch() {
        let mut frontier = Frontier::new(url("https://example.com/"), 3, 2);
        let root = claim(&mut frontier);
        frontier
            .complete(
                &root,
                PageState::Failed,
                &links(&["https://example.com/a", "https://example.com/b"]),
            )
            .unwrap();
        let _a = claim(&mut frontier);
        assert_eq!(frontier.next_entry(no_skip).unwrap(), Next::Done);
        assert_eq!(frontier.claimed(), 2);
    }

    #[test]
    fn test_skipped_entries_cost_no_budget() {
        let mut frontier = Frontier::new(url("https://example.com/"), 3, 2);
        let root = claim(&mut frontier);
        frontier
            .complete(
                &root,
                PageState::Analyzed,
                &links(&["https://example.com/private", "https://example.com/ok"]),
            )
            .unwrap();

        let next = frontier
            .next_entry(|u| (u.path() == "/private").then_some(SkipReason::RobotsDisallowed))
            .unwrap();
        match next {
            Next::Entry(entry) => assert_eq!(entry.url.path(), "/ok"),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(
            frontier.state_of("https://example.com/private"),
            Some(PageState::Skipped)
        );
        assert_eq!(frontier.claimed(), 2);
    }

    #[test]
    fn test_completing_twice_is_rejected() {
        let mut frontier = Frontier::new(url("https://example.com/"), 1, 5);
        let root = claim(&mut frontier);
        frontier.complete(&root, PageState::Analyzed, &[]).unwrap();
        assert!(matches!(
            frontier.complete(&root, PageState::Failed, &[]),
            Err(AuditError::InvalidTransition { .. })
        ));
    }
}
