//! Per-site crawl frontier
//!
//! A breadth-first queue of `(url, depth)` tasks with a visited set and a page
//! budget. One frontier belongs to exactly one site crawl and is dropped with it.

use crate::url::{normalize_url, visit_key, SiteScope};
use std::collections::{HashSet, VecDeque};
use url::Url;

/// A URL queued for fetching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTask {
    /// The normalized URL to fetch
    pub url: Url,

    /// Hops from the seed (the seed is 0)
    pub depth: u32,
}

/// Frontier manages the BFS queue and crawl budget of one site
///
/// The frontier enforces:
/// - FIFO order, so pages are visited level by level
/// - No URL is enqueued twice (normalized, see [`visit_key`])
/// - No task deeper than `max_depth`
/// - No URL outside the site's scope
/// - At most `max_pages` pops
#[derive(Debug)]
pub struct Frontier {
    scope: SiteScope,
    queue: VecDeque<CrawlTask>,
    visited: HashSet<String>,
    pages_visited: u32,
    max_pages: u32,
    max_depth: u32,
}

impl Frontier {
    /// Creates a frontier holding only the seed at depth 0
    ///
    /// # Arguments
    ///
    /// * `seed` - The normalized seed URL
    /// * `scope` - The site boundary discovered links are checked against
    /// * `max_depth` - Deepest task that may be enqueued
    /// * `max_pages` - Number of pops before the budget is spent
    pub fn new(seed: Url, scope: SiteScope, max_depth: u32, max_pages: u32) -> Self {
        let mut visited = HashSet::new();
        visited.insert(visit_key(&seed));

        let mut queue = VecDeque::new();
        queue.push_back(CrawlTask {
            url: seed,
            depth: 0,
        });

        Self {
            scope,
            queue,
            visited,
            pages_visited: 0,
            max_pages,
            max_depth,
        }
    }

    /// Takes the next task in FIFO order
    ///
    /// Returns `None` when the queue is empty or the page budget is spent.
    /// Every task returned counts against the budget.
    pub fn pop(&mut self) -> Option<CrawlTask> {
        if self.is_budget_spent() {
            return None;
        }

        let task = self.queue.pop_front()?;
        self.pages_visited += 1;
        Some(task)
    }

    /// Offers a discovered URL at the given depth
    ///
    /// Returns true if the URL was enqueued. Offering a URL that is already
    /// known, too deep, out of scope or not a crawlable http(s) URL is a no-op.
    pub fn offer(&mut self, url: &Url, depth: u32) -> bool {
        if depth > self.max_depth || !self.scope.contains(url) {
            return false;
        }

        let normalized = match normalize_url(url.as_str()) {
            Ok(normalized) => normalized,
            Err(e) => {
                tracing::trace!("Not enqueuing {}: {}", url, e);
                return false;
            }
        };

        if !self.visited.insert(visit_key(&normalized)) {
            return false;
        }

        self.queue.push_back(CrawlTask {
            url: normalized,
            depth,
        });
        true
    }

    /// Returns true once `max_pages` tasks have been popped
    pub fn is_budget_spent(&self) -> bool {
        self.pages_visited >= self.max_pages
    }

    /// Number of tasks popped so far
    pub fn pages_visited(&self) -> u32 {
        self.pages_visited
    }

    /// Number of tasks waiting
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Number of distinct URLs ever enqueued, seed included
    pub fn visited_len(&self) -> usize {
        self.visited.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn scope(&self) -> &SiteScope {
        &self.scope
    }
}
