//! Site crawler - the crawl loop for a single seed
//!
//! One `SiteCrawler` owns one frontier and walks it breadth-first until the
//! queue empties, the page budget runs out, its cancellation token fires or
//! the seed itself proves unreachable.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{Fetcher, PageResult};
use crate::crawler::frontier::{CrawlTask, Frontier};
use crate::crawler::parser::{is_html, parse_html};
use crate::extract::Extractor;
use crate::state::{FailureCounts, SiteState};
use crate::url::{normalize_url, SiteScope};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;
use url::Url;

/// Outcome of crawling one site
#[derive(Debug, Clone)]
pub struct SiteCrawlResult {
    /// The seed URL as it was given (after seed-file cleanup)
    pub seed: String,

    /// Distinct addresses found, lowercase
    pub emails: BTreeSet<String>,

    /// Pages whose fetch finished, successfully or not
    pub pages_visited: u32,

    /// Wall-clock time from the first fetch to the terminal state
    pub elapsed: Duration,

    /// Terminal state of the crawl
    pub state: SiteState,

    /// Page failures by kind
    pub failures: FailureCounts,
}

impl SiteCrawlResult {
    /// An empty result in the given terminal state
    pub fn empty(seed: impl Into<String>, state: SiteState) -> Self {
        Self {
            seed: seed.into(),
            emails: BTreeSet::new(),
            pages_visited: 0,
            elapsed: Duration::ZERO,
            state,
            failures: FailureCounts::new(),
        }
    }

    /// An empty result for a site that could not be crawled at all
    pub fn failed(seed: impl Into<String>) -> Self {
        Self::empty(seed, SiteState::Failed)
    }
}

/// Crawls a single site
pub struct SiteCrawler {
    seed: String,
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
    config: Arc<CrawlerConfig>,
    state: SiteState,
}

impl SiteCrawler {
    /// Creates an idle crawler for a seed
    ///
    /// # Arguments
    ///
    /// * `seed` - Seed URL string, validated when the crawl starts
    /// * `fetcher` - Shared fetcher (and thus the shared connection pool)
    /// * `extractor` - Shared address extractor
    /// * `config` - Crawl limits
    pub fn new(
        seed: impl Into<String>,
        fetcher: Arc<Fetcher>,
        extractor: Arc<Extractor>,
        config: Arc<CrawlerConfig>,
    ) -> Self {
        Self {
            seed: seed.into(),
            fetcher,
            extractor,
            config,
            state: SiteState::Idle,
        }
    }

    pub fn state(&self) -> SiteState {
        self.state
    }

    /// Moves to `next` if the lifecycle allows it
    ///
    /// An illegal move is logged and refused; the current state is kept.
    fn transition(&mut self, next: SiteState) -> bool {
        if !self.state.can_transition_to(next) {
            tracing::warn!(
                "{}: refusing illegal site transition {} -> {}",
                self.seed,
                self.state,
                next
            );
            return false;
        }
        tracing::trace!("{}: {} -> {}", self.seed, self.state, next);
        self.state = next;
        true
    }

    /// Runs the crawl to a terminal state
    ///
    /// The loop:
    /// 1. Pops the next task (empty queue: `Completed`; spent budget with
    ///    tasks left: `Exhausted`)
    /// 2. Races the fetch against `cancel` (cancelled: `TimedOut`, keeping
    ///    everything collected so far)
    /// 3. Extracts addresses and, for HTML pages above the depth limit,
    ///    offers discovered links one level deeper
    ///
    /// A failure on the seed page ends the crawl as `Failed` with an empty
    /// result; failures on deeper pages are counted and skipped.
    pub async fn run(mut self, cancel: &CancellationToken) -> SiteCrawlResult {
        let start = Instant::now();

        let seed_url = match normalize_url(&self.seed) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!("Skipping invalid seed {}: {}", self.seed, e);
                self.transition(SiteState::Failed);
                return SiteCrawlResult::failed(self.seed);
            }
        };

        let Some(scope) = SiteScope::for_seed(&seed_url, self.config.domain_scope) else {
            tracing::warn!("Skipping seed without a host: {}", self.seed);
            self.transition(SiteState::Failed);
            return SiteCrawlResult::failed(self.seed);
        };

        let mut frontier = Frontier::new(
            seed_url,
            scope,
            self.config.max_depth,
            self.config.max_pages,
        );
        let mut emails = BTreeSet::new();
        let mut failures = FailureCounts::new();
        let mut pages_visited = 0u32;

        self.transition(SiteState::Running);
        tracing::info!(
            "Crawling {} (scope {} {})",
            self.seed,
            frontier.scope().policy(),
            frontier.scope().domain()
        );

        let terminal = loop {
            if cancel.is_cancelled() {
                break SiteState::TimedOut;
            }

            let Some(task) = frontier.pop() else {
                if frontier.is_budget_spent() && frontier.queued() > 0 {
                    break SiteState::Exhausted;
                }
                break SiteState::Completed;
            };

            let fetched = tokio::select! {
                biased;
                _ = cancel.cancelled() => None,
                result = self.fetcher.fetch(&task.url) => Some(result),
            };

            let Some(result) = fetched else {
                tracing::debug!("{}: cancelled while fetching {}", self.seed, task.url);
                break SiteState::TimedOut;
            };
            pages_visited += 1;

            match result {
                PageResult::Content {
                    final_url,
                    content_type,
                    body,
                } => {
                    let found = self.process_page(
                        &mut frontier,
                        &task,
                        &final_url,
                        content_type.as_deref(),
                        &body,
                    );
                    emails.extend(found);
                }
                PageResult::Failure { kind, reason } => {
                    failures.record(kind);
                    if task.depth == 0 {
                        tracing::warn!("Seed {} unreachable ({}): {}", self.seed, kind, reason);
                        emails.clear();
                        break SiteState::Failed;
                    }
                    tracing::debug!("Skipping {} ({}): {}", task.url, kind, reason);
                }
            }
        };

        self.transition(terminal);
        let elapsed = start.elapsed();

        match terminal {
            SiteState::TimedOut => tracing::warn!(
                "{} timed out after {:?}: {} emails from {} pages",
                self.seed,
                elapsed,
                emails.len(),
                pages_visited
            ),
            SiteState::Failed => {}
            _ => tracing::info!(
                "{} {}: {} emails from {} pages in {:?}",
                self.seed,
                terminal,
                emails.len(),
                pages_visited,
                elapsed
            ),
        }

        SiteCrawlResult {
            seed: self.seed,
            emails,
            pages_visited,
            elapsed,
            state: terminal,
            failures,
        }
    }

    /// Extracts addresses from a fetched page and feeds its links back into
    /// the frontier
    fn process_page(
        &self,
        frontier: &mut Frontier,
        task: &CrawlTask,
        final_url: &Url,
        content_type: Option<&str>,
        body: &[u8],
    ) -> BTreeSet<String> {
        let found = self.extractor.extract(body, frontier.scope().domain());

        if task.depth < frontier.max_depth() && is_html(content_type, body) {
            let html = String::from_utf8_lossy(body);
            let parsed = parse_html(&html, final_url);
            let enqueued = parsed
                .links
                .iter()
                .filter(|link| frontier.offer(link, task.depth + 1))
                .count();

            tracing::debug!(
                "Fetched {} (depth {}, title {:?}): {} emails, {}/{} links enqueued",
                task.url,
                task.depth,
                parsed.title.as_deref().unwrap_or(""),
                found.len(),
                enqueued,
                parsed.links.len()
            );
        } else {
            tracing::debug!(
                "Fetched {} (depth {}): {} emails, links not followed",
                task.url,
                task.depth,
                found.len()
            );
        }

        found
    }
}
