//! Batch scheduler - runs many site crawls under one concurrency limit
//!
//! Every seed becomes its own spawned task. A task waits for a semaphore
//! permit, starts its site deadline, crawls, and hands back a
//! `SiteCrawlResult`. Results are only merged once every task has finished.

use crate::config::{Config, CrawlerConfig};
use crate::crawler::fetcher::Fetcher;
use crate::crawler::site::{SiteCrawlResult, SiteCrawler};
use crate::extract::Extractor;
use crate::state::{FailureCounts, SiteState};
use crate::SweepError;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Everything a batch produced, in seed order
#[derive(Debug, Clone)]
pub struct BatchReport {
    /// One result per seed, in the order the seeds were given
    pub sites: Vec<SiteCrawlResult>,

    /// When the batch started
    pub started_at: DateTime<Utc>,

    /// Total wall-clock time of the batch
    pub elapsed: Duration,
}

impl BatchReport {
    /// Number of sites that ended in `state`
    pub fn count_in(&self, state: SiteState) -> usize {
        self.sites.iter().filter(|site| site.state == state).count()
    }

    /// Total pages fetched across all sites
    pub fn pages_visited(&self) -> u64 {
        self.sites.iter().map(|site| site.pages_visited as u64).sum()
    }

    /// Page failures summed across all sites
    pub fn failures(&self) -> FailureCounts {
        let mut total = FailureCounts::new();
        for site in &self.sites {
            total.merge(&site.failures);
        }
        total
    }
}

/// Runs a batch of site crawls
pub struct BatchScheduler {
    config: Arc<CrawlerConfig>,
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
}

impl BatchScheduler {
    /// Creates a scheduler with a fetcher built from configuration
    pub fn new(config: &Config) -> Result<Self, SweepError> {
        let fetcher = Fetcher::new(&config.crawler, &config.user_agent)?;
        Ok(Self::with_fetcher(config, fetcher))
    }

    /// Creates a scheduler around an existing fetcher
    pub fn with_fetcher(config: &Config, fetcher: Fetcher) -> Self {
        let permits = config.crawler.max_concurrent_sites.max(1) as usize;
        Self {
            config: Arc::new(config.crawler.clone()),
            fetcher: Arc::new(fetcher),
            extractor: Arc::new(Extractor::from_config(&config.extractor)),
            semaphore: Arc::new(Semaphore::new(permits)),
            shutdown: CancellationToken::new(),
        }
    }

    /// Token that cancels every site of the batch when triggered
    ///
    /// Cancelled sites report whatever they collected as `TimedOut`.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Crawls every seed and waits for all of them to reach a terminal state
    ///
    /// A site that fails or panics never affects the others; it shows up in
    /// the report as `Failed`.
    pub async fn run(&self, seeds: Vec<String>) -> BatchReport {
        let started_at = Utc::now();
        let start = Instant::now();

        tracing::info!(
            "Starting batch of {} sites ({} at a time, {:?} per site)",
            seeds.len(),
            self.config.max_concurrent_sites,
            self.config.site_timeout()
        );

        let handles: Vec<(String, JoinHandle<SiteCrawlResult>)> = seeds
            .into_iter()
            .map(|seed| {
                let handle = tokio::spawn(crawl_site(
                    seed.clone(),
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.extractor),
                    Arc::clone(&self.config),
                    Arc::clone(&self.semaphore),
                    self.shutdown.clone(),
                ));
                (seed, handle)
            })
            .collect();

        let mut sites = Vec::with_capacity(handles.len());
        for (seed, handle) in handles {
            sites.push(join_site(seed, handle).await);
        }

        let report = BatchReport {
            sites,
            started_at,
            elapsed: start.elapsed(),
        };

        tracing::info!(
            "Batch finished in {:?}: {} completed, {} exhausted, {} timed out, {} failed",
            report.elapsed,
            report.count_in(SiteState::Completed),
            report.count_in(SiteState::Exhausted),
            report.count_in(SiteState::TimedOut),
            report.count_in(SiteState::Failed)
        );

        report
    }
}

/// Crawls one site once a concurrency slot is free
///
/// The site deadline starts after the permit is acquired, so time spent
/// waiting in line does not count against it.
async fn crawl_site(
    seed: String,
    fetcher: Arc<Fetcher>,
    extractor: Arc<Extractor>,
    config: Arc<CrawlerConfig>,
    semaphore: Arc<Semaphore>,
    shutdown: CancellationToken,
) -> SiteCrawlResult {
    let permit = tokio::select! {
        biased;
        _ = shutdown.cancelled() => {
            tracing::debug!("{} cancelled before it started", seed);
            return SiteCrawlResult::empty(seed, SiteState::TimedOut);
        }
        permit = semaphore.acquire_owned() => permit,
    };

    let _permit = match permit {
        Ok(permit) => permit,
        Err(e) => {
            tracing::error!("Concurrency limiter closed, skipping {}: {}", seed, e);
            return SiteCrawlResult::failed(seed);
        }
    };

    let cancel = shutdown.child_token();
    let deadline = {
        let cancel = cancel.clone();
        let timeout = config.site_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            cancel.cancel();
        })
    };

    let result = SiteCrawler::new(seed, fetcher, extractor, config)
        .run(&cancel)
        .await;

    deadline.abort();
    result
}

/// Waits for a site task, turning a panic or abort into a `Failed` result
async fn join_site(seed: String, handle: JoinHandle<SiteCrawlResult>) -> SiteCrawlResult {
    match handle.await {
        Ok(result) => result,
        Err(e) => {
            tracing::error!("Crawl of {} aborted: {}", seed, e);
            SiteCrawlResult::failed(seed)
        }
    }
}

/// Crawls a batch of seeds with a freshly built scheduler
///
/// # Example
///
/// ```no_run
/// use mailsweep::{run_batch, Config};
///
/// # async fn example() -> mailsweep::Result<()> {
/// let seeds = vec!["https://example.com".to_string()];
/// let report = run_batch(&Config::default(), seeds).await?;
/// for site in &report.sites {
///     println!("{}: {:?}", site.seed, site.emails);
/// }
/// # Ok(())
/// # }
/// ```
pub async fn run_batch(config: &Config, seeds: Vec<String>) -> Result<BatchReport, SweepError> {
    let scheduler = BatchScheduler::new(config)?;
    Ok(scheduler.run(seeds).await)
}
