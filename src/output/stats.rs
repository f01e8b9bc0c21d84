//! Batch statistics
//!
//! This module summarizes a finished batch for the log and for stdout.

use crate::crawler::BatchReport;
use crate::state::{FailureCounts, SiteState};
use std::collections::BTreeMap;
use std::time::Duration;

/// Batch statistics summary
#[derive(Debug, Clone)]
pub struct BatchStatistics {
    /// Number of seeds in the batch
    pub total_sites: usize,

    /// Count of sites by terminal state
    pub sites_by_state: BTreeMap<SiteState, usize>,

    /// Pages fetched across all sites
    pub total_pages: u64,

    /// Distinct addresses across all sites
    pub unique_emails: usize,

    /// Sites that yielded at least one address
    pub sites_with_emails: usize,

    /// Page failures by kind
    pub failures: FailureCounts,

    /// Rows written to the output relation
    pub total_rows: usize,

    /// Wall-clock time of the batch
    pub elapsed: Duration,
}

impl BatchStatistics {
    /// Computes statistics from a report and the number of output rows
    pub fn from_report(report: &BatchReport, total_rows: usize) -> Self {
        let mut sites_by_state = BTreeMap::new();
        for site in &report.sites {
            *sites_by_state.entry(site.state).or_insert(0) += 1;
        }

        let unique_emails = report
            .sites
            .iter()
            .flat_map(|site| site.emails.iter())
            .collect::<std::collections::BTreeSet<_>>()
            .len();

        Self {
            total_sites: report.sites.len(),
            sites_by_state,
            total_pages: report.pages_visited(),
            unique_emails,
            sites_with_emails: report.sites.iter().filter(|s| !s.emails.is_empty()).count(),
            failures: report.failures(),
            total_rows,
            elapsed: report.elapsed,
        }
    }

    pub fn sites_in(&self, state: SiteState) -> usize {
        self.sites_by_state.get(&state).copied().unwrap_or(0)
    }

    /// Percentage of sites that did not end up `Failed`
    pub fn success_rate(&self) -> f64 {
        if self.total_sites == 0 {
            return 0.0;
        }
        let succeeded = self
            .sites_by_state
            .iter()
            .filter(|(state, _)| state.is_success())
            .map(|(_, count)| *count)
            .sum::<usize>();
        (succeeded as f64 / self.total_sites as f64) * 100.0
    }
}

/// Logs the summary at info level, failures at warn
pub fn log_statistics(stats: &BatchStatistics) {
    tracing::info!(
        "Batch summary: {} sites, {} pages, {} unique emails, {} rows in {:?}",
        stats.total_sites,
        stats.total_pages,
        stats.unique_emails,
        stats.total_rows,
        stats.elapsed
    );
    for state in SiteState::terminal_states() {
        tracing::info!("  {}: {}", state, stats.sites_in(state));
    }
    if stats.failures.total() > 0 {
        for (kind, count) in stats.failures.iter() {
            tracing::warn!("  page failures {}: {}", kind, count);
        }
    }
}

/// Prints statistics to stdout in a formatted manner
pub fn print_statistics(stats: &BatchStatistics) {
    println!("=== Batch Statistics ===\n");

    println!("Overview:");
    println!("  Sites crawled: {}", stats.total_sites);
    println!("  Pages fetched: {}", stats.total_pages);
    println!("  Unique emails: {}", stats.unique_emails);
    println!("  Sites with emails: {}", stats.sites_with_emails);
    println!("  Rows written: {}", stats.total_rows);
    println!("  Elapsed: {:.1}s", stats.elapsed.as_secs_f64());
    println!();

    println!("Sites by State:");
    for state in SiteState::terminal_states() {
        let count = stats.sites_in(state);
        let percentage = if stats.total_sites > 0 {
            (count as f64 / stats.total_sites as f64) * 100.0
        } else {
            0.0
        };
        println!("  {}: {} ({:.1}%)", state, count, percentage);
    }
    println!();

    if stats.failures.total() > 0 {
        println!("Page Failures:");
        for (kind, count) in stats.failures.iter() {
            println!("  {}: {}", kind, count);
        }
        println!();
    }

    println!(
        "Success Rate: {:.1}% ({} / {} sites produced a result)",
        stats.success_rate(),
        stats.total_sites - stats.sites_in(SiteState::Failed),
        stats.total_sites
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::SiteCrawlResult;
    use crate::state::FailureKind;

    fn report() -> BatchReport {
        let mut a = SiteCrawlResult::empty("https://a.test", SiteState::Completed);
        a.emails.insert("info@a.test".to_string());
        a.pages_visited = 4;
        a.failures.record(FailureKind::NetworkPermanent);

        let mut b = SiteCrawlResult::empty("https://b.test", SiteState::TimedOut);
        b.emails.insert("info@a.test".to_string());
        b.emails.insert("press@b.test".to_string());
        b.pages_visited = 2;

        let mut c = SiteCrawlResult::failed("https://c.test");
        c.pages_visited = 1;
        c.failures.record(FailureKind::NetworkTransient);

        BatchReport {
            sites: vec![a, b, c],
            started_at: chrono::Utc::now(),
            elapsed: Duration::from_secs(3),
        }
    }

    #[test]
    fn test_statistics_from_report() {
        let stats = BatchStatistics::from_report(&report(), 3);

        assert_eq!(stats.total_sites, 3);
        assert_eq!(stats.total_pages, 7);
        assert_eq!(stats.unique_emails, 2);
        assert_eq!(stats.sites_with_emails, 2);
        assert_eq!(stats.sites_in(SiteState::Completed), 1);
        assert_eq!(stats.sites_in(SiteState::TimedOut), 1);
        assert_eq!(stats.sites_in(SiteState::Failed), 1);
        assert_eq!(stats.sites_in(SiteState::Exhausted), 0);
        assert_eq!(stats.failures.total(), 2);
    }

    #[test]
    fn test_success_rate() {
        let stats = BatchStatistics::from_report(&report(), 3);
        assert!((stats.success_rate() - 66.666).abs() < 0.01);
    }

    #[test]
    fn test_empty_batch_success_rate() {
        let empty = BatchReport {
            sites: Vec::new(),
            started_at: chrono::Utc::now(),
            elapsed: Duration::ZERO,
        };
        assert_eq!(BatchStatistics::from_report(&empty, 0).success_rate(), 0.0);
    }
}
