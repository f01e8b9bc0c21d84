/// Site state definitions for tracking one site crawl
///
/// A site crawl moves `Idle -> Running -> {Completed, Exhausted, TimedOut, Failed}`.
use std::fmt;

/// Represents the current state of a site in the crawl process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SiteState {
    // ===== Active States =====
    /// Crawler has been created but has not fetched anything yet
    Idle,

    /// Crawler is popping and fetching pages
    Running,

    // ===== Terminal States =====
    /// The frontier ran empty
    Completed,

    /// The page budget ran out while links were still queued
    Exhausted,

    /// The per-site deadline (or a batch shutdown) cancelled the crawl;
    /// whatever was collected up to that point is kept
    TimedOut,

    /// The seed itself could not be fetched; the site yields nothing
    Failed,
}

impl SiteState {
    /// Returns true if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Idle | Self::Running)
    }

    /// Returns true if the site's result should be counted as a success
    ///
    /// A timed-out site still delivers its partial result, so only
    /// `Failed` is treated as unsuccessful.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Completed | Self::Exhausted | Self::TimedOut)
    }

    /// Returns true if moving from `self` to `next` is a legal transition
    pub fn can_transition_to(&self, next: SiteState) -> bool {
        match (self, next) {
            (Self::Idle, Self::Running) => true,
            // A site can be cancelled or rejected before its first fetch
            (Self::Idle, Self::TimedOut | Self::Failed) => true,
            (Self::Running, next) => next.is_terminal(),
            _ => false,
        }
    }

    /// Short lowercase label used in logs and reports
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Exhausted => "exhausted",
            Self::TimedOut => "timed_out",
            Self::Failed => "failed",
        }
    }

    /// Returns all terminal states
    pub fn terminal_states() -> [Self; 4] {
        [Self::Completed, Self::Exhausted, Self::TimedOut, Self::Failed]
    }
}

impl fmt::Display for SiteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
