use std::collections::BTreeMap;
use std::fmt;

/// Classification of a failed page fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FailureKind {
    /// Connection reset, timeout, 5xx, 408/429: retried with backoff
    NetworkTransient,

    /// Other 4xx, DNS failure, malformed URL: never retried
    NetworkPermanent,

    /// Body larger than the configured cap: discarded without parsing
    PayloadTooLarge,
}

impl FailureKind {
    /// Returns true if a fetch failing this way may be attempted again
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::NetworkTransient)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NetworkTransient => "network_transient",
            Self::NetworkPermanent => "network_permanent",
            Self::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Per-kind counters of page failures
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FailureCounts {
    counts: BTreeMap<FailureKind, u32>,
}

impl FailureCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, kind: FailureKind) {
        *self.counts.entry(kind).or_insert(0) += 1;
    }

    pub fn get(&self, kind: FailureKind) -> u32 {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.counts.values().sum()
    }

    /// Adds every counter of `other` into `self`
    pub fn merge(&mut self, other: &FailureCounts) {
        for (kind, count) in &other.counts {
            *self.counts.entry(*kind).or_insert(0) += count;
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FailureKind, u32)> + '_ {
        self.counts.iter().map(|(k, v)| (*k, *v))
    }
}
