//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `SiteState`: lifecycle of one site crawl (idle, running, and the four terminal states)
//! - `FailureKind`: classification of a failed page fetch
//! - `FailureCounts`: per-kind failure counters carried in site results

mod failure;
mod site_state;

// Re-export main types
pub use failure::{FailureCounts, FailureKind};
pub use site_state::SiteState;
