//! Output module for batch results
//!
//! This module handles:
//! - Building the sorted (website, email) relation and writing it as CSV
//! - Summarizing a batch by site state and failure kind

mod relation;
pub mod stats;

pub use relation::{ContactRelation, CSV_HEADER};
pub use stats::{log_statistics, print_statistics, BatchStatistics};
