//! Configuration module for Mailsweep
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and loading the seed list a batch starts from.
//!
//! # Example
//!
//! ```no_run
//! use mailsweep::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("mailsweep.toml")).unwrap();
//! println!("Crawler will use max depth: {}", config.crawler.max_depth);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{Config, CrawlerConfig, ExtractorConfig, OutputConfig, UserAgentConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_config, load_config_with_hash, load_seeds, parse_config,
    parse_seeds,
};
pub use validation::validate_seed;
