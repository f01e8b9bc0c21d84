//! URL handling module for Mailsweep
//!
//! This module provides URL normalization, site domain extraction and the
//! domain-scope policy that keeps a crawl on its own site.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{extract_domain, registrable_domain, DomainScope, SiteScope};
pub use normalize::{normalize_url, visit_key};
