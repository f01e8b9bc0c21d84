//! Crawler module for site crawling and batch orchestration
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching with a size cap and retry logic
//! - HTML parsing and link discovery
//! - The per-site BFS frontier and crawl loop
//! - Batch scheduling under a global concurrency limit

mod backoff;
mod batch;
mod fetcher;
mod frontier;
mod parser;
mod site;

pub use backoff::ExponentialBackoff;
pub use batch::{run_batch, BatchReport, BatchScheduler};
pub use fetcher::{build_http_client, classify_status, Fetcher, PageResult};
pub use frontier::{CrawlTask, Frontier};
pub use parser::{is_html, parse_html, ParsedPage};
pub use site::{SiteCrawlResult, SiteCrawler};
