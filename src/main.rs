//! Mailsweep main entry point
//!
//! This is the command-line interface for the Mailsweep contact crawler.

use anyhow::Context;
use clap::Parser;
use mailsweep::config::{load_config_with_hash, load_seeds, Config};
use mailsweep::crawler::BatchScheduler;
use mailsweep::output::{log_statistics, print_statistics, BatchStatistics, ContactRelation};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Mailsweep: a bounded contact-address crawler
///
/// Mailsweep crawls a list of organization homepages in parallel, follows
/// each site's internal links breadth-first within a depth and page budget,
/// and writes the role mailboxes it finds as a `website,email` CSV.
#[derive(Parser, Debug)]
#[command(name = "mailsweep")]
#[command(version)]
#[command(about = "A bounded contact-address crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Seed file: one homepage URL per line, `#` starts a comment
    #[arg(value_name = "SEEDS")]
    seeds: PathBuf,

    /// Write the CSV here instead of the configured csv-path
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and seeds and show what would be crawled without crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let seeds = load_seeds(&cli.seeds)
        .with_context(|| format!("failed to load seeds {}", cli.seeds.display()))?;
    tracing::info!("Loaded {} seed URLs", seeds.len());

    let output = cli
        .output
        .unwrap_or_else(|| PathBuf::from(&config.output.csv_path));

    if cli.dry_run {
        handle_dry_run(&config, &seeds, &output);
        return Ok(());
    }

    handle_batch(config, seeds, &output, cli.quiet).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("mailsweep=info,warn"),
            1 => EnvFilter::new("mailsweep=debug,info"),
            2 => EnvFilter::new("mailsweep=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated plan
fn handle_dry_run(config: &Config, seeds: &[String], output: &Path) {
    let crawler = &config.crawler;

    println!("=== Mailsweep Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Max depth: {}", crawler.max_depth);
    println!("  Max pages per site: {}", crawler.max_pages);
    println!("  Concurrent sites: {}", crawler.max_concurrent_sites);
    println!("  Site timeout: {}s", crawler.site_timeout);
    println!(
        "  Request timeout: {}s (connect {}s)",
        crawler.request_timeout, crawler.connect_timeout
    );
    println!("  Max body size: {} bytes", crawler.max_body_bytes);
    println!("  Verify TLS: {}", crawler.verify_tls);
    println!("  Domain scope: {}", crawler.domain_scope);
    println!(
        "  Retries: {} attempts, {}ms base backoff",
        crawler.retry_attempts, crawler.retry_backoff
    );

    println!("\nUser Agent: {}", config.user_agent.header_value());
    println!("Role aliases: {}", config.extractor.role_aliases.len());

    println!("\nOutput:");
    println!("  CSV: {}", output.display());
    println!("  Empty rows: {}", config.output.emit_empty_rows);

    println!("\nSeeds ({}):", seeds.len());
    for seed in seeds {
        println!("  - {}", seed);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would crawl {} sites", seeds.len());
}

/// Runs the batch, writes the CSV and prints the summary
///
/// Ctrl-C cancels every running site; whatever they collected is still
/// written.
async fn handle_batch(
    config: Config,
    seeds: Vec<String>,
    output: &Path,
    quiet: bool,
) -> anyhow::Result<()> {
    let scheduler = BatchScheduler::new(&config).context("failed to build HTTP client")?;

    let shutdown = scheduler.shutdown_token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted, cancelling running sites");
            shutdown.cancel();
        }
    });

    let report = scheduler.run(seeds).await;

    let relation = ContactRelation::from_results(&report.sites, config.output.emit_empty_rows);
    relation
        .write_csv_file(output)
        .with_context(|| format!("failed to write {}", output.display()))?;
    tracing::info!("Wrote {} rows to {}", relation.len(), output.display());

    let stats = BatchStatistics::from_report(&report, relation.len());
    log_statistics(&stats);
    if !quiet {
        println!();
        print_statistics(&stats);
    }

    Ok(())
}
