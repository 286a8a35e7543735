//! Shelf-Crawler main entry point
//!
//! This is the command-line interface for the Shelf-Crawler catalog crawler.

use anyhow::Context;
use chrono::Local;
use clap::Parser;
use shelf_crawler::config::{load_config_with_hash, Config};
use shelf_crawler::crawler::{crawl, ProgressCallback};
use shelf_crawler::output::{
    build_report, generate_markdown_report, load_statistics, print_statistics,
};
use shelf_crawler::storage::{record_outcome, SqliteStorage, Storage};
use shelf_crawler::{CrawlStats, RunState};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Shelf-Crawler: a polite catalog crawler
///
/// Shelf-Crawler walks the paginated search results of an online bookshop,
/// enriches every item from its detail page and keeps the ones with real
/// authors. Results are stored in SQLite and summarized in a markdown report.
#[derive(Parser, Debug)]
#[command(name = "shelf-crawler")]
#[command(version = "1.0.0")]
#[command(about = "A polite catalog crawler", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Search query substituted into the configured search-url
    #[arg(long, conflicts_with = "seed_url")]
    query: Option<String>,

    /// Listing page to start from, overriding the configuration
    #[arg(long, value_name = "URL")]
    seed_url: Option<String>,

    /// Maximum number of listing pages to process
    #[arg(long, value_parser = clap::value_parser!(u32).range(1..=500))]
    max_pages: Option<u32>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "report"])]
    dry_run: bool,

    /// Show statistics of the latest run from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "report"])]
    stats: bool,

    /// Regenerate the markdown report from existing data and exit
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    report: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }

    // Handle different modes
    if cli.stats {
        handle_stats(&config)
    } else if cli.report {
        handle_report(&config)
    } else {
        let seed_url = resolve_seed_url(&config, &cli)?;
        if cli.dry_run {
            handle_dry_run(&config, &seed_url);
            Ok(())
        } else {
            handle_crawl(&config, &config_hash, &seed_url, cli.quiet).await
        }
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("shelf_crawler=info,warn"),
            1 => EnvFilter::new("shelf_crawler=debug,info"),
            2 => EnvFilter::new("shelf_crawler=trace,debug"),
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

/// Picks the seed URL: `--seed-url`, then `--query`, then the configuration
fn resolve_seed_url(config: &Config, cli: &Cli) -> anyhow::Result<String> {
    if let Some(seed_url) = &cli.seed_url {
        return Ok(seed_url.clone());
    }

    config
        .crawler
        .resolve_seed_url(cli.query.as_deref())
        .context("Cannot determine where to start crawling")
}

/// Handles the --dry-run mode: shows the resolved configuration
fn handle_dry_run(config: &Config, seed_url: &str) {
    println!("=== Shelf-Crawler Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", seed_url);
    println!("  Max pages: {}", config.crawler.max_pages);
    println!("  Request delay: {}ms", config.crawler.request_delay);
    println!("  Page delay: {}ms", config.crawler.page_delay);
    println!("  Listing failure: {:?}", config.crawler.listing_failure);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.name);

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!("  Report: {}", config.output.report_path);
    println!("  Report limit: {}", config.output.report_limit);

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl up to {} listing pages starting at {}",
        config.crawler.max_pages, seed_url
    );
}

/// Handles the --stats mode: shows statistics of the latest run
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let run = load_statistics(&storage)?;

    println!("Run {} started {} ({})\n", run.id, run.started_at, run.seed_url);
    print_statistics(run.state, &run.stats);
    println!("\nItems in database: {}", storage.count_items()?);

    Ok(())
}

/// Handles the --report mode: regenerates the markdown report
fn handle_report(config: &Config) -> anyhow::Result<()> {
    println!("=== Exporting Crawl Report ===\n");
    println!("Database: {}", config.output.database_path);
    println!("Output: {}", config.output.report_path);
    println!();

    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;

    tracing::info!("Loading crawl data from database...");
    let run = load_statistics(&storage)?;
    let report = build_report(&storage, &run, None, config.output.report_limit)?;

    tracing::info!("Generating markdown report...");
    generate_markdown_report(&report, Path::new(&config.output.report_path))?;

    println!("✓ Report exported to: {}", config.output.report_path);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    config_hash: &str,
    seed_url: &str,
    quiet: bool,
) -> anyhow::Result<()> {
    let mut storage = SqliteStorage::new(Path::new(&config.output.database_path))
        .with_context(|| format!("Failed to open database {}", config.output.database_path))?;
    let run_id = storage.create_run(config_hash, seed_url, config.crawler.max_pages)?;

    // Ctrl-C stops the crawl at the next checkpoint; results so far are kept
    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping crawl");
            interrupt.cancel();
        }
    });

    let progress: Option<ProgressCallback> = if quiet {
        None
    } else {
        Some(Arc::new(|message: &str| {
            println!("{}: {}", Local::now().format("%H:%M:%S"), message);
        }))
    };

    let outcome = match crawl(config, seed_url, cancel, progress).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            storage.finish_run(run_id, RunState::Aborted, &CrawlStats::default())?;
            return Err(e.into());
        }
    };

    let saved = record_outcome(&mut storage, run_id, &outcome)?;
    tracing::info!("Saved {} items (run {})", saved, run_id);

    if !quiet {
        println!();
        print_statistics(outcome.state, &outcome.stats);
    }

    let run = storage.get_run(run_id)?;
    let report = build_report(
        &storage,
        &run,
        Some(outcome.items),
        config.output.report_limit,
    )?;
    generate_markdown_report(&report, Path::new(&config.output.report_path))?;

    if !quiet {
        println!("\n✓ Report written to: {}", config.output.report_path);
    }

    Ok(())
}
