//! Bulletin-Harvest main entry point
//!
//! This is the command-line interface for the Bulletin-Harvest board harvester.

use anyhow::Context;
use bulletin_harvest::config::{load_config_with_hash, select_boards, BoardConfig, Config};
use bulletin_harvest::crawler::{run_batch, Coordinator};
use bulletin_harvest::output::{load_statistics, print_statistics, write_reports};
use bulletin_harvest::storage::{open_storage, StateStore};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing_subscriber::EnvFilter;

/// Bulletin-Harvest: an incremental bulletin board harvester
///
/// Bulletin-Harvest walks the list pages of the configured boards, fetches
/// each new post's detail page, tags it with a region and stops at the
/// newest post seen by the previous run.
#[derive(Parser, Debug)]
#[command(name = "bulletin-harvest")]
#[command(version = "1.0.0")]
#[command(about = "An incremental bulletin board harvester", long_about = None)]
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

    /// Only crawl the board with this category name
    #[arg(long, value_name = "NAME")]
    category: Option<String>,

    /// Forget every last-crawled link before crawling
    #[arg(long, conflicts_with_all = ["dry_run", "stats"])]
    fresh: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    let boards = select_boards(&config, cli.category.as_deref())?;

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &boards);
    } else if cli.stats {
        handle_stats(&config)?;
    } else {
        handle_crawl(&config, &boards, &config_hash, cli.fresh).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("bulletin_harvest=info,warn"),
            1 => EnvFilter::new("bulletin_harvest=debug,info"),
            2 => EnvFilter::new("bulletin_harvest=trace,debug"),
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

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, boards: &[BoardConfig]) {
    println!("=== Bulletin-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Default page cap: {}", config.crawler.max_pages);
    println!("  Detail concurrency: {}", config.crawler.detail_concurrency);
    println!("  Detail timeout: {}ms", config.crawler.detail_timeout_ms);
    println!(
        "  Concurrent boards: {}",
        config.crawler.max_concurrent_boards
    );

    println!("\nTransport:");
    println!("  User agent: {}", config.transport.user_agent);
    println!("  Request timeout: {}ms", config.transport.request_timeout_ms);
    println!(
        "  Attempts: {} (backoff {}ms..{}ms)",
        config.transport.max_attempts,
        config.transport.base_backoff_ms,
        config.transport.max_backoff_ms
    );

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);
    println!(
        "  Report: {}",
        config.output.report_path.as_deref().unwrap_or("(disabled)")
    );
    println!(
        "  Summary: {}",
        config.output.summary_path.as_deref().unwrap_or("(disabled)")
    );

    println!("\nBoards ({}):", boards.len());
    for board in boards {
        println!(
            "  - {} [{:?}, up to {} page(s)]",
            board.category_name, board.kind, board.pages_to_crawl_limit
        );
        println!("    * {}1", board.list_page_url_prefix);
    }

    println!("\n✓ Configuration is valid");
    println!(
        "✓ Would crawl at most {} list page(s)",
        boards
            .iter()
            .map(|b| b.pages_to_crawl_limit as u64)
            .sum::<u64>()
    );
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_storage(Path::new(&config.output.database_path))?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(
    config: &Config,
    boards: &[BoardConfig],
    config_hash: &str,
    fresh: bool,
) -> anyhow::Result<()> {
    let mut storage = open_storage(Path::new(&config.output.database_path))
        .context("Failed to open the harvest database")?;

    if fresh {
        let cleared = storage.reset_crawl_state()?;
        tracing::info!(cleared, "Starting fresh crawl (last-crawled links forgotten)");
    }

    let store = Arc::new(Mutex::new(storage));
    let coordinator = Coordinator::from_config(config, store)?;

    tracing::info!("Boards: {}", boards.len());
    let report = run_batch(
        &coordinator,
        boards,
        config_hash,
        config.crawler.max_concurrent_boards as usize,
    )
    .await;

    write_reports(&report, &config.output)?;

    for category in &report.categories {
        tracing::info!(
            category = %category.category,
            new_posts = category.post_count(),
            stored = category.persisted.accepted,
            ended = %category.termination,
            "Category result"
        );
    }
    tracing::info!(
        "Harvest completed: {} new post(s), {} stored",
        report.total_new_posts(),
        report.total_accepted()
    );

    Ok(())
}
