//! Kydao-Harvest main entry point
//!
//! This is the command-line interface for the kydao.net game record harvester.

use clap::Parser;
use kydao_harvest::config::{compute_content_hash, load_config_with_hash, validate, Config};
use kydao_harvest::crawler::crawl;
use kydao_harvest::output::{load_statistics, print_listing, print_statistics, ListKind};
use kydao_harvest::storage::open_storage;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Kydao-Harvest: a crawler for kydao.net game records
///
/// Kydao-Harvest discovers players breadth-first from a seed page, walks
/// each player's game listing, extracts the move list of every game and
/// stores players, events and games in a SQLite database.
#[derive(Parser, Debug)]
#[command(name = "kydao-harvest")]
#[command(version = "1.0.0")]
#[command(about = "A crawler for kydao.net game records", long_about = None)]
struct Cli {
    /// Seed page URL (overrides the configuration)
    #[arg(value_name = "URL")]
    url: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Maximum listing pages walked per player
    #[arg(long, value_name = "N")]
    max_pages: Option<u32>,

    /// Path to the SQLite database (overrides the configuration)
    #[arg(long, value_name = "PATH", env = "KYDAO_DATABASE")]
    database: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "list"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "list"])]
    stats: bool,

    /// List stored records (players, events or games) and exit
    #[arg(long, value_name = "KIND", conflicts_with_all = ["dry_run", "stats"])]
    list: Option<ListKind>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let (config, config_hash) = match resolve_config(&cli) {
        Ok(resolved) => resolved,
        Err(e) => {
            tracing::error!("Failed to load configuration: {}", e);
            return Err(e);
        }
    };

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &config_hash);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(kind) = cli.list {
        handle_list(&config, kind)?;
    } else {
        handle_crawl(config, &config_hash).await?;
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
            0 => EnvFilter::new("kydao_harvest=info,warn"),
            1 => EnvFilter::new("kydao_harvest=debug,info"),
            2 => EnvFilter::new("kydao_harvest=trace,debug"),
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

/// Loads the configuration file if given, then applies command line overrides
fn resolve_config(cli: &Cli) -> Result<(Config, String), Box<dyn std::error::Error>> {
    let (mut config, hash) = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            (config, hash)
        }
        None => {
            tracing::debug!("No configuration file given, using defaults");
            (Config::default(), compute_content_hash(""))
        }
    };

    if let Some(url) = &cli.url {
        config.crawler.seed_url = url.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawler.max_pages = max_pages;
    }
    if let Some(path) = &cli.database {
        config.storage.database_path = Some(path.display().to_string());
    }

    validate(&config)?;
    Ok((config, hash))
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, config_hash: &str) {
    println!("=== Kydao-Harvest Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Seed URL: {}", config.crawler.seed_url);
    println!("  Max pages per player: {}", config.crawler.max_pages);

    println!("\nFetcher:");
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    println!("  Max retries: {}", config.fetcher.max_retries);
    println!("  Backoff factor: {}", config.fetcher.backoff_factor);
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Accept-Language: {}", config.fetcher.accept_language);

    println!("\nDetail:");
    if config.detail.nonce_placeholder.is_empty() {
        println!("  Nonce substitution: disabled");
    } else {
        println!("  Nonce placeholder: {}", config.detail.nonce_placeholder);
    }

    println!("\nStorage:");
    match &config.storage.database_path {
        Some(path) => println!("  Database: {}", path),
        None => println!("  Database: none (games will not be persisted)"),
    }

    println!("\nConfig hash: {}", config_hash);
    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling from {}", config.crawler.seed_url);
}

fn database_path(config: &Config) -> Result<&Path, Box<dyn std::error::Error>> {
    config
        .storage
        .database_path
        .as_deref()
        .map(Path::new)
        .ok_or_else(|| "No database configured; pass --database or set [storage] database-path".into())
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let path = database_path(config)?;
    println!("Database: {}\n", path.display());

    let storage = open_storage(path)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --list mode: prints stored records of one kind
fn handle_list(config: &Config, kind: ListKind) -> Result<(), Box<dyn std::error::Error>> {
    let path = database_path(config)?;
    let storage = open_storage(path)?;
    print_listing(&storage, kind)?;
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: &str) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!(
        "Starting crawl from {} (max {} pages per player)",
        config.crawler.seed_url,
        config.crawler.max_pages
    );

    match crawl(config, config_hash).await {
        Ok(summary) => {
            tracing::info!(
                "Crawl completed successfully: {} games recorded",
                summary.games_recorded
            );
            Ok(())
        }
        Err(e) => {
            tracing::error!("Crawl failed: {}", e);
            Err(e.into())
        }
    }
}
