//! Updates Watcher CLI
//!
//! One invocation performs one pass; scheduling is left to cron or CI.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use updates_watcher::{
    config::load_destinations,
    error::Result,
    models::Config,
    pipeline,
    services::{Notifier, PageFetcher, WebhookClient},
    storage::{LinkStore, SqliteStore},
    utils::redact_endpoint,
};

/// Updates Watcher - announces new and retitled update links
#[derive(Parser, Debug)]
#[command(
    name = "updates-watcher",
    version,
    about = "Watches an updates listing page and posts changes to webhooks"
)]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// SQLite database path (overrides storage.db_path)
    #[arg(long, env = "DB_PATH", global = true)]
    db: Option<PathBuf>,

    /// JSON destinations file (overrides notify.destinations_file)
    #[arg(long, global = true)]
    destinations: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check the listing page once and notify about changes (default)
    Run,

    /// Validate configuration and show resolved destinations
    Validate,

    /// Show what the store currently tracks
    Info {
        /// Number of recent links to list
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool, default_level: &str) {
    let level = if verbose { "debug" } else { default_level };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Config is read before logging starts so its level can apply; a load
    // failure is re-reported below once the logger exists.
    let loaded = Config::load(&cli.config);
    let config = loaded.as_ref().cloned().unwrap_or_default();
    init_logging(cli.verbose, &config.logging.level);
    if let Err(e) = &loaded {
        log::warn!(
            "Config load failed from {}: {}. Using defaults.",
            cli.config.display(),
            e
        );
    }

    let db_path = cli
        .db
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.storage.db_path));
    let destinations_path = cli
        .destinations
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.notify.destinations_file));

    match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, &db_path, &destinations_path).await?,

        Command::Validate => {
            log::info!("Validating configuration...");
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            log::info!("✓ Config OK");

            let destinations = load_destinations(&destinations_path);
            if destinations.is_empty() {
                log::warn!("No destinations resolved; messages will be printed locally");
            }
            for destination in &destinations {
                log::info!(
                    "Destination: {} (prefix {:?})",
                    redact_endpoint(&destination.endpoint),
                    destination.prefix
                );
            }
        }

        Command::Info { limit } => {
            let store = SqliteStore::open(&db_path)?;
            store.ensure_schema()?;

            log::info!("Store: {}", db_path.display());
            log::info!("Tracked links: {}", store.count()?);
            for link in store.recent(limit)? {
                log::info!(
                    "  {} | {} | {}",
                    link.first_seen_utc.format("%Y-%m-%d %H:%M"),
                    link.last_title.as_deref().unwrap_or("(no title)"),
                    link.url
                );
            }
        }
    }

    Ok(())
}

/// One reconciliation pass. Any error here makes the process exit non-zero.
async fn run(config: &Config, db_path: &Path, destinations_path: &Path) -> Result<()> {
    let destinations = load_destinations(destinations_path);
    log::info!("Resolved {} destination(s)", destinations.len());

    let store = SqliteStore::open(db_path)?;
    let fetcher = PageFetcher::new(&config.watcher)?;
    let notifier = Notifier::new(destinations, WebhookClient::new(&config.notify)?);

    log::info!("Checking {}", fetcher.listing_url());
    match pipeline::run_watcher(&fetcher, &store, &notifier, &config.notify).await {
        Ok(_) => Ok(()),
        Err(e) => {
            if e.is_fetch() {
                log::error!("Error fetching {}: {}", fetcher.listing_url(), e);
            } else {
                log::error!("Run failed: {}", e);
            }
            Err(e)
        }
    }
}
