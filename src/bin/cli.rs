//! Park jobs crawler CLI
//!
//! Crawls the Infopark, Technopark and UL Cyberpark job portals and the
//! Cyberpark Kerala job feed into a local SQLite database, mirroring new jobs
//! to a Supabase table when configured.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use parkjobs::{
    error::Result,
    models::Config,
    pipeline::{self, RunOptions},
    services::SourceRegistry,
    storage::{LocalStore, PersistenceGateway},
    utils::http::{Fetcher, HttpFetcher},
};

/// Kerala tech-park job crawler
#[derive(Parser, Debug)]
#[command(name = "parkjobs", version, about = "Tech-park job portal crawler")]
struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "config.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Crawl every enabled source and store new jobs
    Run {
        /// Skip the email backfill pass after saving
        #[arg(long)]
        skip_reconcile: bool,
    },

    /// Backfill missing emails for stored jobs
    Reconcile,

    /// Validate configuration
    Validate,

    /// Show local store statistics
    Info,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn load_config(path: &PathBuf) -> Result<Config> {
    let mut config = Config::load_or_default(path);
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Run { skip_reconcile } => {
            let config = load_config(&cli.config)?;
            let registry = SourceRegistry::from_config(&config.sources)?;
            let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.crawler)?);
            let gateway = PersistenceGateway::from_config(&config)?;

            pipeline::run_pipeline(
                &config,
                &registry,
                fetcher,
                &gateway,
                RunOptions {
                    skip_reconcile,
                    ..RunOptions::default()
                },
            )
            .await?;
        }

        Command::Reconcile => {
            let config = load_config(&cli.config)?;
            let registry = SourceRegistry::from_config(&config.sources)?;
            let fetcher: Arc<dyn Fetcher> = Arc::new(HttpFetcher::new(&config.crawler)?);
            let gateway = PersistenceGateway::from_config(&config)?;

            pipeline::run_reconcile(&config, &registry, fetcher, &gateway).await?;
        }

        Command::Validate => {
            log::info!("Validating configuration...");

            let mut config = Config::load(&cli.config)?;
            config.apply_env_overrides();
            if let Err(e) = config.validate() {
                log::error!("Config validation failed: {}", e);
                return Err(e);
            }
            SourceRegistry::from_config(&config.sources)?;

            log::info!("Config OK");
        }

        Command::Info => {
            let config = load_config(&cli.config)?;
            let store = LocalStore::open(&config.storage.database_path)?;
            store.init_schema()?;

            log::info!("Database: {}", config.storage.database_path.display());
            log::info!("Stored jobs: {}", store.count()?);
            log::info!("Missing email: {}", store.count_missing_email()?);
            log::info!(
                "Remote store: {}",
                match config.remote.url.as_deref() {
                    Some(url) => url,
                    None => "not configured",
                }
            );
        }
    }

    log::info!("Done!");

    Ok(())
}
