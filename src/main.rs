//! Leadscout main entry point
//!
//! This is the command-line interface for the Leadscout lead scraper.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use leadscout::browser::HttpBrowser;
use leadscout::config::{load_config_with_hash, validate, Config};
use leadscout::output::{print_run_summary, print_sessions};
use leadscout::{Orchestrator, StateStore};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Leadscout: a resumable business-listing scraper
///
/// Leadscout enumerates listings for a map search query, extracts and
/// validates each business, scores it as a sales lead and writes the results
/// to CSV. Interrupted runs resume where they stopped.
#[derive(Parser, Debug)]
#[command(name = "leadscout")]
#[command(version = "1.0.0")]
#[command(about = "A resumable business-listing scraper", long_about = None)]
struct Cli {
    /// Search query, e.g. "coffee shops in Seattle"
    #[arg(long, required_unless_present = "show_sessions")]
    query: Option<String>,

    /// Maximum number of listings to collect
    #[arg(long, default_value_t = 100)]
    max_results: usize,

    /// Output CSV path (default: business_leads_<timestamp>.csv)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Path to TOML configuration file
    #[arg(long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Run the browser session with a visible window
    ///
    /// Only honored by rendering backends that have a window; the built-in
    /// HTTP backend always runs headless and ignores this flag.
    #[arg(long)]
    visible: bool,

    /// Start fresh even if an incomplete session exists for this query
    #[arg(long)]
    no_resume: bool,

    /// List incomplete sessions and exit
    #[arg(long, conflicts_with = "query")]
    show_sessions: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Explicit log level; overrides -v and -q
    #[arg(long, value_enum, ignore_case = true)]
    log_level: Option<LogLevel>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum LogLevel {
    Debug,
    Info,
    #[value(alias = "warn")]
    Warning,
    Error,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet, cli.log_level);

    let code = match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{:#}", e);
            eprintln!("Error: {:#}", e);
            1
        }
    };

    std::process::exit(code);
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool, level: Option<LogLevel>) {
    let filter = match level {
        Some(LogLevel::Debug) => EnvFilter::new("leadscout=debug,info"),
        Some(LogLevel::Info) => EnvFilter::new("leadscout=info,warn"),
        Some(LogLevel::Warning) => EnvFilter::new("warn"),
        Some(LogLevel::Error) => EnvFilter::new("error"),
        None if quiet => EnvFilter::new("error"),
        None => match verbose {
            0 => EnvFilter::new("leadscout=info,warn"),
            1 => EnvFilter::new("leadscout=debug,info"),
            2 => EnvFilter::new("leadscout=trace,debug"),
            _ => EnvFilter::new("trace"),
        },
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

async fn run(cli: Cli) -> anyhow::Result<i32> {
    let config = load_settings(&cli)?;

    if cli.show_sessions {
        handle_show_sessions(&config)?;
        return Ok(0);
    }

    let Some(query) = cli.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) else {
        bail!("--query must not be empty");
    };
    if cli.max_results == 0 {
        bail!("--max-results must be at least 1");
    }

    handle_scrape(config, query, cli.max_results, cli.output.clone(), !cli.no_resume).await
}

/// Loads the config file (or defaults) and applies CLI overrides
fn load_settings(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::debug!("No config file given, using defaults");
            Config::default()
        }
    };

    if cli.visible {
        config.browser.headless = false;
    }
    validate(&config).context("invalid configuration")?;

    Ok(config)
}

/// Handles --show-sessions: prints incomplete sessions
fn handle_show_sessions(config: &Config) -> anyhow::Result<()> {
    let store = StateStore::open(&config.state.directory, config.state.max_backups)
        .context("failed to open state directory")?;
    let sessions = store.list_active()?;
    print_sessions(&sessions);
    Ok(())
}

/// Handles the main scrape operation
async fn handle_scrape(
    config: Config,
    query: &str,
    max_results: usize,
    output: Option<PathBuf>,
    resume: bool,
) -> anyhow::Result<i32> {
    if resume {
        tracing::info!("Starting '{}' (will resume an incomplete session)", query);
    } else {
        tracing::info!("Starting '{}' fresh (ignoring previous state)", query);
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let browser = HttpBrowser::new(config.browser.clone()).context("failed to start browser")?;
    let mut orchestrator = Orchestrator::new(config, browser, cancel)?;

    let report = orchestrator
        .run(query, max_results, output, resume)
        .await
        .context("scrape failed")?;

    print_run_summary(&report);
    Ok(report.outcome.exit_code())
}

/// Cancels the job on the first Ctrl-C and exits on the second
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("Interrupt received, finishing the current listing and saving progress");
        cancel.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::error!("Second interrupt, exiting without saving");
            std::process::exit(130);
        }
    });
}
