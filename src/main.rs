//! Lead Dashboard
//!
//! Command-line front end for the dashboard core. Runs one fetch with the
//! filters given on the command line, prints the view and optionally exports
//! it, or stays open in interactive mode and reads commands from stdin.

// Compiler warning configuration
#![deny(unused_imports)]
#![deny(unused_mut)]
#![deny(unused_variables)]
#![warn(dead_code)]
#![warn(unused_must_use)]

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use lead_dashboard::command::{Command, HELP};
use lead_dashboard::config::Config;
use lead_dashboard::dashboard::{Dashboard, PendingFetch};
use lead_dashboard::endpoints;
use lead_dashboard::fetch_controller::{FetchController, FetchOutcome};
use lead_dashboard::lead_source::HttpLeadSource;
use lead_dashboard::preferences::PreferenceStore;
use lead_dashboard::render::render;
use lead_dashboard::session::SessionProvider;
use lead_dashboard::structured_logging::DashboardLogger;
use lead_dashboard::telemetry::{HttpTelemetrySink, TelemetryEmitter};
use lead_dashboard::types::{LeadField, SortDirection, SortState, ViewMode};

/// Command line arguments
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    /// Industry filter
    #[arg(long)]
    industry: Option<String>,

    /// Minimum company size (non-numeric input means no minimum)
    #[arg(long)]
    min_size: Option<String>,

    /// Search text matched against name and company
    #[arg(long)]
    search: Option<String>,

    /// Sort field
    #[arg(long)]
    sort: Option<LeadField>,

    /// Sort descending
    #[arg(long, requires = "sort")]
    desc: bool,

    /// Display mode (table or chart)
    #[arg(long)]
    view: Option<ViewMode>,

    /// Write the view as CSV to this path
    #[arg(long)]
    export: Option<PathBuf>,

    /// Toggle the persisted dark mode preference
    #[arg(long)]
    toggle_dark_mode: bool,

    /// Keep running and read commands from stdin
    #[arg(short, long)]
    interactive: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose, args.log_json)?;

    info!("Starting Lead Dashboard v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config(&args.config)?;
    info!(leads_url = %config.api.leads_url(), "Configuration loaded");

    if config.monitoring.enable_metrics {
        let port = config.monitoring.metrics_port;
        info!("Starting metrics server on port {}", port);
        tokio::spawn(async move {
            if let Err(e) = endpoints::endpoint_server(port).await {
                error!("Metrics server error: {}", e);
            }
        });
    }

    let prefs = PreferenceStore::file(&config.preferences.path);
    let session_id = SessionProvider::new(prefs.clone()).session_id();
    info!(session_id = %session_id, "Session ready");

    let telemetry = if config.telemetry.enabled {
        let sink = HttpTelemetrySink::from_config(&config.api)
            .context("Failed to build telemetry client")?;
        TelemetryEmitter::new(session_id.clone(), Arc::new(sink))
    } else {
        TelemetryEmitter::disabled(session_id.clone())
    };

    let source =
        HttpLeadSource::from_config(&config.api).context("Failed to build lead client")?;
    let fetcher = FetchController::new(
        Arc::new(source),
        DashboardLogger::new(session_id.as_str()),
    );
    let mut dashboard = Dashboard::new(fetcher, telemetry, prefs, &config.export.file_name);

    let mut pending = vec![dashboard.start()];
    pending.extend(apply_args(&mut dashboard, &args));
    await_fetches(pending).await;

    println!("{}", render(&dashboard.view(), dashboard.state().view(), dashboard.is_loading()));

    if let Some(path) = &args.export {
        export_to(&mut dashboard, path).await?;
    }

    if args.interactive {
        run_event_loop(&mut dashboard, &config).await?;
    }

    dashboard
        .flush_telemetry(Duration::from_millis(config.telemetry.flush_timeout_ms))
        .await;
    info!("Shutting down");
    Ok(())
}

/// Initialize logging subsystem
fn init_logging(verbose: bool, json: bool) -> Result<()> {
    let env_filter = if verbose {
        "lead_dashboard=debug,info"
    } else {
        "lead_dashboard=info,warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| env_filter.into());

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()?;
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .try_init()?;
    }

    Ok(())
}

/// Load configuration from file with fallback to defaults
fn load_config(path: &str) -> Result<Config> {
    if Path::new(path).exists() {
        Config::from_file_with_env(path)
            .with_context(|| format!("Failed to load config from {}", path))
    } else {
        warn!("Config file '{}' not found, using defaults", path);
        Config::from_env().context("Invalid configuration from environment")
    }
}

/// Apply filter, sort and view options; returns refetches they started
fn apply_args(dashboard: &mut Dashboard, args: &Args) -> Vec<PendingFetch> {
    let mut pending = Vec::new();

    if let Some(industry) = &args.industry {
        pending.extend(dashboard.set_industry(industry));
    }
    if let Some(raw) = &args.min_size {
        pending.extend(dashboard.set_min_size(raw));
    }
    if let Some(search) = &args.search {
        dashboard.set_search(search);
    }
    if let Some(key) = args.sort {
        let direction = if args.desc {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        dashboard.set_sort(SortState::by(key, direction));
    }
    if let Some(view) = args.view {
        dashboard.set_view(view);
    }
    if args.toggle_dark_mode {
        let on = dashboard.toggle_dark_mode();
        info!("Dark mode {}", if on { "on" } else { "off" });
    }

    pending
}

async fn await_fetches(pending: Vec<PendingFetch>) {
    for outcome in futures::future::join_all(pending).await {
        match outcome {
            Ok(FetchOutcome::Failed {
                error,
                current: true,
                ..
            }) => {
                warn!("Showing last loaded leads: {}", error);
            }
            Ok(_) => {}
            Err(e) => error!("Fetch task failed: {}", e),
        }
    }
}

async fn export_to(dashboard: &mut Dashboard, path: &Path) -> Result<()> {
    let artifact = dashboard.export();
    artifact
        .write_to(path)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    info!(
        "Exported {} leads to {} ({})",
        artifact.rows,
        path.display(),
        artifact.mime_type
    );
    Ok(())
}

/// Interactive loop over stdin commands
async fn run_event_loop(dashboard: &mut Dashboard, config: &Config) -> Result<()> {
    info!("Interactive mode, type 'help' for commands");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read stdin")? else {
                    break;
                };

                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", e);
                        continue;
                    }
                };

                let pending = match command {
                    Command::Industry(industry) => dashboard.set_industry(&industry),
                    Command::Size(raw) => dashboard.set_min_size(&raw),
                    Command::Search(text) => {
                        dashboard.set_search(&text);
                        None
                    }
                    Command::Sort(key) => {
                        let sort = dashboard.sort_by(key);
                        info!("Sorted by {} {}", key, sort.direction.as_str());
                        None
                    }
                    Command::View(Some(mode)) => {
                        dashboard.set_view(mode);
                        None
                    }
                    Command::View(None) => {
                        dashboard.toggle_view();
                        None
                    }
                    Command::Refresh => Some(dashboard.refresh()),
                    Command::Reset => dashboard.reset(),
                    Command::Export(path) => {
                        let path = path.unwrap_or_else(|| PathBuf::from(&config.export.file_name));
                        if let Err(e) = export_to(dashboard, &path).await {
                            error!("{:#}", e);
                        }
                        continue;
                    }
                    Command::Dark => {
                        let on = dashboard.toggle_dark_mode();
                        println!("dark mode {}", if on { "on" } else { "off" });
                        continue;
                    }
                    Command::Show => None,
                    Command::Help => {
                        println!("{}", HELP);
                        continue;
                    }
                    Command::Quit => break,
                };

                await_fetches(pending.into_iter().collect()).await;
                println!("{}", render(&dashboard.view(), dashboard.state().view(), dashboard.is_loading()));
            }

            // Graceful shutdown signal
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal");
                break;
            }
        }
    }

    Ok(())
}
