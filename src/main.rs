//! CLI entry point for the CORS station map backend.
//!
//! Provides subcommands for serving the map API, fetching the current station
//! list once, and polling vendors on a fixed interval.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use cors_station_map::{
    aggregate::{Aggregator, FailurePolicy},
    config::VendorSettings,
    fetch::BasicClient,
    geo::to_feature_collection,
    names::NameTable,
    output::{append_snapshot, write_json},
    poller::Poller,
    server,
    summary::StationSummary,
    vendors::{SbcAdapter, TrimbleAdapter},
};
use std::ffi::OsStr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::level_filters::LevelFilter;
use tracing::{error, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "cors_station_map")]
#[command(
    about = "Live GNSS/CORS station locations and health from SBC and Trimble feeds",
    long_about = None
)]
struct Cli {
    /// CSV file mapping siteCode to stationName
    #[arg(long, global = true, default_value = "data/station_names.csv")]
    names: String,

    /// Per-vendor fetch timeout in seconds
    #[arg(long, global = true, default_value_t = 10)]
    timeout: u64,

    /// What to do when only some vendors fail
    #[arg(long, global = true, value_enum, default_value_t = FailurePolicy::Degrade)]
    policy: FailurePolicy,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the station API for the map client
    Serve {
        /// Address to bind to
        #[arg(long, env = "BIND_ADDR", default_value = "127.0.0.1")]
        bind: String,

        /// Port to listen on
        #[arg(short, long, env = "PORT", default_value_t = 3000)]
        port: u16,
    },
    /// Fetch every vendor once and print the stations
    Fetch {
        /// Output shape
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Fetch every vendor on a fixed interval
    Poll {
        /// Seconds between fetches
        #[arg(short = 'r', long, default_value_t = 10)]
        interval: u64,

        /// Number of fetches to run (0 = infinite)
        #[arg(short = 'n', long, default_value_t = 0)]
        samples: usize,

        /// Optional: CSV file to append every station row to
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Geojson,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path = std::env::var("LOG_FILE_PATH")
        .unwrap_or_else(|_| "logs/cors_station_map.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("cors_station_map.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive(LevelFilter::INFO.into()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive(LevelFilter::DEBUG.into()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let names = Arc::new(load_names(&cli.names));
    let settings = VendorSettings::from_env().context("invalid vendor configuration")?;
    let aggregator = Arc::new(build_aggregator(
        settings,
        names,
        Duration::from_secs(cli.timeout),
        cli.policy,
    )?);

    match cli.command {
        Commands::Serve { bind, port } => {
            server::run(aggregator, &bind, port).await?;
        }
        Commands::Fetch { format } => {
            let report = aggregator.fetch_report().await?;
            let summary = StationSummary::from_stations(&report.stations);
            info!(
                total = summary.total,
                online = summary.online,
                degraded = summary.degraded,
                offline = summary.offline,
                failed_vendors = report.failures.len(),
                "Stations fetched"
            );

            let stdout = std::io::stdout().lock();
            match format {
                OutputFormat::Json => write_json(stdout, &report.stations)?,
                OutputFormat::Geojson => {
                    write_json(stdout, &to_feature_collection(&report.stations))?
                }
            }
        }
        Commands::Poll {
            interval,
            samples,
            output,
        } => {
            poll(aggregator, interval, samples, output).await;
        }
    }

    Ok(())
}

/// Reads the station name table; a missing or broken file is not fatal.
fn load_names(path: &str) -> NameTable {
    match NameTable::from_csv_path(path) {
        Ok(table) => {
            info!(path, entries = table.len(), "Station name table loaded");
            table
        }
        Err(e) => {
            warn!(path, error = %e, "Station name table unavailable, using vendor names");
            NameTable::new()
        }
    }
}

/// Registers the configured vendors, SBC first.
fn build_aggregator(
    settings: VendorSettings,
    names: Arc<NameTable>,
    timeout: Duration,
    policy: FailurePolicy,
) -> Result<Aggregator> {
    let client = BasicClient::with_timeouts(timeout, Duration::from_secs(5))
        .context("failed to build HTTP client")?;

    let mut aggregator = Aggregator::new(names)
        .with_timeout(timeout)
        .with_policy(policy);

    if let Some(sbc) = settings.sbc {
        info!(source = %sbc.source, url = %sbc.sites_url, "SBC feed enabled");
        aggregator = aggregator.with_adapter(SbcAdapter::new(client.clone(), sbc));
    }
    if let Some(trimble) = settings.trimble {
        info!(source = %trimble.source, url = %trimble.url, "Trimble feed enabled");
        aggregator = aggregator.with_adapter(TrimbleAdapter::new(client, trimble));
    }

    if aggregator.vendors().is_empty() {
        warn!("No vendor configured; set SBC_BASE_URL and/or TRIMBLE_URL");
    }

    Ok(aggregator)
}

/// Polls every `interval` seconds until `samples` ticks ran or Ctrl+C.
#[tracing::instrument(skip(aggregator, output))]
async fn poll(aggregator: Arc<Aggregator>, interval: u64, samples: usize, output: Option<String>) {
    if samples == 0 {
        info!(interval, "Polling infinitely. Press Ctrl+C to stop.");
    } else {
        info!(samples, interval, "Starting polling");
    }

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                let _ = shutdown_tx.send(true);
            }
            Err(e) => {
                warn!(error = %e, "Cannot listen for Ctrl+C");
                // dropping the sender would stop the poller
                std::future::pending::<()>().await;
            }
        }
    });

    let poller = Poller::new(aggregator, Duration::from_secs(interval)).with_max_ticks(samples);
    let completed = poller
        .run(shutdown_rx, |tick, result| match result {
            Ok(report) => {
                let summary = StationSummary::from_stations(&report.stations);
                info!(
                    tick,
                    total = summary.total,
                    online = summary.online,
                    degraded = summary.degraded,
                    offline = summary.offline,
                    online_pct = summary.online_pct(),
                    failed_vendors = report.failures.len(),
                    "Poll complete"
                );

                if let Some(path) = &output {
                    if let Err(e) = append_snapshot(path, report.fetched_at, &report.stations) {
                        error!(path = %path, error = %e, "Failed to append snapshot");
                    }
                }
            }
            Err(e) => {
                error!(tick, error = %e, "Poll failed");
            }
        })
        .await;

    info!(completed, "Polling finished");
}
