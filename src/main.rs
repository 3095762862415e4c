//! CLI entry point for the arrival board.
//!
//! Provides subcommands for serving the station board over HTTP and for
//! watching it as a live terminal display.

use anyhow::Result;
use arrival_board::config::StationConfig;
use arrival_board::{server, watch};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "arrival_board")]
#[command(about = "A live subway arrival board for one station", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the arrivals API and the browser board
    Serve {
        /// Address to bind
        #[arg(short, long, default_value = "0.0.0.0:3000")]
        bind: String,

        /// Station config JSON file (defaults to the built-in Columbus
        /// Circle-59 St mapping)
        #[arg(short, long)]
        config: Option<String>,
    },
    /// Watch a running board in the terminal
    Watch {
        /// Arrivals endpoint to poll
        #[arg(
            value_name = "URL",
            default_value = "http://localhost:3000/api/arrivals"
        )]
        url: String,

        /// Seconds between polls
        #[arg(short, long, default_value_t = 30)]
        interval: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/arrival_board.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("arrival_board.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse().unwrap()));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse().unwrap()));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { bind, config } => {
            let config_path = config.or_else(|| std::env::var("STATION_CONFIG").ok());
            let station_config = match config_path {
                Some(path) => {
                    info!(path, "Loading station config");
                    StationConfig::load(&path)?
                }
                None => StationConfig::columbus_circle(),
            };

            server::serve(&bind, station_config).await?;
        }
        Commands::Watch { url, interval } => {
            watch::watch(url, interval).await?;
        }
    }

    Ok(())
}
