//! Touchline client binary.
//!
//! # Usage
//!
//! ```bash
//! touchline
//! touchline --summary-dir out --log-level debug
//! ```
//!
//! Commands are read from stdin one per line (`login`, `join`, `exit`,
//! `report`, `summary`, `logout`). Console messages go to stdout, logs to
//! stderr.

use std::path::PathBuf;

use clap::Parser;
use tokio::io::BufReader;
use touchline_app::{Runtime, RuntimeConfig};
use touchline_client::{ClientConfig, transport::TcpConnector};
use touchline_proto::DEFAULT_MAX_FRAME_SIZE;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Touchline game-event client
#[derive(Parser, Debug)]
#[command(name = "touchline")]
#[command(about = "Subscribe to game channels, report events and write summaries")]
#[command(version)]
struct Args {
    /// Value of the CONNECT `host` header
    #[arg(long, default_value = touchline_client::DEFAULT_HOST)]
    host_header: String,

    /// Value of the CONNECT `accept-version` header
    #[arg(long, default_value = touchline_client::DEFAULT_ACCEPT_VERSION)]
    accept_version: String,

    /// Directory summary files are written to
    #[arg(long, default_value = touchline_app::config::DEFAULT_SUMMARY_DIR)]
    summary_dir: PathBuf,

    /// Largest inbound frame accepted, in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FRAME_SIZE)]
    max_frame_size: usize,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    // stdout is the console
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    tracing::info!("Touchline client starting");

    let config = RuntimeConfig {
        client: ClientConfig {
            accept_version: args.accept_version,
            host: args.host_header,
            max_frame_size: args.max_frame_size,
        },
        summary_dir: args.summary_dir,
        ..Default::default()
    };

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    let result = runtime.block_on(
        Runtime::new(
            config,
            TcpConnector,
            BufReader::new(tokio::io::stdin()),
            tokio::io::stdout(),
        )
        .run(),
    );

    // A stdin read may still be parked on a blocking thread
    runtime.shutdown_background();

    result?;
    Ok(())
}
