//! Monthly sheet dashboard server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http (request id, elapsed time, trace, timeout)
//!                          │
//!                          ▼
//!                     monthly service ── deadline race ──▶ sheets source
//!                          │                                    │
//!                          ▼                                    ▼
//!     ◀────────────── JSON index / rows            sheet service (HTTP)
//!
//!     Cross-cutting: config (+ hot reload), observability, lifecycle
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;
use tokio::sync::mpsc;

use sheet_dashboard::config::{load_config, ConfigWatcher, DashboardConfig};
use sheet_dashboard::lifecycle::wait_for_termination;
use sheet_dashboard::observability::{logging, metrics};
use sheet_dashboard::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "sheet-dashboard")]
#[command(about = "Monthly sheet dashboard API", long_about = None)]
struct Args {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => load_config(path)?,
        None => DashboardConfig::default(),
    };

    logging::init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "sheet-dashboard starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        sheets_base_url = %config.sheets.base_url,
        index_budget_ms = config.timeouts.index_budget_ms,
        rows_budget_ms = config.timeouts.rows_budget_ms,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    // Keep the watcher alive for the lifetime of the server.
    let (_watcher, config_updates) = match &args.config {
        Some(path) => {
            let (watcher, updates) = ConfigWatcher::new(path);
            (Some(watcher.run()?), updates)
        }
        None => {
            let (_tx, updates) = mpsc::unbounded_channel();
            (None, updates)
        }
    };

    let shutdown = Arc::new(Shutdown::new());
    let shutdown_rx = shutdown.subscribe();
    {
        let shutdown = Arc::clone(&shutdown);
        tokio::spawn(async move {
            wait_for_termination().await;
            shutdown.trigger();
        });
    }

    let server = HttpServer::new(config, shutdown.signal())?;
    server.run(listener, config_updates, shutdown_rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
