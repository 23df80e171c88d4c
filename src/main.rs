//! Proxy core daemon.
//!
//! # Architecture Overview
//!
//! ```text
//!   config.toml ──▶ config::load_config ──▶ ProxyContext::init
//!                                              │
//!                    ┌─────────────────────────┼──────────────────────────┐
//!                    │                         ▼                          │
//!   transport ──▶ net::Connection ──▶ peer::PeerRegistry ◀── servers      │
//!                    │                  (clients, pools)                  │
//!                    │                                                    │
//!   parser ──▶ http::HttpRequest ──▶ routing::SharedRules ──▶ action      │
//!                    │                                                    │
//!                    │   observability (tracing, metrics)   lifecycle     │
//!                    └────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;

use proxy_core::config::{load_config, ProxyConfig};
use proxy_core::lifecycle::{shutdown_signal, ProxyContext};
use proxy_core::observability::{logging, metrics};
use proxy_core::peer::ServerId;

#[derive(Parser)]
#[command(name = "proxy-core")]
#[command(about = "Peer binding and request matching core", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the initialized state as JSON and exit.
    #[arg(long)]
    dump_state: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ProxyConfig::default(),
    };

    logging::init(&config.observability)?;
    tracing::info!("proxy-core v{} starting", env!("CARGO_PKG_VERSION"));

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let ctx = ProxyContext::<ServerId>::init(config)?;

    if cli.dump_state {
        let state = serde_json::json!({
            "config": ctx.config(),
            "peers": ctx.peers().stats(),
            "rules": ctx.rules().load().len(),
        });
        println!("{}", serde_json::to_string_pretty(&state)?);
    } else {
        shutdown_signal().await;
    }

    let report = ctx.teardown();
    tracing::info!(servers = report.servers, "Shutdown complete");
    Ok(())
}
