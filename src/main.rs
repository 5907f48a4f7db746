//! TTS Relay
//!
//! A single-endpoint relay in front of a text-to-speech provider.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                       TTS RELAY                       │
//!                      │                                                       │
//!   POST /eleven/tts   │  ┌──────────┐   ┌──────────┐   ┌──────────────────┐  │
//!   ───────────────────┼─▶│  access  │──▶│  decode  │──▶│  upstream call   │──┼──▶ Provider
//!                      │  │  guard   │   │ validate │   │ (no redirects)   │  │
//!                      │  └──────────┘   └──────────┘   └────────┬─────────┘  │
//!                      │                                          ▼            │
//!   audio/mpeg stream  │  ┌──────────────┐   ┌───────────────────────────┐    │
//!   ◀──────────────────┼──│ chunk relay  │◀──│ gate: redirect → status → │◀───┼─── Provider
//!   or JSON error      │  │ (deadline)   │   │       content-type        │    │
//!                      │  └──────────────┘   └───────────────────────────┘    │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use tts_relay::config::load_config;
use tts_relay::lifecycle::{signals, startup, Shutdown};
use tts_relay::observability::{logging, metrics};
use tts_relay::RelayServer;

#[derive(Parser)]
#[command(name = "tts-relay")]
#[command(about = "Streaming relay for a text-to-speech provider", long_about = None)]
struct Args {
    /// Optional TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listening port (takes precedence over PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_config(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.listener.port = port;
    }

    logging::init_logging(&config.observability);
    tracing::info!("tts-relay v{} starting", env!("CARGO_PKG_VERSION"));
    startup::announce(&config);

    if config.observability.metrics_enabled {
        let addr: SocketAddr = config.observability.metrics_address.parse()?;
        metrics::init_metrics(addr);
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    signals::spawn_signal_handler(&shutdown);

    let server = RelayServer::new(config)?;
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
