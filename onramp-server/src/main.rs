//! Onramp Relay Server
//!
//! Backend for the Apple Pay onramp flow: mints a short-lived token per
//! request and relays order creation to the upstream onramp API.

mod api;
mod config;
mod server;
mod shutdown;
mod state;

use clap::Parser;
use config::{CliOverrides, ConfigLoader};
use server::{build_router, run_server};
use shutdown::spawn_config_reload_handler;
use state::AppState;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Onramp Relay - order-creation backend for the Apple Pay onramp flow
#[derive(Parser, Debug)]
#[command(name = "onramp-server")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listen address (e.g., 0.0.0.0:3000)
    #[arg(short, long)]
    listen: Option<SocketAddr>,

    /// Override the listen port
    #[arg(short, long, env = "PORT")]
    port: Option<u16>,

    /// API key id used to sign upstream tokens
    #[arg(long, env = "CDP_API_KEY_ID")]
    api_key_id: Option<String>,

    /// API key secret used to sign upstream tokens
    #[arg(long, env = "CDP_API_KEY_SECRET", hide_env_values = true)]
    api_key_secret: Option<String>,

    /// Emit logs as JSON
    #[arg(long, default_value = "false")]
    log_json: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing
    init_tracing(args.log_json);

    tracing::info!("Starting onramp-server v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config_loader = Arc::new(ConfigLoader::new(
        args.config.as_ref(),
        CliOverrides {
            listen: args.listen,
            port: args.port,
            api_key_id: args.api_key_id,
            api_key_secret: args.api_key_secret,
        },
    ));
    let loaded_config = config_loader.load().map_err(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        e
    })?;

    let listen_addr = loaded_config.listen;
    match config_loader.config_path() {
        Some(path) => tracing::info!("Configuration loaded from {:?}", path),
        None => tracing::info!("No config file given, using defaults"),
    }

    // Create application state
    let state = AppState::new(loaded_config.relay);

    // Spawn config reload handler (listens for SIGHUP)
    let shutdown_notify = spawn_config_reload_handler(state.clone(), config_loader);

    // Build the router
    let router = build_router(state);

    // Run the server
    tracing::info!("Starting HTTP server on {}", listen_addr);
    let result = run_server(router, listen_addr).await;

    // Signal the config reload handler to stop
    shutdown_notify.notify_one();
    tracing::info!("Server shutdown complete");

    result.map_err(Into::into)
}

/// Initialize the tracing subscriber with environment-based filtering.
fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .init();
}
