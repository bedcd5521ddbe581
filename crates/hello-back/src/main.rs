//! `hello-back` — Slack outgoing-webhook responder binary entry point.
//!
//! Startup sequence:
//! 1. Resolve [`EffectiveConfig`] from the optional config file and `SHB_*`
//!    environment overrides.
//! 2. Initialise structured logging.
//! 3. Build the Axum router and start the HTTP(S) server.

mod config;
mod server;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::EffectiveConfig;
use crate::server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Configuration
    // -----------------------------------------------------------------------
    let cfg = EffectiveConfig::load().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 2. Telemetry
    // -----------------------------------------------------------------------
    init_tracing(&cfg.log_level)?;
    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = cfg.port,
        https = cfg.tls.is_some(),
        "hello-back starting"
    );

    // -----------------------------------------------------------------------
    // 3. HTTP server
    // -----------------------------------------------------------------------
    let state = AppState::new(&cfg.greeting);
    let app = server::router::build(state);

    let addr: std::net::SocketAddr = ([0, 0, 0, 0], cfg.port).into();
    match &cfg.tls {
        Some(settings) => server::serve_tls(addr, app, settings).await,
        None => server::serve(addr, app).await,
    }
}

/// Initialise the tracing subscriber at the configured log level,
/// overridable through `RUST_LOG`.
fn init_tracing(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}
