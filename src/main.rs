// =============================================================================
// Aurum Signal Desk — Main Entry Point
// =============================================================================
//
// Long-running desk for a single spot instrument: polls the price endpoints,
// feeds each tick through the signal engine, and serves the live state to the
// dashboard over REST + WebSocket.
// =============================================================================

// ── Module declarations ──────────────────────────────────────────────────────
mod api;
mod app_state;
mod engine;
mod feed;
mod indicators;
mod intel;
mod runtime_config;
mod types;

use std::sync::Arc;

use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::app_state::AppState;
use crate::feed::SpotPriceClient;
use crate::runtime_config::RuntimeConfig;

const CONFIG_PATH: &str = "runtime_config.json";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ── 1. Environment & config ──────────────────────────────────────────
    let _ = dotenv::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("╔══════════════════════════════════════════════════════════╗");
    info!("║        Aurum Signal Desk — Starting Up                  ║");
    info!("╚══════════════════════════════════════════════════════════╝");

    let mut config = RuntimeConfig::load(CONFIG_PATH).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to load config, using defaults");
        RuntimeConfig::default()
    });

    // Env overrides for deployment without touching the config file.
    if let Ok(addr) = std::env::var("AURUM_BIND_ADDR") {
        config.bind_addr = addr;
    }
    if let Ok(instrument) = std::env::var("AURUM_INSTRUMENT") {
        config.instrument = instrument;
    }

    info!(
        instrument = %config.instrument,
        poll_interval_secs = config.poll_interval_secs,
        muted = config.start_muted,
        "Configured desk"
    );

    // ── 2. Build shared state ────────────────────────────────────────────
    let state = Arc::new(AppState::new(config));

    // ── 3. Build the price client ────────────────────────────────────────
    let client = {
        let config = state.runtime_config.read();
        SpotPriceClient::new(
            config.primary_price_url.clone(),
            config.fallback_price_url.clone(),
        )
    };

    // ── 4. Spawn the poll loop ───────────────────────────────────────────
    // The interval's first tick completes immediately, so the desk takes its
    // first price sample right away rather than waiting a full period.
    let poll_state = state.clone();
    tokio::spawn(async move {
        feed::run_poll_loop(poll_state, client).await;
    });

    // ── 5. Start the API server ──────────────────────────────────────────
    let api_state = state.clone();
    let bind_addr = state.runtime_config.read().bind_addr.clone();

    tokio::spawn(async move {
        let app = api::rest::router(api_state);
        let listener = tokio::net::TcpListener::bind(&bind_addr)
            .await
            .expect("Failed to bind API server");
        info!(addr = %bind_addr, "API server listening");
        axum::serve(listener, app)
            .await
            .expect("API server failed");
    });

    info!("All subsystems running. Press Ctrl+C to stop.");

    // ── 6. Graceful shutdown ─────────────────────────────────────────────
    tokio::signal::ctrl_c().await?;
    warn!("Shutdown signal received — stopping gracefully");

    if let Err(e) = state.runtime_config.read().save(CONFIG_PATH) {
        error!(error = %e, "Failed to save runtime config on shutdown");
    }

    info!("Aurum Signal Desk shut down complete.");
    Ok(())
}
