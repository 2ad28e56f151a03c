// =============================================================================
// REST API Endpoints — Axum 0.7
// =============================================================================
//
// All endpoints live under `/api/v1/`.  Everything served here is public
// market commentary, so there is no authentication layer; the only mutating
// endpoints toggle the alert mute and request an early poll.
//
// CORS is configured permissively — the dashboard is served from another
// origin during development.
// =============================================================================

use std::sync::Arc;

use axum::{
    extract::State,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::app_state::AppState;

// =============================================================================
// Router construction
// =============================================================================

/// Build the full REST API router with CORS middleware and shared state.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/state", get(full_state))
        .route("/api/v1/signal", get(latest_signal))
        .route("/api/v1/signals", get(recent_signals))
        .route("/api/v1/intel", get(intel))
        .route("/api/v1/control/mute", post(control_mute))
        .route("/api/v1/control/unmute", post(control_unmute))
        .route("/api/v1/control/refresh", post(control_refresh))
        .route("/api/v1/ws", get(crate::api::ws::ws_handler))
        .layer(cors)
        .with_state(state)
}

// =============================================================================
// Health
// =============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    state_version: u64,
    server_time: i64,
}

async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let resp = HealthResponse {
        status: "ok",
        state_version: state.current_state_version(),
        server_time: chrono::Utc::now().timestamp_millis(),
    };
    Json(resp)
}

// =============================================================================
// Read endpoints
// =============================================================================

async fn full_state(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.build_snapshot())
}

async fn latest_signal(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let latest = state.latest_signal.read().clone();
    match latest {
        Some(result) => {
            let commentary = result.commentary();
            let indicator_line = result.snapshot.as_ref().map(|s| s.summary());
            let body = serde_json::json!({
                "result": result,
                "commentary": commentary,
                "indicator_line": indicator_line,
            });
            Json(body).into_response()
        }
        None => {
            let body =
                serde_json::json!({ "result": null, "message": "No price tick evaluated yet" });
            Json(body).into_response()
        }
    }
}

async fn recent_signals(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let signals = state.recent_signals.read().clone();
    Json(signals)
}

async fn intel(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let intel = state.intel.read().clone();
    Json(intel)
}

// =============================================================================
// Controls
// =============================================================================

#[derive(Serialize)]
struct MuteResponse {
    muted: bool,
}

async fn control_mute(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.set_muted(true);
    info!("alerts muted via API");
    Json(MuteResponse { muted: true })
}

async fn control_unmute(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.set_muted(false);
    info!("alerts unmuted via API");
    Json(MuteResponse { muted: false })
}

async fn control_refresh(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    state.refresh.notify_one();
    info!("manual refresh requested via API");
    Json(serde_json::json!({ "status": "refresh requested" }))
}
