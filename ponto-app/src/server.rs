//! The request-triggered wrapper: one route that performs a run and maps
//! its result onto a JSON response.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use ponto_checkin::run_checkin;
use ponto_config::CheckinConfig;
use serde_json::json;
use tokio::sync::Mutex;
use tracing::info;

#[derive(Clone)]
struct AppState {
    config: Arc<CheckinConfig>,
    /// Runs never overlap: one session, one port, one flow at a time.
    gate: Arc<Mutex<()>>,
}

pub async fn serve(config: CheckinConfig, addr: &str) -> anyhow::Result<()> {
    let state = AppState {
        config: Arc::new(config),
        gate: Arc::new(Mutex::new(())),
    };

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "serving check-in endpoint");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

fn router(state: AppState) -> Router {
    Router::new().route("/run", get(run_handler)).with_state(state)
}

async fn run_handler(State(state): State<AppState>) -> impl IntoResponse {
    let _running = state.gate.lock().await;

    match run_checkin(&state.config).await {
        Ok(log) => (
            StatusCode::OK,
            Json(json!({ "status": "success", "log": log })),
        ),
        Err(err) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "status": "error", "error": err.to_string() })),
        ),
    }
}
