//! /status and /daemon/shutdown handlers.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use fastphotos_services::ReceiverStatus;

use super::ApiState;

// ── /status ──────────────────────────────────────────────────────────────────

pub async fn handle_status(State(state): State<ApiState>) -> Json<ReceiverStatus> {
    Json(state.status.borrow().clone())
}

// ── /daemon/shutdown ─────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct ShutdownResponse {
    pub message: String,
}

pub async fn handle_shutdown(State(state): State<ApiState>) -> Json<ShutdownResponse> {
    tracing::info!("shutdown requested via API");
    let message = match state.shutdown_tx.send(()) {
        Ok(_) => "Shutdown initiated",
        Err(_) => "Shutdown already in progress",
    };
    Json(ShutdownResponse {
        message: message.to_string(),
    })
}
