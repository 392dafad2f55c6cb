//! /senders handler.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use fastphotos_services::{ConnectionTable, ReceiverStatus};

use super::ApiState;

#[derive(Debug, Serialize)]
pub struct SendersResponse {
    pub senders: Vec<SenderInfo>,
}

#[derive(Debug, Serialize)]
pub struct SenderInfo {
    pub id: String,
    pub peer: String,
    pub connected_secs: u64,
    pub has_token: bool,
    pub active: bool,
}

pub async fn handle_senders(State(state): State<ApiState>) -> Json<SendersResponse> {
    let status = state.status.borrow().clone();
    Json(SendersResponse {
        senders: collect_senders(&status, &state.connections),
    })
}

/// Join the registry view with the transport's connection table. A sender
/// the runtime has already dropped is left out.
fn collect_senders(status: &ReceiverStatus, connections: &ConnectionTable) -> Vec<SenderInfo> {
    status
        .senders
        .iter()
        .filter_map(|s| {
            let conn = connections.get(&s.id)?;
            Some(SenderInfo {
                id: s.id.to_string(),
                peer: conn.peer.to_string(),
                connected_secs: conn.connected_at.elapsed().as_secs(),
                has_token: s.has_token,
                active: s.active,
            })
        })
        .collect()
}
