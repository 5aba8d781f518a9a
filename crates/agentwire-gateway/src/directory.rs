//! Session Directory API: operational view over the connection registry.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::protocol::ServerEvent;
use crate::registry::SessionInfo;
use crate::state::AppState;

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "detail": "Session not found" })),
    )
        .into_response()
}

// GET /api/v1/streaming/sessions
pub async fn list_sessions(State(state): State<Arc<AppState>>) -> Json<Vec<SessionInfo>> {
    Json(state.registry.list())
}

// GET /api/v1/streaming/sessions/{id}
pub async fn get_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.registry.get(&id) {
        Some(info) => Json(info).into_response(),
        None => not_found(),
    }
}

// DELETE /api/v1/streaming/sessions/{id}
pub async fn close_session(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.registry.close(&id) {
        Ok(()) => {
            info!(session_id = %id, "Session force-closed");
            Json(serde_json::json!({ "status": "session_closed", "session_id": id }))
                .into_response()
        }
        Err(_) => not_found(),
    }
}

#[derive(Deserialize)]
pub struct BroadcastRequest {
    pub content: String,
}

// POST /api/v1/streaming/broadcast
pub async fn broadcast(
    State(state): State<Arc<AppState>>,
    Json(body): Json<BroadcastRequest>,
) -> Json<serde_json::Value> {
    let delivered = state
        .registry
        .broadcast(&ServerEvent::broadcast(body.content.clone()));
    Json(serde_json::json!({
        "status": "broadcast_sent",
        "message": body.content,
        "delivered": delivered,
    }))
}
