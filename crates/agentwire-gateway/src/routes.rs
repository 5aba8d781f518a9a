use std::sync::Arc;

use axum::extract::ws::WebSocketUpgrade;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::{debug, info};

use agentwire_core::types::SessionId;

use crate::connection;
use crate::state::AppState;

// GET /health
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// GET /api/v1/ws/{session_id}
pub async fn ws_session(
    ws: WebSocketUpgrade,
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    debug!(session_id = %id, "WebSocket upgrade");
    let session_id = SessionId::from_string(&id);
    ws.on_upgrade(move |socket| connection::handle_connection(socket, session_id, state))
}

// GET /api/v1/ws
pub async fn ws_new_session(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    let session_id = SessionId::new();
    debug!(session_id = %session_id, "WebSocket upgrade with generated id");
    ws.on_upgrade(move |socket| connection::handle_connection(socket, session_id, state))
}

// GET /api/v1/actions
pub async fn list_actions(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "actions": state.tools.definitions() }))
}

// POST /api/v1/actions  {"action": "...", ...params}
pub async fn dispatch_action(
    State(state): State<Arc<AppState>>,
    Json(mut body): Json<serde_json::Value>,
) -> Response {
    let action = match body
        .as_object_mut()
        .and_then(|obj| obj.remove("action"))
        .and_then(|v| v.as_str().map(str::to_string))
    {
        Some(action) => action,
        None => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "detail": "action is required" })),
            )
                .into_response()
        }
    };

    if !state.tools.contains(&action) {
        return (
            StatusCode::NOT_FOUND,
            Json(serde_json::json!({ "detail": format!("Unknown action: {}", action) })),
        )
            .into_response();
    }

    info!(action = %action, "Dispatching action");
    let result = state.tools.dispatch(&action, body).await;
    let payload = if result.is_error {
        serde_json::json!({ "action": action, "status": "failed", "error": result.content })
    } else {
        serde_json::json!({ "action": action, "status": "completed", "result": result.content })
    };
    Json(payload).into_response()
}
