use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use agentwire_agent::TurnCarry;
use agentwire_core::types::SessionId;

use crate::protocol::{ClientFrame, ServerEvent};
use crate::registry::{ConnectionHandle, Outbound};
use crate::state::AppState;
use crate::turn;

/// Drive one WebSocket connection for its whole lifetime.
///
/// Turns run strictly one after another in arrival order. The loop ends on
/// client close, read error, or a force-close from the directory.
pub async fn handle_connection(ws: WebSocket, session_id: SessionId, state: Arc<AppState>) {
    let sid = session_id.as_str().to_string();
    let (mut ws_tx, mut ws_rx) = ws.split();
    let (tx, mut rx) = mpsc::channel::<Outbound>(state.config.sessions.outbound_buffer.max(1));

    let handle = ConnectionHandle::new(tx);
    let cancel = handle.cancel_token();
    let connection_id = handle.id();

    if let Err(e) = state.registry.register(&sid, handle) {
        warn!(session_id = %sid, error = %e, "Rejecting connection");
        if let Ok(json) = ServerEvent::error(&sid, e.to_string()).to_json() {
            let _ = ws_tx.send(Message::Text(json.into())).await;
        }
        let _ = ws_tx.send(Message::Close(None)).await;
        return;
    }

    // Single writer per socket keeps outbound order equal to enqueue order.
    let writer_sid = sid.clone();
    tokio::spawn(async move {
        while let Some(out) = rx.recv().await {
            match out {
                Outbound::Text(json) => {
                    if let Err(e) = ws_tx.send(Message::Text(json.into())).await {
                        debug!(session_id = %writer_sid, error = %e, "WebSocket write failed");
                        break;
                    }
                }
                Outbound::Close => {
                    let _ = ws_tx.send(Message::Close(None)).await;
                    break;
                }
            }
        }
    });

    state.registry.mark_open(&sid);
    state
        .registry
        .send(&sid, &ServerEvent::connection_established(&sid));
    info!(session_id = %sid, "Client connected");

    let mut carry = TurnCarry::default();
    let registry = state.registry.clone();
    let out = move |event: ServerEvent| {
        let session = event.session_id.clone();
        registry.send(&session, &event);
    };

    loop {
        let msg = tokio::select! {
            _ = cancel.cancelled() => {
                info!(session_id = %sid, "Session closed by directory");
                break;
            }
            msg = ws_rx.next() => msg,
        };

        let msg = match msg {
            Some(Ok(m)) => m,
            Some(Err(e)) => {
                debug!(session_id = %sid, error = %e, "WebSocket read error");
                break;
            }
            None => break,
        };

        let text = match msg {
            Message::Text(text) => text,
            Message::Close(_) => break,
            // Pings are answered by the socket layer.
            _ => continue,
        };

        let raw: serde_json::Value = match serde_json::from_str(text.as_str()) {
            Ok(v) => v,
            Err(e) => {
                warn!(session_id = %sid, error = %e, "Unparseable frame");
                out(ServerEvent::error(&sid, format!("Invalid message: {}", e)));
                continue;
            }
        };
        debug!(session_id = %sid, frame = %raw, "Received message");
        state.registry.record_inbound(&sid, raw.clone());

        let frame = match ClientFrame::from_value(raw) {
            Ok(f) => f,
            Err(e) => {
                warn!(session_id = %sid, error = %e, "Rejected frame");
                out(ServerEvent::error(&sid, format!("Invalid message: {}", e)));
                continue;
            }
        };

        tokio::select! {
            _ = cancel.cancelled() => {
                info!(session_id = %sid, "Session closed mid-turn");
                break;
            }
            _ = turn::run_turn(&state.executor, &session_id, &frame.content, &mut carry, &out) => {}
        }
    }

    state.registry.release(&sid, connection_id);
    info!(session_id = %sid, total_steps = carry.total_steps, "Client disconnected");
}
