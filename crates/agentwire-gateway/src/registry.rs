//! Connection Registry: live connections plus per-session metadata.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use agentwire_core::error::{AgentwireError, Result};

use crate::protocol::ServerEvent;

static NEXT_CONNECTION: AtomicU64 = AtomicU64::new(1);

/// A frame queued for a connection's writer task.
#[derive(Debug)]
pub enum Outbound {
    Text(String),
    Close,
}

/// The live side of one connection. Never leaves the registry.
#[derive(Debug)]
pub struct ConnectionHandle {
    id: u64,
    tx: mpsc::Sender<Outbound>,
    cancel: CancellationToken,
}

impl ConnectionHandle {
    pub fn new(tx: mpsc::Sender<Outbound>) -> Self {
        Self {
            id: NEXT_CONNECTION.fetch_add(1, Ordering::Relaxed),
            tx,
            cancel: CancellationToken::new(),
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Cancelled when the registry force-closes the connection.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Connecting,
    Open,
    Closed,
}

/// Snapshot of one session for the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionInfo {
    pub session_id: String,
    pub status: SessionStatus,
    pub created_at: DateTime<Utc>,
    pub message_count: usize,
}

struct SessionRecord {
    created_at: DateTime<Utc>,
    status: SessionStatus,
    messages: Vec<serde_json::Value>,
}

impl SessionRecord {
    fn info(&self, session_id: &str) -> SessionInfo {
        SessionInfo {
            session_id: session_id.to_string(),
            status: self.status,
            created_at: self.created_at,
            message_count: self.messages.len(),
        }
    }
}

#[derive(Default)]
struct Inner {
    live: HashMap<String, ConnectionHandle>,
    records: HashMap<String, SessionRecord>,
    /// Closed session ids, oldest first.
    closed: VecDeque<String>,
}

/// Registry of live connections, shared by every session loop and the
/// directory API.
///
/// All state sits behind one mutex that is never held across an await.
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
    retain_closed: usize,
}

impl ConnectionRegistry {
    pub fn new(retain_closed: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            retain_closed,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Record a new live connection in `connecting` state.
    pub fn register(&self, session_id: &str, handle: ConnectionHandle) -> Result<()> {
        let mut inner = self.lock();
        if inner.live.contains_key(session_id) {
            return Err(AgentwireError::DuplicateSession(session_id.to_string()));
        }

        // A reconnect under a retained id starts a fresh record.
        inner.closed.retain(|id| id != session_id);
        inner.records.insert(
            session_id.to_string(),
            SessionRecord {
                created_at: Utc::now(),
                status: SessionStatus::Connecting,
                messages: Vec::new(),
            },
        );
        inner.live.insert(session_id.to_string(), handle);

        info!(session_id, live = inner.live.len(), "Session registered");
        Ok(())
    }

    pub fn mark_open(&self, session_id: &str) {
        let mut inner = self.lock();
        if let Some(record) = inner.records.get_mut(session_id) {
            if record.status == SessionStatus::Connecting {
                record.status = SessionStatus::Open;
            }
        }
    }

    /// Remove a session from the live map and mark it closed. No-op if absent.
    pub fn deregister(&self, session_id: &str) {
        let mut inner = self.lock();
        self.deregister_locked(&mut inner, session_id);
    }

    /// Deregister only if `connection_id` still owns the session id.
    ///
    /// A loop that was force-closed must not evict a newer connection that
    /// has since reused its id.
    pub fn release(&self, session_id: &str, connection_id: u64) {
        let mut inner = self.lock();
        let owned = inner
            .live
            .get(session_id)
            .is_some_and(|handle| handle.id == connection_id);
        if owned {
            self.deregister_locked(&mut inner, session_id);
        } else {
            debug!(session_id, connection_id, "Connection already released");
        }
    }

    fn deregister_locked(&self, inner: &mut Inner, session_id: &str) {
        if inner.live.remove(session_id).is_none() {
            return;
        }
        if let Some(record) = inner.records.get_mut(session_id) {
            record.status = SessionStatus::Closed;
        }
        inner.closed.push_back(session_id.to_string());

        while inner.closed.len() > self.retain_closed {
            if let Some(evicted) = inner.closed.pop_front() {
                inner.records.remove(&evicted);
                debug!(session_id = %evicted, "Closed session record evicted");
            }
        }

        info!(session_id, live = inner.live.len(), "Session deregistered");
    }

    /// Append a raw inbound message to the session's log.
    pub fn record_inbound(&self, session_id: &str, message: serde_json::Value) {
        let mut inner = self.lock();
        if let Some(record) = inner.records.get_mut(session_id) {
            record.messages.push(message);
        }
    }

    /// Deliver one event. Returns false if the session is not live, its
    /// outbound queue is full, or its channel is broken; the failure is
    /// logged, never raised.
    pub fn send(&self, session_id: &str, event: &ServerEvent) -> bool {
        let json = match event.to_json() {
            Ok(json) => json,
            Err(e) => {
                warn!(session_id, error = %e, "Failed to encode event");
                return false;
            }
        };

        let tx = match self.lock().live.get(session_id) {
            Some(handle) => handle.tx.clone(),
            None => {
                debug!(session_id, kind = ?event.kind, "Dropping event for unknown session");
                return false;
            }
        };

        enqueue(session_id, &tx, Outbound::Text(json))
    }

    /// Fan an event out to every live session, stamping each recipient's id.
    /// Returns the number of sessions it was handed to.
    pub fn broadcast(&self, event: &ServerEvent) -> usize {
        let targets: Vec<(String, mpsc::Sender<Outbound>)> = self
            .lock()
            .live
            .iter()
            .map(|(id, handle)| (id.clone(), handle.tx.clone()))
            .collect();

        let mut delivered = 0;
        for (session_id, tx) in targets {
            let stamped = event.clone().with_session(&session_id);
            let sent = match stamped.to_json() {
                Ok(json) => enqueue(&session_id, &tx, Outbound::Text(json)),
                Err(e) => {
                    warn!(session_id = %session_id, error = %e, "Failed to encode broadcast");
                    false
                }
            };
            if sent {
                delivered += 1;
            }
        }

        info!(delivered, "Broadcast sent");
        delivered
    }

    /// Live sessions, oldest first.
    pub fn list(&self) -> Vec<SessionInfo> {
        let inner = self.lock();
        let mut sessions: Vec<SessionInfo> = inner
            .live
            .keys()
            .filter_map(|id| inner.records.get(id).map(|r| r.info(id)))
            .collect();
        sessions.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.session_id.cmp(&b.session_id))
        });
        sessions
    }

    /// One session, live or retained after close.
    pub fn get(&self, session_id: &str) -> Option<SessionInfo> {
        self.lock()
            .records
            .get(session_id)
            .map(|r| r.info(session_id))
    }

    pub fn is_live(&self, session_id: &str) -> bool {
        self.lock().live.contains_key(session_id)
    }

    /// Force-close a live session: ask its writer to send a close frame,
    /// cancel its loop, and deregister it.
    pub fn close(&self, session_id: &str) -> Result<()> {
        let mut inner = self.lock();
        let Some(handle) = inner.live.get(session_id) else {
            return Err(AgentwireError::UnknownSession(session_id.to_string()));
        };

        // With a full queue the close frame is dropped; releasing the
        // sender below still ends the writer once the queue drains.
        enqueue(session_id, &handle.tx, Outbound::Close);
        handle.cancel.cancel();
        self.deregister_locked(&mut inner, session_id);
        Ok(())
    }

    /// Force-close every live session. Returns how many were closed.
    pub fn close_all(&self) -> usize {
        let ids: Vec<String> = self.lock().live.keys().cloned().collect();
        ids.iter().filter(|id| self.close(id).is_ok()).count()
    }
}

/// Queue a frame without waiting. Delivery is at most once: a full or
/// closed queue drops the frame and logs it.
fn enqueue(session_id: &str, tx: &mpsc::Sender<Outbound>, out: Outbound) -> bool {
    let reason = match tx.try_send(out) {
        Ok(()) => return true,
        Err(TrySendError::Full(_)) => "outbound queue full",
        Err(TrySendError::Closed(_)) => "connection gone",
    };
    let err = AgentwireError::Delivery(session_id.to_string());
    warn!(session_id, error = %err, reason, "Event not delivered");
    false
}
