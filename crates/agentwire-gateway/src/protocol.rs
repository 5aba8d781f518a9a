//! Wire format of the streaming endpoint.
//!
//! Every outbound message is one [`ServerEvent`] serialized as a JSON text
//! frame; every inbound message is one [`ClientFrame`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agentwire_core::error::{AgentwireError, Result};

pub const WELCOME: &str = "Connected to agentwire streaming agent. Send me a message!";
pub const PROCESSING: &str = "🤖 Agent is processing your request...";
pub const COMPLETED: &str = "✅ Processing completed! Feel free to ask another question.";

/// The fixed outbound event vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    ConnectionEstablished,
    AgentProcessingStart,
    AgentStepDetailed,
    AgentResponse,
    AgentProcessingComplete,
    Error,
    Broadcast,
}

/// Step metadata attached to `agent_step_detailed` and `agent_response`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepInfo {
    pub step_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_step: Option<String>,
    #[serde(default)]
    pub tools_used: Vec<String>,
    #[serde(default)]
    pub confidence_score: f64,
}

/// An event frame pushed to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServerEvent {
    #[serde(rename = "type")]
    pub kind: EventKind,
    pub content: String,
    pub session_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step_info: Option<StepInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl ServerEvent {
    pub fn new(kind: EventKind, session_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            kind,
            content: content.into(),
            session_id: session_id.into(),
            step_info: None,
            sender: None,
            timestamp: Utc::now(),
        }
    }

    pub fn connection_established(session_id: &str) -> Self {
        Self::new(EventKind::ConnectionEstablished, session_id, WELCOME)
    }

    pub fn processing_start(session_id: &str) -> Self {
        Self::new(EventKind::AgentProcessingStart, session_id, PROCESSING)
    }

    pub fn processing_complete(session_id: &str) -> Self {
        Self::new(EventKind::AgentProcessingComplete, session_id, COMPLETED)
    }

    pub fn step_detailed(session_id: &str, display_name: &str, info: StepInfo) -> Self {
        let content = format!("📋 Step {}: {}", info.step_number, display_name);
        Self::new(EventKind::AgentStepDetailed, session_id, content).with_step_info(info)
    }

    pub fn response(session_id: &str, content: impl Into<String>, info: StepInfo) -> Self {
        Self::new(EventKind::AgentResponse, session_id, content).with_step_info(info)
    }

    pub fn error(session_id: &str, message: impl Into<String>) -> Self {
        Self::new(EventKind::Error, session_id, message)
    }

    /// An operator message; the registry stamps each recipient's session id.
    pub fn broadcast(content: impl Into<String>) -> Self {
        let mut event = Self::new(EventKind::Broadcast, "", content);
        event.sender = Some("system".to_string());
        event
    }

    pub fn with_step_info(mut self, info: StepInfo) -> Self {
        self.step_info = Some(info);
        self
    }

    pub fn with_session(mut self, session_id: &str) -> Self {
        self.session_id = session_id.to_string();
        self
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }
}

/// A frame sent from the client.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientFrame {
    #[serde(rename = "type")]
    pub frame_type: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ClientFrame {
    pub const USER_MESSAGE: &'static str = "user_message";

    /// Interpret an already-parsed JSON value as a user message.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        let frame: ClientFrame = serde_json::from_value(value)?;
        if frame.frame_type != Self::USER_MESSAGE {
            return Err(AgentwireError::Protocol(format!(
                "expected type '{}', got '{}'",
                Self::USER_MESSAGE,
                frame.frame_type
            )));
        }
        Ok(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info() -> StepInfo {
        StepInfo {
            step_number: 2,
            node_name: Some("calculate_metrics".into()),
            current_step: Some("routing_completed".into()),
            tools_used: vec!["calculate_metrics".into()],
            confidence_score: 0.9,
        }
    }

    #[test]
    fn every_event_round_trips() {
        let events = vec![
            ServerEvent::connection_established("s1"),
            ServerEvent::processing_start("s1"),
            ServerEvent::step_detailed("s1", "Calculate Metrics", info()),
            ServerEvent::response("s1", "Mean: 20.00", info()),
            ServerEvent::processing_complete("s1"),
            ServerEvent::error("s1", "❌ Agent error: boom"),
            ServerEvent::broadcast("maintenance at noon").with_session("s1"),
        ];
        for event in events {
            let json = event.to_json().unwrap();
            assert_eq!(ServerEvent::from_json(&json).unwrap(), event);
        }
    }

    #[test]
    fn wire_shape_uses_snake_case_type() {
        let json = ServerEvent::step_detailed("s1", "Router", info())
            .to_json()
            .unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "agent_step_detailed");
        assert_eq!(value["content"], "📋 Step 2: Router");
        assert_eq!(value["step_info"]["node_name"], "calculate_metrics");
        assert!(value["timestamp"].is_string());
        assert!(value.get("sender").is_none());
    }

    #[test]
    fn broadcast_is_sent_by_system() {
        let event = ServerEvent::broadcast("hi");
        assert_eq!(event.kind, EventKind::Broadcast);
        assert_eq!(event.sender.as_deref(), Some("system"));
    }

    #[test]
    fn client_frame_requires_user_message_type() {
        let ok = ClientFrame::from_value(serde_json::json!({
            "type": "user_message",
            "content": "hello",
            "session_id": "s1",
            "timestamp": "2024-01-01T00:00:00Z"
        }))
        .unwrap();
        assert_eq!(ok.content, "hello");

        let err = ClientFrame::from_value(serde_json::json!({ "type": "ping" })).unwrap_err();
        assert!(matches!(err, AgentwireError::Protocol(_)));

        let err = ClientFrame::from_value(serde_json::json!({ "content": "x" })).unwrap_err();
        assert!(matches!(err, AgentwireError::Json(_)));
    }
}
