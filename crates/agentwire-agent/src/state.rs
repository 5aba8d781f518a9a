use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use agentwire_core::types::{ChatMessage, Role, SessionId};

/// Execution context threaded through the nodes of one turn.
///
/// Each step takes the state by value and hands back the updated state, so
/// no two nodes ever alias it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowState {
    pub messages: Vec<ChatMessage>,
    pub current_step: String,
    /// Per-step result payloads, keyed by step name.
    pub analysis_results: BTreeMap<String, serde_json::Value>,
    /// Tools invoked so far, in invocation order (duplicates allowed).
    pub tools_used: Vec<String>,
    pub session_id: SessionId,
    /// Nodes visited in this turn.
    pub step_count: u32,
    /// Set by the last non-router node that produced an answer.
    pub confidence_score: Option<f64>,
    /// Label chosen by the router; consumed by the executor.
    pub next_action: Option<String>,
}

impl WorkflowState {
    /// Fresh state for a turn that starts from `user_message`.
    pub fn new(session_id: SessionId, user_message: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::user(user_message)],
            current_step: "initialized".to_string(),
            analysis_results: BTreeMap::new(),
            tools_used: Vec::new(),
            session_id,
            step_count: 0,
            confidence_score: None,
            next_action: None,
        }
    }

    /// Fresh turn state that inherits the session's cumulative fields.
    pub fn seeded(
        session_id: SessionId,
        user_message: impl Into<String>,
        carry: &TurnCarry,
    ) -> Self {
        let mut state = Self::new(session_id, user_message);
        state.tools_used = carry.tools_used.clone();
        state.analysis_results = carry.analysis_results.clone();
        state
    }

    /// Text of the most recent user message, or "" if there is none.
    pub fn latest_user_text(&self) -> &str {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.as_str())
            .unwrap_or("")
    }

    /// The trailing assistant message, if the last message is one.
    pub fn last_response(&self) -> Option<&ChatMessage> {
        self.messages.last().filter(|m| m.is_assistant())
    }

    /// Append an assistant reply and mark the step it completed.
    pub fn respond(&mut self, text: impl Into<String>, current_step: &str) {
        self.messages.push(ChatMessage::assistant(text));
        self.current_step = current_step.to_string();
    }

    pub fn record_tool(&mut self, tool: &str) {
        self.tools_used.push(tool.to_string());
    }
}

/// Fields carried from one turn of a session into the next.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TurnCarry {
    pub tools_used: Vec<String>,
    pub analysis_results: BTreeMap<String, serde_json::Value>,
    /// Nodes visited across every completed turn.
    pub total_steps: u64,
}

impl TurnCarry {
    /// Fold a completed turn's final state into the carry.
    pub fn absorb(&mut self, state: &WorkflowState) {
        self.tools_used = state.tools_used.clone();
        self.analysis_results = state.analysis_results.clone();
        self.total_steps += u64::from(state.step_count);
    }
}
