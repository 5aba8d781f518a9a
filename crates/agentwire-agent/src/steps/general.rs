use agentwire_core::error::Result;

use super::{Step, GENERAL_RESPONSE};
use crate::state::WorkflowState;

const CONFIDENCE: f64 = 0.70;

/// Help text listing what the agent can do, echoing the request.
pub fn help_message(user_text: &str) -> String {
    format!(
        r#"I understand you're asking about: "{user_text}"

I'm a streaming workflow agent that can help you with:

🔍 **Content Analysis**: Sentiment analysis, keyword extraction, text complexity
📚 **Knowledge Search**: Information lookup across different domains (technical, business, science)
📊 **Data Analysis**: Calculate metrics and statistics from numeric data
⚙️ **Workflow Processing**: Guide you through structured processes and procedures

To get started, try asking me to:
- "Analyze this text: [your text here]"
- "Search for information about [topic]"
- "Calculate metrics for these numbers: 10, 20, 30, 25"
- "Help me with a workflow for [your process]"

What would you like me to help you with?"#
    )
}

/// Fallback conversation node.
pub struct GeneralResponse;

impl Step for GeneralResponse {
    fn name(&self) -> &str {
        GENERAL_RESPONSE
    }

    fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let response = help_message(state.latest_user_text());
        state.respond(response, "general_response_completed");
        state.confidence_score = Some(CONFIDENCE);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentwire_core::types::SessionId;

    #[test]
    fn echoes_the_request() {
        let state = WorkflowState::new(SessionId::from_string("s"), "Hello!");
        let out = GeneralResponse.run(state).unwrap();
        let reply = &out.last_response().unwrap().content;
        assert!(reply.starts_with("I understand you're asking about: \"Hello!\""));
        assert_eq!(out.confidence_score, Some(0.70));
        assert!(out.tools_used.is_empty());
    }
}
