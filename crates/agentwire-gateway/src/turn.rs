use tracing::{error, info};

use agentwire_agent::{ExecutionResult, GraphExecutor, TurnCarry, WorkflowState};
use agentwire_core::error::Result;
use agentwire_core::event::WorkflowEvent;
use agentwire_core::types::SessionId;

use crate::protocol::{ServerEvent, StepInfo};

/// Translate one engine event into its wire form.
pub fn to_server_event(executor: &GraphExecutor, session_id: &str, event: WorkflowEvent) -> ServerEvent {
    match event {
        WorkflowEvent::StepStarted {
            step_number,
            node,
            current_step,
            tools_used,
            confidence_score,
        } => {
            let display = executor
                .display_name(&node)
                .unwrap_or_else(|| node.clone());
            ServerEvent::step_detailed(
                session_id,
                &display,
                StepInfo {
                    step_number,
                    node_name: Some(node),
                    current_step: Some(current_step),
                    tools_used,
                    confidence_score: confidence_score.unwrap_or(0.0),
                },
            )
        }
        WorkflowEvent::Response {
            step_number,
            node,
            current_step,
            content,
            tools_used,
            confidence_score,
        } => ServerEvent::response(
            session_id,
            content,
            StepInfo {
                step_number,
                node_name: Some(node),
                current_step: Some(current_step),
                tools_used,
                confidence_score: confidence_score.unwrap_or(0.0),
            },
        ),
    }
}

/// Drive one turn and report it through `out`.
///
/// `out` sees `agent_processing_start`, then every step event in the order
/// the engine produced it, then either `agent_processing_complete` or a
/// single `error`. The carry is only updated when the turn succeeds.
pub async fn run_turn(
    executor: &GraphExecutor,
    session_id: &SessionId,
    content: &str,
    carry: &mut TurnCarry,
    out: &(dyn Fn(ServerEvent) + Send + Sync),
) -> Result<ExecutionResult> {
    let sid = session_id.as_str();
    out(ServerEvent::processing_start(sid));

    let state = WorkflowState::seeded(session_id.clone(), content, carry);
    let sink = |event: WorkflowEvent| out(to_server_event(executor, sid, event));

    match executor.execute(state, &sink).await {
        Ok(result) => {
            carry.absorb(&result.state);
            info!(
                session_id = sid,
                visited = ?result.visited,
                elapsed_ms = result.elapsed_ms,
                total_steps = carry.total_steps,
                "Turn complete"
            );
            out(ServerEvent::processing_complete(sid));
            Ok(result)
        }
        Err(e) => {
            error!(session_id = sid, error = %e, "Turn failed");
            out(ServerEvent::error(sid, format!("❌ Agent error: {}", e)));
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use agentwire_agent::graph::standard_graph;
    use agentwire_core::config::WorkflowConfig;

    use crate::protocol::EventKind;

    fn executor() -> GraphExecutor {
        standard_graph(&WorkflowConfig {
            step_delay_ms: 0,
            max_steps: 16,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn scripted_turn_emits_in_order() {
        let executor = executor();
        let events = Mutex::new(Vec::new());
        let out = |e: ServerEvent| events.lock().unwrap().push(e);
        let mut carry = TurnCarry::default();

        run_turn(
            &executor,
            &SessionId::from_string("s1"),
            "Calculate metrics for: 10, 20, 30",
            &mut carry,
            &out,
        )
        .await
        .unwrap();

        let events = events.into_inner().unwrap();
        let kinds: Vec<EventKind> = events.iter().map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::AgentProcessingStart,
                EventKind::AgentStepDetailed,
                EventKind::AgentStepDetailed,
                EventKind::AgentResponse,
                EventKind::AgentProcessingComplete,
            ]
        );
        assert_eq!(events[1].content, "📋 Step 1: Router");
        assert_eq!(events[2].content, "📋 Step 2: Calculate Metrics");

        let info = events[3].step_info.as_ref().unwrap();
        assert_eq!(info.step_number, 2);
        assert_eq!(info.confidence_score, 0.9);
        assert!(events[3].content.contains("20.00"));
        assert!(events.iter().all(|e| e.session_id == "s1"));
    }

    #[tokio::test]
    async fn carry_accumulates_across_turns() {
        let executor = executor();
        let out = |_: ServerEvent| {};
        let sid = SessionId::from_string("s1");
        let mut carry = TurnCarry::default();

        run_turn(&executor, &sid, "analyze this", &mut carry, &out)
            .await
            .unwrap();
        let second = run_turn(&executor, &sid, "search for rust", &mut carry, &out)
            .await
            .unwrap();

        assert_eq!(second.state.step_count, 2);
        assert_eq!(carry.total_steps, 4);
        assert_eq!(
            carry.tools_used,
            vec!["analyze_text_content", "search_knowledge_base"]
        );
        assert!(carry.analysis_results.contains_key("content_analysis"));
        assert!(carry.analysis_results.contains_key("knowledge_search"));
    }

    #[tokio::test]
    async fn metrics_without_numbers_reports_zero_confidence() {
        let executor = executor();
        let events = Mutex::new(Vec::new());
        let out = |e: ServerEvent| events.lock().unwrap().push(e);
        let mut carry = TurnCarry::default();

        run_turn(
            &executor,
            &SessionId::from_string("s1"),
            "calculate hello world",
            &mut carry,
            &out,
        )
        .await
        .unwrap();

        let events = events.into_inner().unwrap();
        let response = events
            .iter()
            .find(|e| e.kind == EventKind::AgentResponse)
            .unwrap();
        assert_eq!(response.step_info.as_ref().unwrap().confidence_score, 0.0);
        assert_eq!(
            events.last().unwrap().kind,
            EventKind::AgentProcessingComplete
        );
    }
}
