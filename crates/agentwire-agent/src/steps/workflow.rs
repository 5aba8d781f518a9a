use tracing::debug;

use agentwire_core::error::Result;

use super::{title_case, Step, PROCESS_WORKFLOW};
use crate::state::WorkflowState;

const TOOL_NAME: &str = "process_workflow_step";
const CONFIDENCE: f64 = 0.80;
const DEFAULT_STAGE: &str = "analysis";

/// Keyword → stage, scanned in this order.
const STAGE_KEYWORDS: &[(&str, &str)] = &[
    ("data", "data_collection"),
    ("collect", "data_collection"),
    ("analyze", "analysis"),
    ("analysis", "analysis"),
    ("insight", "insight_generation"),
    ("recommend", "recommendation"),
    ("validate", "validation"),
    ("implement", "implementation"),
];

const STAGE_DESCRIPTIONS: &[(&str, &str)] = &[
    ("data_collection", "Data collection phase: Gathering relevant information from various sources and validating data quality."),
    ("analysis", "Analysis phase: Processing collected data using appropriate analytical methods and identifying patterns."),
    ("insight_generation", "Insight generation: Deriving meaningful conclusions and actionable insights from the analysis."),
    ("recommendation", "Recommendation phase: Formulating specific recommendations based on insights and business context."),
    ("validation", "Validation phase: Reviewing recommendations for feasibility and potential impact."),
    ("implementation", "Implementation planning: Creating detailed steps for putting recommendations into action."),
];

/// Distinct stages mentioned in `text`, in keyword-table order.
///
/// Falls back to the analysis stage when nothing matches.
pub fn identify_stages(text: &str) -> Vec<&'static str> {
    let lowered = text.to_lowercase();
    let mut stages: Vec<&'static str> = Vec::new();
    for &(keyword, stage) in STAGE_KEYWORDS {
        if lowered.contains(keyword) && !stages.contains(&stage) {
            stages.push(stage);
        }
    }
    if stages.is_empty() {
        stages.push(DEFAULT_STAGE);
    }
    stages
}

/// Canned paragraph for one stage, with the request echoed as context.
pub fn describe_stage(stage: &str, context: &str) -> String {
    let base = STAGE_DESCRIPTIONS
        .iter()
        .find(|(name, _)| *name == stage)
        .map(|(_, text)| text.to_string())
        .unwrap_or_else(|| format!("Processing custom workflow step: {}", stage));
    if context.is_empty() {
        base
    } else {
        format!("{} Context: {}", base, context)
    }
}

/// Walks the user through the workflow stages their request mentions.
pub struct ProcessWorkflow;

impl Step for ProcessWorkflow {
    fn name(&self) -> &str {
        PROCESS_WORKFLOW
    }

    fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let request = state.latest_user_text().to_string();
        let stages = identify_stages(&request);
        debug!(session_id = %state.session_id, ?stages, "Processing workflow");

        let results: Vec<String> = stages
            .iter()
            .map(|stage| {
                format!(
                    "**{}:**\n{}",
                    title_case(stage),
                    describe_stage(stage, &request)
                )
            })
            .collect();

        state.record_tool(TOOL_NAME);
        state.analysis_results.insert(
            "workflow".to_string(),
            serde_json::json!({
                "identified_steps": stages,
                "results": results,
            }),
        );

        let response = format!(
            "I've processed your workflow request:\n\n{}\n\n\
             Would you like me to elaborate on any specific step or suggest next actions?",
            results.join("\n\n")
        );
        state.respond(response, "workflow_processing_completed");
        state.confidence_score = Some(CONFIDENCE);
        Ok(state)
    }
}
