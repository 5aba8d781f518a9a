use tracing::debug;

use agentwire_core::error::Result;

use super::{contains_any, Step, SEARCH_KNOWLEDGE};
use crate::state::WorkflowState;

const TOOL_NAME: &str = "search_knowledge_base";
const CONFIDENCE: f64 = 0.75;

/// Knowledge domain a query is answered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Domain {
    General,
    Technical,
    Business,
    Science,
}

const GENERAL_ENTRIES: &[(&str, &str)] = &[
    ("ai", "Artificial Intelligence is a field of computer science focused on creating systems that can perform tasks typically requiring human intelligence."),
    ("machine learning", "Machine Learning is a subset of AI that enables systems to learn and improve from experience without being explicitly programmed."),
    ("langchain", "LangChain is a framework for developing applications powered by language models, focusing on data-aware and agentic applications."),
];

const TECHNICAL_ENTRIES: &[(&str, &str)] = &[
    ("websocket", "WebSockets provide full-duplex communication channels over a single TCP connection, ideal for real-time applications."),
    ("fastapi", "FastAPI is a modern, high-performance web framework for building APIs with Python, featuring automatic OpenAPI documentation."),
    ("react", "React is a JavaScript library for building user interfaces, particularly single-page applications with component-based architecture."),
];

const BUSINESS_ENTRIES: &[(&str, &str)] = &[
    ("strategy", "Business strategy involves defining long-term goals and determining the best approach to achieve competitive advantage."),
    ("automation", "Business process automation uses technology to streamline operations, reduce costs, and improve efficiency."),
];

const SCIENCE_ENTRIES: &[(&str, &str)] = &[
    ("data", "Data science combines statistical methods, algorithms, and domain expertise to extract insights from structured and unstructured data."),
    ("research", "Scientific research follows systematic methodologies to investigate hypotheses and contribute to knowledge advancement."),
];

impl Domain {
    /// Pick a domain from keyword hints; technical beats business beats science.
    pub fn classify(text: &str) -> Self {
        let lowered = text.to_lowercase();
        if contains_any(&lowered, &["technical", "code", "programming", "api"]) {
            Self::Technical
        } else if contains_any(&lowered, &["business", "strategy", "market"]) {
            Self::Business
        } else if contains_any(&lowered, &["research", "study", "data", "science"]) {
            Self::Science
        } else {
            Self::General
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Technical => "technical",
            Self::Business => "business",
            Self::Science => "science",
        }
    }

    fn entries(self) -> &'static [(&'static str, &'static str)] {
        match self {
            Self::General => GENERAL_ENTRIES,
            Self::Technical => TECHNICAL_ENTRIES,
            Self::Business => BUSINESS_ENTRIES,
            Self::Science => SCIENCE_ENTRIES,
        }
    }

    fn fallback(self, query: &str) -> String {
        match self {
            Self::General => format!("General knowledge about '{}': This is a broad topic with multiple applications and considerations.", query),
            Self::Technical => format!("Technical information about '{}': This involves implementation details and best practices specific to the technology stack.", query),
            Self::Business => format!("Business insights about '{}': Consider the impact on operations, costs, and stakeholder value.", query),
            Self::Science => format!("Scientific perspective on '{}': This involves empirical analysis and evidence-based conclusions.", query),
        }
    }
}

/// First canned entry whose key occurs in the query, else the domain default.
pub fn lookup(query: &str, domain: Domain) -> String {
    let lowered = query.to_lowercase();
    domain
        .entries()
        .iter()
        .find(|(key, _)| lowered.contains(key))
        .map(|(_, answer)| answer.to_string())
        .unwrap_or_else(|| domain.fallback(query))
}

/// Answers from the canned knowledge base.
pub struct SearchKnowledge;

impl Step for SearchKnowledge {
    fn name(&self) -> &str {
        SEARCH_KNOWLEDGE
    }

    fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let query = state.latest_user_text().to_string();
        let domain = Domain::classify(&query);
        debug!(session_id = %state.session_id, domain = domain.as_str(), "Searching knowledge");
        let result = lookup(&query, domain);

        state.record_tool(TOOL_NAME);
        state.analysis_results.insert(
            "knowledge_search".to_string(),
            serde_json::json!({
                "query": query,
                "domain": domain.as_str(),
                "result": result,
            }),
        );

        let response = format!(
            "Based on my knowledge search in the {} domain:\n\n{}\n\n\
             Would you like me to search in a different domain or provide more specific information?",
            domain.as_str(),
            result
        );
        state.respond(response, "knowledge_search_completed");
        state.confidence_score = Some(CONFIDENCE);
        Ok(state)
    }
}
