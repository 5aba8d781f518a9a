use tracing::debug;

use agentwire_core::error::Result;

use super::{Step, ANALYZE_CONTENT};
use crate::state::WorkflowState;

const TOOL_NAME: &str = "analyze_text_content";
const CONFIDENCE: f64 = 0.85;

const POSITIVE_WORDS: &[&str] = &["good", "great", "excellent", "amazing", "wonderful", "fantastic"];
const NEGATIVE_WORDS: &[&str] = &["bad", "terrible", "awful", "horrible", "disappointing"];
const KEYWORD_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    Positive,
    Negative,
    Neutral,
}

impl Polarity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Positive => "positive",
            Self::Negative => "negative",
            Self::Neutral => "neutral",
        }
    }
}

/// Polarity plus the number of distinct positive/negative trigger words seen.
pub fn sentiment(text: &str) -> (Polarity, usize, usize) {
    let lowered = text.to_lowercase();
    let positive = POSITIVE_WORDS.iter().filter(|w| lowered.contains(*w)).count();
    let negative = NEGATIVE_WORDS.iter().filter(|w| lowered.contains(*w)).count();
    let polarity = match positive.cmp(&negative) {
        std::cmp::Ordering::Greater => Polarity::Positive,
        std::cmp::Ordering::Less => Polarity::Negative,
        std::cmp::Ordering::Equal => Polarity::Neutral,
    };
    (polarity, positive, negative)
}

/// Words longer than three characters ranked by frequency.
///
/// Ties keep first-occurrence order.
pub fn keywords(text: &str, limit: usize) -> Vec<(String, usize)> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for word in text.split_whitespace() {
        let cleaned = word
            .to_lowercase()
            .trim_matches(|c: char| ".,!?;:".contains(c))
            .to_string();
        if cleaned.chars().count() <= 3 {
            continue;
        }
        match counts.iter_mut().find(|(w, _)| *w == cleaned) {
            Some((_, n)) => *n += 1,
            None => counts.push((cleaned, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.truncate(limit);
    counts
}

/// Complexity bucket and average words per sentence.
pub fn complexity(text: &str) -> (&'static str, f64) {
    let words = text.split_whitespace().count();
    let sentences = text.split('.').count().max(1);
    let avg = words as f64 / sentences as f64;
    let bucket = if avg > 20.0 {
        "high"
    } else if avg > 10.0 {
        "medium"
    } else {
        "low"
    };
    (bucket, avg)
}

/// The three textual summaries, in fixed order.
pub fn summarize(text: &str) -> Vec<String> {
    let (polarity, pos, neg) = sentiment(text);
    let top = keywords(text, KEYWORD_LIMIT)
        .iter()
        .map(|(w, n)| format!("{}({})", w, n))
        .collect::<Vec<_>>()
        .join(", ");
    let (bucket, avg) = complexity(text);

    vec![
        format!(
            "Sentiment analysis: {} (positive: {}, negative: {})",
            polarity.as_str(),
            pos,
            neg
        ),
        format!("Top keywords: {}", top),
        format!("Text complexity: {} (avg {:.1} words/sentence)", bucket, avg),
    ]
}

/// Runs sentiment, keyword and complexity analysis over the message.
pub struct AnalyzeContent;

impl Step for AnalyzeContent {
    fn name(&self) -> &str {
        ANALYZE_CONTENT
    }

    fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        debug!(session_id = %state.session_id, "Analyzing content");
        let analyses = summarize(state.latest_user_text());

        state.record_tool(TOOL_NAME);
        state.analysis_results.insert(
            "content_analysis".to_string(),
            serde_json::json!(analyses),
        );

        let response = format!(
            "I've analyzed your content from multiple perspectives:\n\n{}\n\n\
             Would you like me to dive deeper into any specific aspect?",
            analyses.join("\n")
        );
        state.respond(response, "content_analysis_completed");
        state.confidence_score = Some(CONFIDENCE);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentwire_core::types::SessionId;

    #[test]
    fn sentiment_compares_counts() {
        assert_eq!(sentiment("This is great and amazing").0, Polarity::Positive);
        assert_eq!(sentiment("terrible, just awful").0, Polarity::Negative);
        assert_eq!(sentiment("good but bad"), (Polarity::Neutral, 1, 1));
        assert_eq!(sentiment("nothing to see").0, Polarity::Neutral);
    }

    #[test]
    fn keywords_skip_short_words_and_rank_by_frequency() {
        let top = keywords("Rust is fast. Rust, rust! The borrow checker is fast", 5);
        assert_eq!(top[0], ("rust".to_string(), 3));
        assert_eq!(top[1], ("fast".to_string(), 2));
        assert!(top.iter().all(|(w, _)| w.chars().count() > 3));
    }

    #[test]
    fn keywords_are_limited() {
        let top = keywords("alpha bravo charlie delta echoes foxtrot golfer", 5);
        assert_eq!(top.len(), 5);
        assert_eq!(top[0].0, "alpha");
    }

    #[test]
    fn complexity_buckets() {
        assert_eq!(complexity("Short one. Another.").0, "low");
        let long = "word ".repeat(15);
        assert_eq!(complexity(&long).0, "medium");
        let longer = "word ".repeat(30);
        assert_eq!(complexity(&longer).0, "high");
    }

    #[test]
    fn step_records_results_and_confidence() {
        let state = WorkflowState::new(SessionId::from_string("s"), "Analyze this great text");
        let out = AnalyzeContent.run(state).unwrap();

        assert_eq!(out.tools_used, vec![TOOL_NAME]);
        assert_eq!(out.confidence_score, Some(0.85));
        assert_eq!(out.current_step, "content_analysis_completed");
        let reply = &out.last_response().unwrap().content;
        assert!(reply.contains("Sentiment analysis: positive"));
        assert!(reply.contains("Top keywords:"));
        assert!(reply.contains("Text complexity: low"));
        assert_eq!(
            out.analysis_results["content_analysis"].as_array().unwrap().len(),
            3
        );
    }
}
