use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use agentwire_core::error::Result;

use super::{Step, CALCULATE_METRICS};
use crate::state::WorkflowState;

const TOOL_NAME: &str = "calculate_metrics";
const CONFIDENCE: f64 = 0.90;

const NO_DATA_PROMPT: &str = "I didn't find any numeric data in your message. \
Please provide some numbers (comma-separated) for me to analyze. For example: '10, 20, 30, 25, 35'";

fn number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[-+]?\d+(?:\.\d+)?").unwrap())
}

/// Every signed integer or decimal in `text`, in order of appearance.
pub fn extract_numbers(text: &str) -> Vec<f64> {
    number_pattern()
        .find_iter(text)
        .filter_map(|m| m.as_str().parse::<f64>().ok())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicMetrics {
    pub total: f64,
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

/// Mean and median always; spread only with two or more points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalMetrics {
    pub mean: f64,
    pub median: f64,
    pub std_dev: Option<f64>,
    pub variance: Option<f64>,
    /// True when there are too few points for a sample variance.
    pub degenerate: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialMetrics {
    pub total: f64,
    /// Percent change from the first to the last value; 0 when undefined.
    pub growth_rate_pct: f64,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsReport {
    pub basic: BasicMetrics,
    pub statistical: StatisticalMetrics,
    pub financial: FinancialMetrics,
}

impl MetricsReport {
    /// Compute all three metric groups. `None` for an empty series.
    pub fn compute(values: &[f64]) -> Option<Self> {
        let (first, last) = (*values.first()?, *values.last()?);
        let count = values.len();
        let total: f64 = values.iter().sum();
        let mean = total / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));
        let median = if count % 2 == 1 {
            sorted[count / 2]
        } else {
            (sorted[count / 2 - 1] + sorted[count / 2]) / 2.0
        };

        let (std_dev, variance) = if count > 1 {
            let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>()
                / (count - 1) as f64;
            (Some(variance.sqrt()), Some(variance))
        } else {
            (None, None)
        };

        let growth_rate_pct = if count > 1 && first != 0.0 {
            (last - first) / first * 100.0
        } else {
            0.0
        };

        Some(Self {
            basic: BasicMetrics {
                total,
                count,
                mean,
                min,
                max,
            },
            statistical: StatisticalMetrics {
                mean,
                median,
                std_dev,
                variance,
                degenerate: count < 2,
            },
            financial: FinancialMetrics {
                total,
                growth_rate_pct,
                data_points: count,
            },
        })
    }

    /// Human-readable lines, one titled block per metric group.
    pub fn render(&self) -> Vec<String> {
        let b = &self.basic;
        let s = &self.statistical;
        let f = &self.financial;

        let basic = format!(
            "Basic metrics - Total: {}, Count: {}, Average: {:.2}, Min: {}, Max: {}",
            b.total, b.count, b.mean, b.min, b.max
        );
        let statistical = match (s.std_dev, s.variance) {
            (Some(sd), Some(var)) => format!(
                "Statistical metrics - Mean: {:.2}, Median: {:.2}, Std Dev: {:.2}, Variance: {:.2}",
                s.mean, s.median, sd, var
            ),
            _ => format!(
                "Statistical metrics - Mean: {:.2}, Median: {:.2} (single value)",
                s.mean, s.median
            ),
        };
        let financial = format!(
            "Financial metrics - Total Value: ${:.2}, Growth Rate: {:.1}%, Data Points: {}",
            f.total, f.growth_rate_pct, f.data_points
        );

        vec![
            format!("**Basic Metrics:**\n{}", basic),
            format!("**Statistical Metrics:**\n{}", statistical),
            format!("**Financial Metrics:**\n{}", financial),
        ]
    }
}

/// Extracts numbers from the message and reports metrics over them.
pub struct CalculateMetrics;

impl Step for CalculateMetrics {
    fn name(&self) -> &str {
        CALCULATE_METRICS
    }

    fn run(&self, mut state: WorkflowState) -> Result<WorkflowState> {
        let values = extract_numbers(state.latest_user_text());
        debug!(session_id = %state.session_id, points = values.len(), "Calculating metrics");

        let Some(report) = MetricsReport::compute(&values) else {
            state.respond(NO_DATA_PROMPT, "metrics_calculation_failed");
            return Ok(state);
        };

        let rendered = report.render();
        let data_points = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");

        state.record_tool(TOOL_NAME);
        state.analysis_results.insert(
            "metrics".to_string(),
            serde_json::json!({
                "data_points": data_points,
                "report": report,
                "results": rendered,
            }),
        );

        let response = format!(
            "I've analyzed your numeric data:\n\n{}\n\n\
             Would you like me to perform additional calculations or provide insights about these metrics?",
            rendered.join("\n\n")
        );
        state.respond(response, "metrics_calculation_completed");
        state.confidence_score = Some(CONFIDENCE);
        Ok(state)
    }
}
