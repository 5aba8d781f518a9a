use serde::{Deserialize, Serialize};

/// Pseudo-node id for the shared terminal sink.
pub const END: &str = "__end__";

/// An edge connecting two nodes in the workflow graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    /// Source node id.
    pub from: String,
    /// Target node id, or [`END`].
    pub to: String,
    #[serde(default)]
    pub condition: EdgeCondition,
}

/// Condition for traversing an edge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EdgeCondition {
    /// Taken when the source node chose no label.
    #[default]
    Always,
    /// Taken when the source node's chosen label equals `label` exactly.
    Label { label: String },
    /// Taken when a label was chosen but no `Label` edge matches it.
    Fallback,
}

impl Edge {
    /// Create an unconditional edge.
    pub fn always(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: EdgeCondition::Always,
        }
    }

    /// Create an edge selected by a router label.
    pub fn on_label(
        from: impl Into<String>,
        label: impl Into<String>,
        to: impl Into<String>,
    ) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: EdgeCondition::Label {
                label: label.into(),
            },
        }
    }

    /// Create the fallback edge for unmatched labels.
    pub fn fallback(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
            condition: EdgeCondition::Fallback,
        }
    }

    /// Create an unconditional edge into the terminal sink.
    pub fn to_end(from: impl Into<String>) -> Self {
        Self::always(from, END)
    }

    pub fn is_terminal(&self) -> bool {
        self.to == END
    }
}

/// Pick the edge to follow out of a node.
///
/// With a label: the exact `Label` match, else the `Fallback` edge. Without
/// one: the first `Always` edge. `None` means nothing applies.
pub fn select<'a>(outgoing: &[&'a Edge], label: Option<&str>) -> Option<&'a Edge> {
    match label {
        Some(label) => outgoing
            .iter()
            .find(|e| matches!(&e.condition, EdgeCondition::Label { label: l } if l == label))
            .or_else(|| {
                outgoing
                    .iter()
                    .find(|e| e.condition == EdgeCondition::Fallback)
            })
            .copied(),
        None => outgoing
            .iter()
            .find(|e| e.condition == EdgeCondition::Always)
            .copied(),
    }
}
