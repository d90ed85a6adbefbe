//! Workflow graph topology
//!
//! Fetched once from the orchestrator at startup and treated as read-only.

use serde::{Deserialize, Serialize};

pub const START_NODE: &str = "__start__";
pub const END_NODE: &str = "__end__";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphNode {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphEdge {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub condition: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphTopology {
    pub nodes: Vec<GraphNode>,
    pub edges: Vec<GraphEdge>,
    pub entry_point: String,
    #[serde(default)]
    pub end_points: Vec<String>,
}

impl GraphTopology {
    /// The research workflow the orchestrator ships with. Used when the
    /// topology endpoint is unavailable.
    pub fn research_workflow() -> Self {
        let node = |name: &str, kind: &str| GraphNode {
            name: name.to_string(),
            kind: kind.to_string(),
        };
        let edge = |source: &str, target: &str, condition: Option<&str>| GraphEdge {
            source: source.to_string(),
            target: target.to_string(),
            kind: if condition.is_some() { "conditional" } else { "direct" }.to_string(),
            condition: condition.map(str::to_string),
        };

        Self {
            nodes: vec![
                node(START_NODE, "start"),
                node("generate_query", "agent"),
                node("web_research", "agent"),
                node("reflection", "agent"),
                node("finalize_answer", "agent"),
                node(END_NODE, "end"),
            ],
            edges: vec![
                edge(START_NODE, "generate_query", None),
                edge("generate_query", "web_research", Some("continue_to_web_research")),
                edge("web_research", "reflection", None),
                edge("reflection", "web_research", Some("evaluate_research")),
                edge("reflection", "finalize_answer", Some("evaluate_research")),
                edge("finalize_answer", END_NODE, None),
            ],
            entry_point: "generate_query".to_string(),
            end_points: vec!["finalize_answer".to_string()],
        }
    }

    pub fn node(&self, name: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.name == name)
    }
}
