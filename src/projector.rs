//! Execution and selection projection
//!
//! Derives what the graph view shows for one thread: which node is executing,
//! which one the user selected, which ones produced output, and the items of
//! the selected agent. Pure functions over a thread snapshot.

use crate::conversation::{ConversationThread, MessageItem};
use crate::session::SessionStatus;
use crate::topology::{GraphEdge, GraphTopology};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// UI selection. Never stored on the thread.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionState {
    pub selected_thread_id: Option<String>,
    pub selected_agent_name: Option<String>,
}

impl SelectionState {
    fn selects(&self, thread_id: &str, agent: &str) -> bool {
        self.selected_thread_id.as_deref() == Some(thread_id)
            && self.selected_agent_name.as_deref() == Some(agent)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeView {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub executing: bool,
    pub selected: bool,
    pub visited: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailView {
    pub agent: Option<String>,
    pub items: Vec<Arc<MessageItem>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphView {
    pub thread_id: String,
    pub nodes: Vec<NodeView>,
    pub edges: Vec<GraphEdge>,
    pub detail: DetailView,
}

/// Project a thread onto the workflow graph.
///
/// Topology nodes come first in topology order, followed by agents the
/// thread mentions that the topology doesn't know about.
pub fn project(
    thread: &ConversationThread,
    status: &SessionStatus,
    selection: &SelectionState,
    topology: &GraphTopology,
) -> GraphView {
    let running = status.is_streaming() && !thread.is_idle();
    let node_view = |name: &str, kind: &str| NodeView {
        name: name.to_string(),
        kind: kind.to_string(),
        executing: running && thread.current_agent == name,
        selected: selection.selects(&thread.id, name),
        visited: thread.group(name).is_some(),
    };

    let mut nodes: Vec<NodeView> = topology
        .nodes
        .iter()
        .map(|node| node_view(&node.name, &node.kind))
        .collect();
    for group in &thread.assistant_groups {
        if topology.node(&group.agent).is_none() {
            nodes.push(node_view(&group.agent, "agent"));
        }
    }

    let detail_agent = selection
        .selected_agent_name
        .clone()
        .filter(|_| selection.selected_thread_id.as_deref() == Some(thread.id.as_str()));
    let items = detail_agent
        .as_deref()
        .map(|agent| selected_items(thread, agent).to_vec())
        .unwrap_or_default();

    GraphView {
        thread_id: thread.id.clone(),
        nodes,
        edges: topology.edges.clone(),
        detail: DetailView {
            agent: detail_agent,
            items,
        },
    }
}

/// Items produced by `agent` in this thread; empty if it has no group
pub fn selected_items<'a>(thread: &'a ConversationThread, agent: &str) -> &'a [Arc<MessageItem>] {
    thread
        .group(agent)
        .map(|group| group.items.as_slice())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conversation::{reduce, MessageContent, StreamEvent, TerminalCondition};

    impl SelectionState {
        fn new(thread_id: &str, agent: &str) -> Self {
            Self {
                selected_thread_id: Some(thread_id.to_string()),
                selected_agent_name: Some(agent.to_string()),
            }
        }
    }

    impl GraphView {
        fn node(&self, name: &str) -> Option<&NodeView> {
            self.nodes.iter().find(|node| node.name == name)
        }

        fn executing(&self) -> Option<&NodeView> {
            self.nodes.iter().find(|node| node.executing)
        }
    }

    fn thread_with(events: &[StreamEvent]) -> ConversationThread {
        let terminal = TerminalCondition::default();
        events.iter().fold(
            ConversationThread::new("t1", MessageContent::text("hello")),
            |thread, event| reduce(&thread, event, &terminal),
        )
    }

    fn research_thread() -> ConversationThread {
        thread_with(&[
            StreamEvent::new("generate_query", "q1").with_text("Q: weather?"),
            StreamEvent::new("web_research", "w1").with_text("sources"),
        ])
    }

    #[test]
    fn test_executing_follows_current_agent_while_streaming() {
        let thread = research_thread();
        let topology = GraphTopology::research_workflow();

        let view = project(
            &thread,
            &SessionStatus::Streaming,
            &SelectionState::default(),
            &topology,
        );
        assert_eq!(view.executing().map(|n| n.name.as_str()), Some("web_research"));
        assert_eq!(view.nodes.iter().filter(|n| n.executing).count(), 1);

        let view = project(
            &thread,
            &SessionStatus::Cancelled,
            &SelectionState::default(),
            &topology,
        );
        assert!(view.executing().is_none());
    }

    #[test]
    fn test_visited_nodes() {
        let view = project(
            &research_thread(),
            &SessionStatus::Completed,
            &SelectionState::default(),
            &GraphTopology::research_workflow(),
        );

        assert!(view.node("generate_query").unwrap().visited);
        assert!(view.node("web_research").unwrap().visited);
        assert!(!view.node("reflection").unwrap().visited);
        assert!(!view.node("finalize_answer").unwrap().visited);
    }

    #[test]
    fn test_selection_is_scoped_to_thread() {
        let thread = research_thread();
        let topology = GraphTopology::research_workflow();

        let view = project(
            &thread,
            &SessionStatus::Completed,
            &SelectionState::new("t1", "generate_query"),
            &topology,
        );
        assert!(view.node("generate_query").unwrap().selected);
        assert_eq!(view.detail.agent.as_deref(), Some("generate_query"));
        assert_eq!(view.detail.items.len(), 1);
        assert_eq!(view.detail.items[0].content, MessageContent::text("Q: weather?"));

        let other = project(
            &thread,
            &SessionStatus::Completed,
            &SelectionState::new("t2", "generate_query"),
            &topology,
        );
        assert!(other.nodes.iter().all(|n| !n.selected));
        assert_eq!(other.detail.agent, None);
        assert!(other.detail.items.is_empty());
    }

    #[test]
    fn test_selecting_agent_without_output_is_empty() {
        let thread = research_thread();
        assert!(selected_items(&thread, "finalize_answer").is_empty());
        assert!(selected_items(&thread, "nonexistent").is_empty());

        let view = project(
            &thread,
            &SessionStatus::Streaming,
            &SelectionState::new("t1", "reflection"),
            &GraphTopology::research_workflow(),
        );
        assert!(view.node("reflection").unwrap().selected);
        assert!(view.detail.items.is_empty());
    }

    #[test]
    fn test_unknown_agents_are_appended() {
        let thread = thread_with(&[
            StreamEvent::new("planner", "p1").with_text("plan"),
            StreamEvent::new("generate_query", "q1").with_text("Q"),
        ]);
        let topology = GraphTopology::research_workflow();

        let view = project(
            &thread,
            &SessionStatus::Streaming,
            &SelectionState::default(),
            &topology,
        );
        assert_eq!(view.nodes.len(), topology.nodes.len() + 1);
        let last = view.nodes.last().unwrap();
        assert_eq!(last.name, "planner");
        assert!(last.visited);
        assert!(!last.executing);
        assert_eq!(view.nodes[0].name, topology.nodes[0].name);
    }

    #[test]
    fn test_detail_items_share_thread_items() {
        let thread = research_thread();
        let view = project(
            &thread,
            &SessionStatus::Completed,
            &SelectionState::new("t1", "web_research"),
            &GraphTopology::research_workflow(),
        );
        assert!(Arc::ptr_eq(
            &view.detail.items[0],
            &thread.group("web_research").unwrap().items[0]
        ));
    }
}
