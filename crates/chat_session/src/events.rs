//! Session events - Notifications from the controller to the presentation
//!
//! `NodesRemoved` means "drop these widgets", not "these nodes were
//! destroyed": a branch switch removes nodes from view that are still very
//! much in the tree.

use chat_core::{MessageNode, NodeId, Role};
use serde::Serialize;

/// What the presentation needs to render one node.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NodeView {
    pub id: NodeId,
    pub role: Role,
    pub message: String,
    pub parent: Option<NodeId>,
}

impl From<&MessageNode> for NodeView {
    fn from(node: &MessageNode) -> Self {
        Self {
            id: node.id,
            role: node.role,
            message: node.message.clone(),
            parent: node.parent,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SessionEvent {
    /// A node joined the active path; render it.
    NodeAdded { node: NodeView },

    /// These nodes left the view (pruned or switched off-path).
    NodesRemoved { node_ids: Vec<NodeId> },

    /// Status line data changed.
    StatusChanged { total_tokens: u64, model: String },

    /// An operation was rejected; the tree is unchanged beyond whatever
    /// node initiated it.
    Error { kind: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_serializes_tagged() {
        let event = SessionEvent::StatusChanged {
            total_tokens: 7,
            model: "gpt-4o".to_string(),
        };
        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["type"], "status_changed");
        assert_eq!(value["total_tokens"], 7);
    }
}
