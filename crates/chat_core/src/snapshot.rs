//! Snapshot - Persisted form of a conversation tree
//!
//! The wire format matches the historical JSON layout: a pre-order node
//! record with `selected_child_id` references, wrapped in a top-level
//! object carrying the model name and token counter. Consumers must accept
//! a `null` tree (empty conversation) and an absent `selected_child_id`.

use std::collections::HashMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::{Result, TreeError};
use crate::message::{MessageNode, NodeId, Role};
use crate::tree::ConversationTree;

/// One serialized tree node, children nested pre-order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub message: String,
    pub role: Role,
    #[serde(default)]
    pub children: Vec<NodeRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_child_id: Option<NodeId>,
}

/// Top-level snapshot file contents.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSnapshot {
    pub model: String,
    #[serde(default)]
    pub total_tokens: u64,
    pub conversation_tree: Option<NodeRecord>,
}

/// Result of loading a tree from a record: the tree itself plus any forks
/// whose `selected_child_id` matched no child (selection left unset).
#[derive(Debug)]
pub struct LoadedTree {
    pub tree: ConversationTree,
    pub dangling_selections: Vec<NodeId>,
}

impl ConversationTree {
    /// Serialize the whole tree, pre-order from the root.
    pub fn to_record(&self) -> NodeRecord {
        self.record_for(self.root_id())
    }

    fn record_for(&self, id: NodeId) -> NodeRecord {
        let node = self.get(id).expect("live tree nodes are in the arena");
        NodeRecord {
            id: node.id,
            message: node.message.clone(),
            role: node.role,
            children: node
                .children
                .iter()
                .map(|child| self.record_for(*child))
                .collect(),
            selected_child_id: node.selected_child,
        }
    }

    /// Rebuild a tree from its persisted record.
    ///
    /// Ids are preserved, parent links and selections relinked, and the
    /// current position derived from the deepest selected walk. Duplicate
    /// ids and a non-system root are fatal; a `selected_child_id` matching
    /// no child is reported and left unselected rather than failing the
    /// whole load.
    pub fn from_record(record: &NodeRecord) -> Result<LoadedTree> {
        if record.role != Role::System {
            return Err(TreeError::MalformedSnapshot(format!(
                "root node {} has role {}, expected system",
                record.id, record.role
            )));
        }

        let mut nodes: HashMap<NodeId, MessageNode> = HashMap::new();
        let mut dangling = Vec::new();
        build_node(record, None, &mut nodes, &mut dangling)?;

        let tree = ConversationTree::from_parts(nodes, record.id)?;
        Ok(LoadedTree {
            tree,
            dangling_selections: dangling,
        })
    }
}

fn build_node(
    record: &NodeRecord,
    parent: Option<NodeId>,
    nodes: &mut HashMap<NodeId, MessageNode>,
    dangling: &mut Vec<NodeId>,
) -> Result<()> {
    if nodes.contains_key(&record.id) {
        return Err(TreeError::MalformedSnapshot(format!(
            "duplicate node id {}",
            record.id
        )));
    }
    if parent.is_some() && record.role == Role::System {
        return Err(TreeError::MalformedSnapshot(format!(
            "non-root system node {}",
            record.id
        )));
    }

    let mut node = MessageNode::with_id(record.id, record.message.clone(), record.role, parent);
    node.children = record.children.iter().map(|c| c.id).collect();

    node.selected_child = match record.selected_child_id {
        Some(selected) if node.children.contains(&selected) => Some(selected),
        Some(selected) => {
            warn!(
                "snapshot: node {} selects {} which is not among its children; leaving fork unselected",
                record.id, selected
            );
            dangling.push(record.id);
            None
        }
        None => None,
    };

    nodes.insert(record.id, node);
    for child in &record.children {
        build_node(child, Some(record.id), nodes, dangling)?;
    }
    Ok(())
}
