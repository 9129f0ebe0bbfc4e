//! MessageNode - A single turn in the conversation tree

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Role;

/// Identifier of a node in the conversation tree. Stable across save/load,
/// generated once at creation, never reused.
pub type NodeId = Uuid;

/// One turn in the conversation tree.
///
/// `id`, `message`, `role` and `parent` are fixed at creation; only
/// `children` and `selected_child` mutate afterwards. Edits never rewrite
/// `message` in place, they create a sibling node instead.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageNode {
    pub id: NodeId,

    /// Text content, immutable once the node is committed to history.
    pub message: String,

    pub role: Role,

    /// Parent node, `None` only for the system root.
    pub parent: Option<NodeId>,

    /// Child nodes in creation order. Branch indices are positions in
    /// this list and are never reordered by selection.
    pub children: Vec<NodeId>,

    /// Which child is on the active path, if any. Always a member of
    /// `children` when set.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub selected_child: Option<NodeId>,
}

impl MessageNode {
    pub fn new(message: impl Into<String>, role: Role, parent: Option<NodeId>) -> Self {
        Self::with_id(Uuid::new_v4(), message, role, parent)
    }

    /// Reconstruct a node with a known id (deserialization).
    pub fn with_id(
        id: NodeId,
        message: impl Into<String>,
        role: Role,
        parent: Option<NodeId>,
    ) -> Self {
        Self {
            id,
            message: message.into(),
            role,
            parent,
            children: Vec::new(),
            selected_child: None,
        }
    }

    pub fn is_fork(&self) -> bool {
        self.children.len() > 1
    }

    /// Position of the selected child within `children`, if any.
    pub fn selected_child_index(&self) -> Option<usize> {
        let selected = self.selected_child?;
        self.children.iter().position(|id| *id == selected)
    }
}
