//! ConversationTree - Branching conversation history
//!
//! History is a tree, not a transcript: editing a past user message forks a
//! sibling branch, regeneration replaces the selected assistant branch, and
//! the "active path" is the root-to-current walk along each node's selected
//! child. Nodes live in an arena keyed by id; `children` is the only
//! ownership edge, `parent` and `selected_child` are id references.

use std::collections::HashMap;

use log::debug;

use crate::error::{Result, TreeError};
use crate::message::{MessageNode, NodeId, Role};

/// Arena-backed conversation tree.
///
/// Structural invariants, upheld by every operation (a failed operation
/// leaves the tree untouched):
/// - walking `selected_child` from the root terminates at `current`
/// - exactly one system node, the parentless root
/// - node ids are unique; a set `selected_child` is a member of `children`
#[derive(Debug, Clone)]
pub struct ConversationTree {
    nodes: HashMap<NodeId, MessageNode>,
    root: NodeId,
    current: NodeId,
}

impl ConversationTree {
    /// Create a tree holding only the system root.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let root = MessageNode::new(system_prompt, Role::System, None);
        let root_id = root.id;
        let mut nodes = HashMap::new();
        nodes.insert(root_id, root);
        Self {
            nodes,
            root: root_id,
            current: root_id,
        }
    }

    pub fn root_id(&self) -> NodeId {
        self.root
    }

    pub fn current_id(&self) -> NodeId {
        self.current
    }

    pub fn get(&self, id: NodeId) -> Option<&MessageNode> {
        self.nodes.get(&id)
    }

    /// Like `get`, but missing nodes are an error.
    pub fn node(&self, id: NodeId) -> Result<&MessageNode> {
        self.nodes.get(&id).ok_or(TreeError::NodeNotFound(id))
    }

    /// Total nodes in the arena, the system root included.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Whether any message beyond the system root exists.
    pub fn has_messages(&self) -> bool {
        self.nodes.len() > 1
    }

    /// Append a message as the child of the current node, select it, and
    /// advance the current position to it.
    ///
    /// `Role::System` is rejected: the system root exists exactly once.
    pub fn add_message(&mut self, message: impl Into<String>, role: Role) -> Result<NodeId> {
        if role == Role::System {
            return Err(TreeError::InvalidRole("system".to_string()));
        }
        let node = MessageNode::new(message, role, Some(self.current));
        let id = node.id;
        self.nodes.insert(id, node);

        let parent = self
            .nodes
            .get_mut(&self.current)
            .expect("current node is always in the arena");
        parent.children.push(id);
        parent.selected_child = Some(id);
        self.current = id;
        Ok(id)
    }

    /// Fork-on-edit: create a sibling of `node_id` under the same parent
    /// carrying `new_message`, select it, and move the current position to
    /// it. The original node and its whole subtree stay in the tree as an
    /// inactive branch.
    pub fn edit_message(&mut self, node_id: NodeId, new_message: impl Into<String>) -> Result<NodeId> {
        let node = self.node(node_id)?;
        if node.role != Role::User {
            return Err(TreeError::NotAUserMessage(node_id));
        }
        let parent_id = node
            .parent
            .ok_or(TreeError::NotAUserMessage(node_id))?;

        let sibling = MessageNode::new(new_message, Role::User, Some(parent_id));
        let sibling_id = sibling.id;
        self.nodes.insert(sibling_id, sibling);

        let parent = self
            .nodes
            .get_mut(&parent_id)
            .expect("parent of a live node is in the arena");
        parent.children.push(sibling_id);
        parent.selected_child = Some(sibling_id);
        self.current = sibling_id;
        debug!("edit fork: {node_id} -> sibling {sibling_id} under {parent_id}");
        Ok(sibling_id)
    }

    /// Select the `index`-th child of `fork_id` as the active branch.
    ///
    /// The fork may lie off the active path; every ancestor up to the root
    /// is re-selected toward it, then the current position is recomputed as
    /// the deepest selected descendant of the chosen child, so the active
    /// path always runs root -> fork -> chosen child. Fails without
    /// mutating anything if `index` is out of range.
    pub fn select_branch(&mut self, fork_id: NodeId, index: usize) -> Result<NodeId> {
        let fork = self.node(fork_id)?;
        let len = fork.children.len();
        let Some(&child_id) = fork.children.get(index) else {
            return Err(TreeError::BranchIndexOutOfRange { index, len });
        };

        // Ancestor chain first, collected immutably: (parent, child-toward-fork).
        let mut reselect = Vec::new();
        let mut cursor = fork_id;
        while let Some(parent_id) = self.node(cursor)?.parent {
            reselect.push((parent_id, cursor));
            cursor = parent_id;
        }
        for (parent_id, toward_fork) in reselect {
            let parent = self
                .nodes
                .get_mut(&parent_id)
                .expect("ancestors of a live node are in the arena");
            parent.selected_child = Some(toward_fork);
        }

        let fork = self
            .nodes
            .get_mut(&fork_id)
            .expect("fork checked above");
        fork.selected_child = Some(child_id);
        self.current = self.deepest_selected(child_id);
        Ok(child_id)
    }

    /// Detach and discard the subtree rooted at `node_id`'s selected child.
    ///
    /// The fork's selection is cleared, the current position returns to
    /// `node_id`, and the ids of every discarded node are returned (the
    /// presentation layer drops their widgets). Regeneration uses this to
    /// replace, rather than multiply, the assistant branch.
    pub fn remove_subtree_after(&mut self, node_id: NodeId) -> Result<Vec<NodeId>> {
        let node = self.node(node_id)?;
        let Some(selected) = node.selected_child else {
            return Ok(Vec::new());
        };

        let mut removed = Vec::new();
        self.collect_subtree(selected, &mut removed);
        for id in &removed {
            self.nodes.remove(id);
        }

        let node = self
            .nodes
            .get_mut(&node_id)
            .expect("node checked above");
        node.children.retain(|id| *id != selected);
        node.selected_child = None;
        self.current = node_id;
        debug!("pruned {} node(s) below {node_id}", removed.len());
        Ok(removed)
    }

    /// Root-to-node path following parent links (the linear context sent to
    /// the completion gateway). Defaults to the current node.
    pub fn path_from_root(&self, node_id: Option<NodeId>) -> Result<Vec<&MessageNode>> {
        let mut cursor = Some(node_id.unwrap_or(self.current));
        let mut path = Vec::new();
        while let Some(id) = cursor {
            let node = self.node(id)?;
            path.push(node);
            cursor = node.parent;
        }
        path.reverse();
        Ok(path)
    }

    /// The selected-child chain strictly below `node_id`: what the
    /// presentation renders for that branch.
    pub fn view_path_below(&self, node_id: NodeId) -> Result<Vec<&MessageNode>> {
        let mut chain = Vec::new();
        let mut cursor = self.node(node_id)?.selected_child;
        while let Some(id) = cursor {
            let node = self.node(id)?;
            chain.push(node);
            cursor = node.selected_child;
        }
        Ok(chain)
    }

    /// The full active path, root included.
    pub fn view_path(&self) -> Vec<&MessageNode> {
        self.path_from_root(None)
            .expect("active path nodes are always in the arena")
    }

    /// Walk `selected_child` from `start` to the deepest selected node.
    fn deepest_selected(&self, start: NodeId) -> NodeId {
        let mut current = start;
        while let Some(next) = self.nodes.get(&current).and_then(|n| n.selected_child) {
            current = next;
        }
        current
    }

    fn collect_subtree(&self, id: NodeId, out: &mut Vec<NodeId>) {
        out.push(id);
        if let Some(node) = self.nodes.get(&id) {
            for child in &node.children {
                self.collect_subtree(*child, out);
            }
        }
    }

    /// Check the structural invariants. Used by the snapshot loader and by
    /// tests; a healthy tree always passes.
    pub fn validate(&self) -> Result<()> {
        let root = self.node(self.root)?;
        if root.role != Role::System || root.parent.is_some() {
            return Err(TreeError::MalformedSnapshot(
                "root must be a parentless system node".to_string(),
            ));
        }
        for node in self.nodes.values() {
            if node.id != self.root && node.role == Role::System {
                return Err(TreeError::MalformedSnapshot(format!(
                    "non-root system node {}",
                    node.id
                )));
            }
            if let Some(selected) = node.selected_child {
                if !node.children.contains(&selected) {
                    return Err(TreeError::DanglingSelection {
                        node: node.id,
                        selected,
                    });
                }
            }
            for child in &node.children {
                let child_node = self.node(*child)?;
                if child_node.parent != Some(node.id) {
                    return Err(TreeError::MalformedSnapshot(format!(
                        "child {} does not point back to parent {}",
                        child, node.id
                    )));
                }
            }
        }
        // The selected walk from the root must end exactly at current.
        if self.deepest_selected(self.root) != self.current {
            return Err(TreeError::MalformedSnapshot(
                "current node is not the deepest selected descendant".to_string(),
            ));
        }
        Ok(())
    }

    /// Replace the whole tree (used by snapshot load). The current position
    /// is recomputed from the new root's selected walk.
    pub(crate) fn from_parts(nodes: HashMap<NodeId, MessageNode>, root: NodeId) -> Result<Self> {
        let mut tree = Self {
            nodes,
            root,
            current: root,
        };
        tree.current = tree.deepest_selected(root);
        tree.validate()?;
        Ok(tree)
    }
}
