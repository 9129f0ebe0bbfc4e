//! ChatSession - Orchestrates the conversation tree and the gateway
//!
//! The session is an explicit object passed around by the embedding
//! application; there is no process-global conversation. It owns the tree
//! exclusively: the presentation layer only reads node content and forwards
//! intents.

use std::path::Path;
use std::sync::Arc;

use chat_core::{ChatSnapshot, ConversationTree, NodeId, Role};
use completion_client::{ChatMessage, CompletionGateway};
use log::{info, warn};
use tokio::sync::mpsc::UnboundedSender;

use crate::error::{Result, SessionError};
use crate::events::{NodeView, SessionEvent};
use crate::machine::{SessionState, SessionStateMachine};

const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Outcome of a branch switch: which nodes left the view and which now
/// make up the active chain below the fork.
#[derive(Debug, Clone)]
pub struct SelectionChange {
    pub selected: NodeId,
    pub removed: Vec<NodeId>,
    pub rendered: Vec<NodeId>,
}

pub struct ChatSession {
    tree: ConversationTree,
    gateway: Arc<dyn CompletionGateway>,
    model: String,
    max_tokens: u32,
    total_tokens: u64,
    machine: SessionStateMachine,
    event_tx: Option<UnboundedSender<SessionEvent>>,
}

impl ChatSession {
    pub fn new(
        system_prompt: impl Into<String>,
        gateway: Arc<dyn CompletionGateway>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            tree: ConversationTree::new(system_prompt),
            gateway,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            total_tokens: 0,
            machine: SessionStateMachine::new(),
            event_tx: None,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Attach a channel for presentation notifications.
    pub fn with_events(mut self, tx: UnboundedSender<SessionEvent>) -> Self {
        self.event_tx = Some(tx);
        self
    }

    pub fn tree(&self) -> &ConversationTree {
        &self.tree
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn total_tokens(&self) -> u64 {
        self.total_tokens
    }

    pub fn state(&self) -> SessionState {
        self.machine.state()
    }

    /// Send a user message and request a reply for the active path.
    ///
    /// On gateway failure the user node stays and no assistant node is
    /// added; the caller may retry by regenerating against the same node.
    /// Returns the assistant node id.
    pub async fn send_user_message(&mut self, text: impl Into<String>) -> Result<NodeId> {
        self.machine.begin_request().map_err(|e| self.reject(e))?;
        let result = self.send_inner(text.into()).await;
        self.machine.finish_request();
        self.report(result)
    }

    async fn send_inner(&mut self, text: String) -> Result<NodeId> {
        let user = self.tree.add_message(text, Role::User)?;
        self.emit_node_added(user);
        self.request_reply(user).await
    }

    /// Fork-on-edit: replace a past user message with a new sibling branch
    /// and request a reply for it. The original branch stays in the tree,
    /// reachable again through `select_branch`.
    pub async fn edit_user_message(
        &mut self,
        node_id: NodeId,
        new_text: impl Into<String>,
    ) -> Result<NodeId> {
        self.machine.begin_request().map_err(|e| self.reject(e))?;
        let result = self.edit_inner(node_id, new_text.into()).await;
        self.machine.finish_request();
        self.report(result)
    }

    async fn edit_inner(&mut self, node_id: NodeId, new_text: String) -> Result<NodeId> {
        let parent = self
            .tree
            .node(node_id)?
            .parent
            .ok_or(chat_core::TreeError::NotAUserMessage(node_id))?;
        let off_view: Vec<NodeId> = self
            .tree
            .view_path_below(parent)?
            .iter()
            .map(|n| n.id)
            .collect();

        let sibling = self.tree.edit_message(node_id, new_text)?;
        if !off_view.is_empty() {
            self.emit(SessionEvent::NodesRemoved { node_ids: off_view });
        }
        self.emit_node_added(sibling);
        self.request_reply(sibling).await
    }

    /// Discard the currently selected assistant reply and request a new one
    /// for the same preceding context. Replaces, never forks: the fork's
    /// child count is restored once the new reply lands.
    ///
    /// When the tip is a user node whose send failed (no reply attached),
    /// this retries the completion for it without pruning anything.
    pub async fn regenerate(&mut self) -> Result<NodeId> {
        self.machine.begin_request().map_err(|e| self.reject(e))?;
        let result = self.regenerate_inner().await;
        self.machine.finish_request();
        self.report(result)
    }

    async fn regenerate_inner(&mut self) -> Result<NodeId> {
        let current = self.tree.current_id();
        let node = self.tree.node(current)?;
        match node.role {
            Role::Assistant => {
                let parent = node.parent.ok_or(SessionError::NoAssistantToRegenerate)?;
                let removed = self.tree.remove_subtree_after(parent)?;
                info!("regenerate: discarded {} node(s)", removed.len());
                self.emit(SessionEvent::NodesRemoved { node_ids: removed });
                self.request_reply(parent).await
            }
            Role::User => self.request_reply(current).await,
            Role::System => Err(SessionError::NoAssistantToRegenerate),
        }
    }

    /// Switch the active branch at a fork. Purely structural: no gateway
    /// call, nothing is destroyed, the old branch just leaves the view.
    pub fn select_branch(&mut self, fork_id: NodeId, index: usize) -> Result<SelectionChange> {
        let result = self.select_branch_inner(fork_id, index);
        self.report(result)
    }

    fn select_branch_inner(&mut self, fork_id: NodeId, index: usize) -> Result<SelectionChange> {
        // Diff the whole active chain: a fork off the current path swaps
        // more of the view than just the nodes below the fork.
        let old_view: Vec<NodeId> = self
            .tree
            .view_path_below(self.tree.root_id())?
            .iter()
            .map(|n| n.id)
            .collect();

        let selected = self.tree.select_branch(fork_id, index)?;

        let new_view: Vec<NodeId> = self
            .tree
            .view_path_below(self.tree.root_id())?
            .iter()
            .map(|n| n.id)
            .collect();

        let removed: Vec<NodeId> = old_view
            .iter()
            .filter(|id| !new_view.contains(id))
            .copied()
            .collect();
        let rendered: Vec<NodeId> = new_view
            .iter()
            .filter(|id| !old_view.contains(id))
            .copied()
            .collect();

        if !removed.is_empty() {
            self.emit(SessionEvent::NodesRemoved {
                node_ids: removed.clone(),
            });
        }
        for id in &rendered {
            self.emit_node_added(*id);
        }
        Ok(SelectionChange {
            selected,
            removed,
            rendered,
        })
    }

    /// Read a file and feed its contents into the conversation as a user
    /// message, triggering a real completion for it.
    pub async fn include_file(&mut self, path: impl AsRef<Path>) -> Result<NodeId> {
        let text = tokio::fs::read_to_string(path.as_ref()).await?;
        let wrapped = format!(
            "Here is a document that I want to include in our conversation:\n{text}"
        );
        self.send_user_message(wrapped).await
    }

    pub fn change_model(&mut self, model: impl Into<String>) {
        self.model = model.into();
        self.emit_status();
    }

    /// The linear context of the active path, root to current.
    pub fn view_path(&self) -> Vec<NodeView> {
        self.tree.view_path().into_iter().map(NodeView::from).collect()
    }

    /// Capture the session as a persistable snapshot.
    pub fn snapshot(&self) -> ChatSnapshot {
        ChatSnapshot {
            model: self.model.clone(),
            total_tokens: self.total_tokens,
            conversation_tree: Some(self.tree.to_record()),
        }
    }

    /// Replace the session contents from a snapshot.
    ///
    /// The replacement tree is fully built and validated before anything is
    /// swapped, so a malformed snapshot leaves the session untouched.
    /// Returns the ids of forks whose persisted selection was dangling.
    pub fn restore(&mut self, snapshot: &ChatSnapshot) -> Result<Vec<NodeId>> {
        let result = self.restore_inner(snapshot);
        self.report(result)
    }

    fn restore_inner(&mut self, snapshot: &ChatSnapshot) -> Result<Vec<NodeId>> {
        let loaded = snapshot
            .conversation_tree
            .as_ref()
            .map(ConversationTree::from_record)
            .transpose()?;

        let old_view: Vec<NodeId> = self
            .tree
            .view_path_below(self.tree.root_id())?
            .iter()
            .map(|n| n.id)
            .collect();

        let mut dangling = Vec::new();
        match loaded {
            Some(loaded) => {
                dangling = loaded.dangling_selections;
                self.tree = loaded.tree;
            }
            None => {
                // Null tree: an empty conversation under the same prompt.
                let prompt = self
                    .tree
                    .get(self.tree.root_id())
                    .map(|root| root.message.clone())
                    .unwrap_or_default();
                self.tree = ConversationTree::new(prompt);
            }
        }
        if !snapshot.model.is_empty() {
            self.model = snapshot.model.clone();
        }
        self.total_tokens = snapshot.total_tokens;

        if !old_view.is_empty() {
            self.emit(SessionEvent::NodesRemoved { node_ids: old_view });
        }
        let rendered: Vec<NodeId> = self
            .tree
            .view_path_below(self.tree.root_id())?
            .iter()
            .map(|n| n.id)
            .collect();
        for id in rendered {
            self.emit_node_added(id);
        }
        self.emit_status();
        if !dangling.is_empty() {
            warn!("restore: {} fork(s) had dangling selections", dangling.len());
        }
        Ok(dangling)
    }

    /// Request a completion for the path ending at `target` and attach the
    /// reply as its child.
    ///
    /// The session borrows itself mutably across the await, so no other
    /// operation can supersede `target` while the request is in flight; the
    /// reply always lands on the node it was issued for.
    async fn request_reply(&mut self, target: NodeId) -> Result<NodeId> {
        let messages: Vec<ChatMessage> = self
            .tree
            .path_from_root(Some(target))?
            .iter()
            .map(|node| ChatMessage::new(node.role, node.message.clone()))
            .collect();

        let completion = self
            .gateway
            .complete(&messages, &self.model, self.max_tokens)
            .await?;

        let reply = self.tree.add_message(completion.content, Role::Assistant)?;
        self.total_tokens = completion.usage.total_tokens;
        self.emit_node_added(reply);
        self.emit_status();
        Ok(reply)
    }

    fn emit_node_added(&self, id: NodeId) {
        if let Some(node) = self.tree.get(id) {
            self.emit(SessionEvent::NodeAdded {
                node: NodeView::from(node),
            });
        }
    }

    fn emit_status(&self) {
        self.emit(SessionEvent::StatusChanged {
            total_tokens: self.total_tokens,
            model: self.model.clone(),
        });
    }

    fn emit(&self, event: SessionEvent) {
        if let Some(tx) = &self.event_tx {
            // A closed receiver only means nobody is rendering.
            let _ = tx.send(event);
        }
    }

    /// Surface a failure to the presentation before handing it back.
    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.emit(SessionEvent::Error {
                kind: err.kind().to_string(),
                message: err.to_string(),
            });
        }
        result
    }

    fn reject(&self, err: impl Into<SessionError>) -> SessionError {
        let err = err.into();
        self.emit(SessionEvent::Error {
            kind: err.kind().to_string(),
            message: err.to_string(),
        });
        err
    }
}
