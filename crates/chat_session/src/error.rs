//! Session error types

use std::path::PathBuf;

use chat_core::TreeError;
use completion_client::ClientError;
use thiserror::Error;

use crate::machine::TransitionError;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Tree error: {0}")]
    Tree(#[from] TreeError),

    #[error("Gateway error: {0}")]
    Gateway(#[from] ClientError),

    #[error("No assistant message to regenerate")]
    NoAssistantToRegenerate,

    #[error(transparent)]
    State(#[from] TransitionError),

    #[error("Snapshot not found: {}", .0.display())]
    SnapshotNotFound(PathBuf),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl SessionError {
    /// Stable error kind for presentation notifications.
    pub fn kind(&self) -> &'static str {
        match self {
            SessionError::Tree(TreeError::InvalidRole(_)) => "invalid_role",
            SessionError::Tree(TreeError::BranchIndexOutOfRange { .. }) => {
                "branch_index_out_of_range"
            }
            SessionError::Tree(TreeError::NodeNotFound(_)) => "node_not_found",
            SessionError::Tree(TreeError::NotAUserMessage(_)) => "not_a_user_message",
            SessionError::Tree(TreeError::MalformedSnapshot(_)) => "malformed_snapshot",
            SessionError::Tree(TreeError::DanglingSelection { .. }) => "dangling_selection",
            SessionError::Gateway(ClientError::Auth { .. }) => "gateway_auth",
            SessionError::Gateway(ClientError::Transient { .. }) => "gateway_transient",
            SessionError::Gateway(_) => "gateway",
            SessionError::NoAssistantToRegenerate => "no_assistant_to_regenerate",
            SessionError::State(_) => "request_in_flight",
            SessionError::SnapshotNotFound(_) => "snapshot_not_found",
            SessionError::Serialization(_) => "malformed_snapshot",
            SessionError::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, SessionError>;
