//! Structural error types for the conversation tree

use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum TreeError {
    #[error("Invalid role: {0}")]
    InvalidRole(String),

    #[error("Branch index {index} out of range (fork has {len} children)")]
    BranchIndexOutOfRange { index: usize, len: usize },

    #[error("Node not found: {0}")]
    NodeNotFound(Uuid),

    #[error("Node {0} is not a user message and cannot be edited")]
    NotAUserMessage(Uuid),

    #[error("Malformed snapshot: {0}")]
    MalformedSnapshot(String),

    #[error("Selected child {selected} is not a child of node {node}")]
    DanglingSelection { node: Uuid, selected: Uuid },
}

pub type Result<T> = std::result::Result<T, TreeError>;
