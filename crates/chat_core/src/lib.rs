//! chat_core - Core types for the branching conversation tree
//!
//! This crate provides the foundational types used across the chat crates:
//! - `message` - Role and message node types
//! - `tree` - ConversationTree with fork/select/prune operations
//! - `snapshot` - Persisted tree format and (de)serialization

pub mod error;
pub mod message;
pub mod snapshot;
pub mod tree;

// Re-export commonly used types
pub use error::{Result, TreeError};
pub use message::{MessageNode, NodeId, Role};
pub use snapshot::{ChatSnapshot, LoadedTree, NodeRecord};
pub use tree::ConversationTree;
