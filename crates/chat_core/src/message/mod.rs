//! Message module - Roles and message nodes
//!
//! Shared message types used across the system.

mod node;
mod role;

pub use node::{MessageNode, NodeId};
pub use role::Role;
