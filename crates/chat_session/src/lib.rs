//! chat_session - The conversation controller
//!
//! `ChatSession` is the single owner of one conversation tree. It sequences
//! tree mutations with completion-gateway calls and tells the presentation
//! layer exactly which nodes to render or drop. All mutations run to
//! completion on the owning task; the gateway call is the only operation
//! that suspends.

pub mod error;
pub mod events;
pub mod machine;
pub mod manager;
pub mod storage;

// Re-exports
pub use error::{Result, SessionError};
pub use events::{NodeView, SessionEvent};
pub use machine::{SessionState, SessionStateMachine, TransitionError};
pub use manager::{ChatSession, SelectionChange};
pub use storage::{FileSnapshotStorage, SnapshotStorage};
