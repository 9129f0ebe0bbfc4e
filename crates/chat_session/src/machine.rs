//! Session state machine
//!
//! One conversation is either idle or waiting for a single outstanding
//! completion. A new request is never issued while another is in flight;
//! failures return to idle.

use serde::Serialize;
use thiserror::Error;

/// Lifecycle states of a chat session.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Awaiting user input.
    Idle,
    /// A completion request is outstanding.
    AwaitingReply,
}

#[derive(Error, Debug, Clone)]
pub enum TransitionError {
    #[error("A completion request is already in flight")]
    RequestInFlight,
}

/// Guard enforcing the Idle -> AwaitingReply -> Idle cycle.
#[derive(Debug, Clone)]
pub struct SessionStateMachine {
    state: SessionState,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_idle(&self) -> bool {
        self.state == SessionState::Idle
    }

    /// Enter AwaitingReply; fails if a request is already outstanding.
    pub fn begin_request(&mut self) -> Result<(), TransitionError> {
        if self.state == SessionState::AwaitingReply {
            return Err(TransitionError::RequestInFlight);
        }
        self.state = SessionState::AwaitingReply;
        Ok(())
    }

    /// Return to Idle, whatever the request's outcome was.
    pub fn finish_request(&mut self) {
        self.state = SessionState::Idle;
    }
}
