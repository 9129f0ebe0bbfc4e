//! completion_client - The completion gateway boundary
//!
//! Defines the `CompletionGateway` trait the controller talks to, plus an
//! OpenAI-compatible HTTP implementation with bounded retry for transient
//! upstream failures.

pub mod api;
pub mod client_trait;
pub mod config;
pub mod error;

pub use api::client::OpenAiClient;
pub use api::models::{ChatMessage, Completion, TokenUsage};
pub use client_trait::CompletionGateway;
pub use config::ClientConfig;
pub use error::{ClientError, Result};
