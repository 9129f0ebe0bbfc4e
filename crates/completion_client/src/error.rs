//! Gateway error taxonomy
//!
//! Auth/quota failures propagate immediately; only transient upstream
//! errors are eligible for retry.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Authentication or quota error (HTTP {status}): {message}")]
    Auth { status: u16, message: String },

    #[error("Transient upstream error (HTTP {status}): {message}")]
    Transient { status: u16, message: String },

    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Completion response contained no choices")]
    EmptyCompletion,

    #[error("No API key configured (set OPENAI_API_KEY or api_key in config.toml)")]
    MissingApiKey,
}

impl ClientError {
    /// Whether a bounded retry is worth attempting.
    pub fn is_transient(&self) -> bool {
        match self {
            ClientError::Transient { .. } => true,
            ClientError::Http(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
