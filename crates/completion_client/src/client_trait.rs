use async_trait::async_trait;

use crate::api::models::{ChatMessage, Completion};
use crate::error::Result;

/// The boundary the conversation controller talks to: given the linear
/// context of the active path, produce one reply.
#[async_trait]
pub trait CompletionGateway: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<Completion>;
}
