use std::time::Duration;

use async_trait::async_trait;
use log::{debug, info, warn};
use reqwest::{Client, StatusCode};

use crate::api::models::{ChatCompletionRequest, ChatCompletionResponse, ChatMessage, Completion};
use crate::client_trait::CompletionGateway;
use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TEMPERATURE: f32 = 0.5;

/// OpenAI-compatible, non-streaming chat completions client.
///
/// Transient upstream failures (5xx, timeouts) are retried a bounded number
/// of times with a fixed back-off; auth and quota failures (401/403/429)
/// propagate immediately.
pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    max_retries: u32,
    retry_delay: Duration,
}

impl OpenAiClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let api_key = config.api_key.clone().ok_or(ClientError::MissingApiKey)?;
        Ok(Self {
            client: Client::new(),
            api_key,
            base_url: config
                .api_base
                .clone()
                .unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            max_retries: config.max_retries(),
            retry_delay: config.retry_delay(),
        })
    }

    pub fn with_retry(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    async fn send_once(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<Completion> {
        let request = ChatCompletionRequest {
            model,
            messages,
            max_tokens,
            temperature: DEFAULT_TEMPERATURE,
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(classify_status(status, message));
        }

        let body: ChatCompletionResponse = response.json().await?;
        let content = body
            .choices
            .first()
            .and_then(|choice| choice.message.content.as_deref())
            .ok_or(ClientError::EmptyCompletion)?
            .trim()
            .to_string();

        debug!(
            "completion: {} prompt tokens, {} completion tokens",
            body.usage.prompt_tokens, body.usage.completion_tokens
        );
        Ok(Completion {
            content,
            usage: body.usage,
        })
    }
}

fn classify_status(status: StatusCode, message: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN | StatusCode::TOO_MANY_REQUESTS => {
            ClientError::Auth {
                status: status.as_u16(),
                message,
            }
        }
        status if status.is_server_error() => ClientError::Transient {
            status: status.as_u16(),
            message,
        },
        status => ClientError::Api {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl CompletionGateway for OpenAiClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &str,
        max_tokens: u32,
    ) -> Result<Completion> {
        info!(
            "requesting completion: model={model}, {} messages",
            messages.len()
        );

        // Bounded retry with a fixed delay, transient failures only.
        let mut attempt = 0;
        loop {
            match self.send_once(messages, model, max_tokens).await {
                Ok(completion) => return Ok(completion),
                Err(err) if err.is_transient() && attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        "transient completion failure (attempt {attempt}/{}): {err}; retrying in {:?}",
                        self.max_retries, self.retry_delay
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
