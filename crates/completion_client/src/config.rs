use std::time::Duration;

use serde::{Deserialize, Serialize};

const CONFIG_FILE_PATH: &str = "config.toml";

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 1000;
const DEFAULT_MAX_RETRIES: u32 = 1;
const DEFAULT_RETRY_DELAY_SECS: u64 = 60;

/// Gateway client configuration, read from `config.toml` and overridden by
/// environment variables.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    pub api_key: Option<String>,
    pub api_base: Option<String>,
    pub model: Option<String>,
    pub max_tokens: Option<u32>,
    /// Additional attempts after the first, for transient failures only.
    #[serde(default)]
    pub max_retries: Option<u32>,
    /// Fixed back-off between attempts, in seconds.
    #[serde(default)]
    pub retry_delay_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        let mut config = ClientConfig {
            api_key: None,
            api_base: None,
            model: None,
            max_tokens: None,
            max_retries: None,
            retry_delay_secs: None,
        };

        if std::path::Path::new(CONFIG_FILE_PATH).exists() {
            if let Ok(content) = std::fs::read_to_string(CONFIG_FILE_PATH) {
                if let Ok(file_config) = toml::from_str::<ClientConfig>(&content) {
                    config = file_config;
                }
            }
        }

        // Override with environment variables if they exist
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            config.api_key = Some(api_key);
        }
        if let Ok(api_base) = std::env::var("API_BASE") {
            config.api_base = Some(api_base);
        }
        if let Ok(model) = std::env::var("MODEL") {
            config.model = Some(model);
        }
        config
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn max_retries(&self) -> u32 {
        self.max_retries.unwrap_or(DEFAULT_MAX_RETRIES)
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs.unwrap_or(DEFAULT_RETRY_DELAY_SECS))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig {
            api_key: None,
            api_base: None,
            model: None,
            max_tokens: None,
            max_retries: None,
            retry_delay_secs: None,
        };
        assert_eq!(config.model(), "gpt-4o");
        assert_eq!(config.max_tokens(), 1000);
        assert_eq!(config.max_retries(), 1);
        assert_eq!(config.retry_delay(), Duration::from_secs(60));
    }

    #[test]
    fn test_toml_parse() {
        let config: ClientConfig = toml::from_str(
            r#"
            api_key = "sk-test"
            model = "gpt-4o-mini"
            max_retries = 2
            retry_delay_secs = 1
            "#,
        )
        .unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.model(), "gpt-4o-mini");
        assert_eq!(config.max_retries(), 2);
        assert_eq!(config.retry_delay(), Duration::from_secs(1));
    }
}
