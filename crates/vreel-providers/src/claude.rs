//! Anthropic Claude messages client.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, ProviderResult};
use crate::traits::TextAnalysisProvider;

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const MAX_TOKENS: u32 = 4096;
// Low temperature keeps the JSON contract stable across runs.
const TEMPERATURE: f64 = 0.3;

/// Configuration for the Claude client.
#[derive(Debug, Clone)]
pub struct ClaudeConfig {
    pub api_key: String,
    /// Override for tests; production leaves the default.
    pub base_url: String,
    pub model: String,
    pub timeout: Duration,
}

impl ClaudeConfig {
    /// Create config from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| ProviderError::config("ANTHROPIC_API_KEY not set"))?;

        Ok(Self {
            api_key,
            base_url: std::env::var("ANTHROPIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_BASE_URL.to_string()),
            model: std::env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string()),
            timeout: Duration::from_secs(
                std::env::var("ANTHROPIC_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(120),
            ),
        })
    }
}

/// Claude messages API client.
pub struct ClaudeClient {
    http: Client,
    config: ClaudeConfig,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f64,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: String,
}

impl ClaudeClient {
    /// Create a new Claude client.
    pub fn new(config: ClaudeConfig) -> ProviderResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(ProviderError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ProviderResult<Self> {
        Self::new(ClaudeConfig::from_env()?)
    }
}

#[async_trait]
impl TextAnalysisProvider for ClaudeClient {
    async fn analyze(&self, prompt: &str) -> ProviderResult<String> {
        let url = format!("{}/v1/messages", self.config.base_url);
        debug!(model = %self.config.model, "Sending analysis prompt");

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ProviderError::timeout(format!("Claude request timed out: {}", e))
                } else {
                    ProviderError::Network(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::from_status(status, body));
        }

        let messages: MessagesResponse = response.json().await.map_err(|e| {
            ProviderError::invalid_response(format!("Failed to parse Claude response: {}", e))
        })?;

        let text: String = messages
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .map(|block| block.text.as_str())
            .collect();

        if text.is_empty() {
            return Err(ProviderError::invalid_response(
                "No text content in Claude response",
            ));
        }

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_text_extraction() {
        let raw = r#"{
            "content": [
                {"type": "text", "text": "part one "},
                {"type": "tool_use", "id": "x"},
                {"type": "text", "text": "part two"}
            ]
        }"#;
        let parsed: MessagesResponse = serde_json::from_str(raw).unwrap();
        let text: String = parsed
            .content
            .iter()
            .filter(|b| b.block_type == "text")
            .map(|b| b.text.as_str())
            .collect();
        assert_eq!(text, "part one part two");
    }

    #[test]
    fn test_request_shape() {
        let request = MessagesRequest {
            model: DEFAULT_MODEL,
            max_tokens: MAX_TOKENS,
            temperature: TEMPERATURE,
            messages: vec![Message {
                role: "user",
                content: "hello",
            }],
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["model"], DEFAULT_MODEL);
        assert_eq!(value["max_tokens"], 4096);
        assert_eq!(value["messages"][0]["role"], "user");
    }
}
