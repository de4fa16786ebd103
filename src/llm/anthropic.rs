//! Anthropic Messages API client

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::LlmConfig;

use super::client::LlmClient;
use super::error::LlmError;
use super::types::{CompletionRequest, CompletionResponse, Role, StopReason, TokenUsage};

const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl AnthropicClient {
    /// Build a client from config; the API key is read from the environment
    /// variable named there and never logged.
    pub fn from_config(config: &LlmConfig) -> Result<Self, LlmError> {
        let api_key = std::env::var(&config.api_key_env)
            .map_err(|_| LlmError::MissingApiKey(config.api_key_env.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            max_tokens: config.max_tokens,
        })
    }

    fn request_body(&self, request: &CompletionRequest) -> Value {
        let messages: Vec<Value> = request
            .messages
            .iter()
            .map(|m| {
                json!({
                    "role": match m.role {
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    "content": m.content,
                })
            })
            .collect();

        json!({
            "model": self.model,
            "max_tokens": request.max_tokens.min(self.max_tokens),
            "system": request.system_prompt,
            "messages": messages,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = format!("{}/v1/messages", self.base_url);
        debug!(model = %self.model, messages = request.messages.len(), "anthropic request");

        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&self.request_body(&request))
            .send()
            .await?;

        let status = response.status();
        if status.as_u16() == 429 {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(60);
            warn!(retry_after, "anthropic rate limited");
            return Err(LlmError::RateLimited {
                retry_after: Duration::from_secs(retry_after),
            });
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(LlmError::ApiError {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        parse_response(&body)
    }

    fn model(&self) -> &str {
        &self.model
    }
}

fn parse_response(body: &Value) -> Result<CompletionResponse, LlmError> {
    let content = body
        .get("content")
        .and_then(Value::as_array)
        .map(|blocks| {
            blocks
                .iter()
                .filter(|b| b.get("type").and_then(Value::as_str) == Some("text"))
                .filter_map(|b| b.get("text").and_then(Value::as_str))
                .collect::<Vec<&str>>()
                .join("")
        })
        .ok_or_else(|| LlmError::InvalidResponse("missing content array".to_string()))?;

    if content.is_empty() {
        return Err(LlmError::InvalidResponse("empty text content".to_string()));
    }

    let stop_reason = body
        .get("stop_reason")
        .and_then(Value::as_str)
        .map(StopReason::from_api)
        .unwrap_or(StopReason::EndTurn);

    let usage = TokenUsage {
        input_tokens: body
            .pointer("/usage/input_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0),
        output_tokens: body
            .pointer("/usage/output_tokens")
            .and_then(Value::as_u64)
            .unwrap_or(0),
    };

    Ok(CompletionResponse {
        content,
        stop_reason,
        usage,
    })
}
