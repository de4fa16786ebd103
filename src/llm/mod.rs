//! LLM client layer
//!
//! A thin provider abstraction: the planner driver only needs one-shot text
//! completions.

mod anthropic;
mod client;
mod error;
pub mod mock;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::LlmError;
pub use mock::MockLlm;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use std::sync::Arc;

use crate::config::LlmConfig;

/// Create a client from config. Only the `anthropic` provider ships today.
pub fn create_client(config: &LlmConfig) -> Result<Arc<dyn LlmClient>, LlmError> {
    match config.provider.as_str() {
        "anthropic" => Ok(Arc::new(AnthropicClient::from_config(config)?)),
        other => Err(LlmError::InvalidResponse(format!(
            "Unknown LLM provider: '{}'. Supported: anthropic",
            other
        ))),
    }
}
