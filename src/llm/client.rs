//! LLM client trait

use async_trait::async_trait;

use super::error::LlmError;
use super::types::{CompletionRequest, CompletionResponse};

/// A provider that can answer one completion request.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model identifier, for logging.
    fn model(&self) -> &str;
}
