//! Scripted LLM client for tests

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::LlmClient;
use super::error::LlmError;
use super::types::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};

/// Returns scripted responses in order; errors once the script runs out.
pub struct MockLlm {
    responses: Mutex<VecDeque<String>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockLlm {
    pub fn new(responses: Vec<&str>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(String::from).collect()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Requests seen so far (for asserting on rendered prompts).
    pub fn seen_requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for MockLlm {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Ok(mut seen) = self.requests.lock() {
            seen.push(request);
        }
        let next = self
            .responses
            .lock()
            .ok()
            .and_then(|mut q| q.pop_front())
            .ok_or_else(|| LlmError::InvalidResponse("mock script exhausted".to_string()))?;

        Ok(CompletionResponse {
            content: next,
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }

    fn model(&self) -> &str {
        "mock"
    }
}
