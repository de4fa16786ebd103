//! LLM request/response types
//!
//! Modeled on the Anthropic Messages API but provider-agnostic. The planner
//! only needs plain text completions, so there is no tool or streaming
//! surface here.

use serde::{Deserialize, Serialize};

/// Everything needed for one LLM call.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    /// System prompt (rendered from a Handlebars template).
    pub system_prompt: String,
    pub messages: Vec<Message>,
    pub max_tokens: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: text.into(),
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: text.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

#[derive(Debug, Clone)]
pub struct CompletionResponse {
    /// Concatenated text content.
    pub content: String,
    pub stop_reason: StopReason,
    pub usage: TokenUsage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    EndTurn,
    MaxTokens,
    StopSequence,
}

impl StopReason {
    /// Parse from the Anthropic `stop_reason` string.
    pub fn from_api(s: &str) -> Self {
        match s {
            "max_tokens" => StopReason::MaxTokens,
            "stop_sequence" => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        }
    }
}

/// Token usage for cost visibility.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokenUsage {
    pub input_tokens: u64,
    pub output_tokens: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_constructors() {
        let msg = Message::user("Hello");
        assert_eq!(msg.role, Role::User);
        assert_eq!(msg.content, "Hello");

        let msg = Message::assistant("Hi");
        assert_eq!(msg.role, Role::Assistant);
    }

    #[test]
    fn test_stop_reason_from_api() {
        assert_eq!(StopReason::from_api("end_turn"), StopReason::EndTurn);
        assert_eq!(StopReason::from_api("max_tokens"), StopReason::MaxTokens);
        assert_eq!(StopReason::from_api("stop_sequence"), StopReason::StopSequence);
        assert_eq!(StopReason::from_api("mystery"), StopReason::EndTurn);
    }
}
