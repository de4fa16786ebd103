//! Discussion log entries
//!
//! The discussion is an append-only timeline. Ids are deterministic by
//! content including the timestamp, so repeated identical appends only
//! duplicate when they genuinely are distinct events.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::id::derived_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiscussionKind {
    Clarification,
    Plan,
    Execution,
    System,
}

impl std::fmt::Display for DiscussionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Clarification => write!(f, "clarification"),
            Self::Plan => write!(f, "plan"),
            Self::Execution => write!(f, "execution"),
            Self::System => write!(f, "system"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscussionEntry {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: DiscussionKind,
    pub message: String,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

impl DiscussionEntry {
    pub fn new(kind: DiscussionKind, message: impl Into<String>, now: &str) -> Self {
        Self::with_metadata(kind, message, None, now)
    }

    pub fn with_metadata(
        kind: DiscussionKind,
        message: impl Into<String>,
        metadata: Option<Value>,
        now: &str,
    ) -> Self {
        let message = message.into();
        let id = derived_id(
            "discussion",
            &json!({
                "type": kind.to_string(),
                "message": &message,
                "timestamp": now,
                "metadata": &metadata,
            }),
        );
        Self {
            id,
            kind,
            message,
            timestamp: now.to_string(),
            metadata,
        }
    }

    /// Fold a planner-provided discussion item into an entry.
    ///
    /// The planner may return either a bare string or an object with
    /// `type`/`message`/`metadata`; unknown types fall back to `system`.
    pub fn from_planner_value(value: &Value, now: &str) -> Option<Self> {
        if let Some(text) = value.as_str() {
            let text = text.trim();
            if text.is_empty() {
                return None;
            }
            return Some(Self::new(DiscussionKind::Plan, text, now));
        }

        let message = value.get("message")?.as_str()?.trim().to_string();
        if message.is_empty() {
            return None;
        }
        let kind = match value.get("type").and_then(Value::as_str) {
            Some("clarification") => DiscussionKind::Clarification,
            Some("plan") => DiscussionKind::Plan,
            Some("execution") => DiscussionKind::Execution,
            _ => DiscussionKind::System,
        };
        let timestamp = value
            .get("timestamp")
            .and_then(Value::as_str)
            .unwrap_or(now);
        Some(Self::with_metadata(
            kind,
            message,
            value.get("metadata").cloned(),
            timestamp,
        ))
    }
}
