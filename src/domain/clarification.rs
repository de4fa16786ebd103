//! Clarification records
//!
//! A clarification is a planner-generated question loop that gates the
//! transition to final planning. Answers are aligned by index with their
//! questions once the record is answered.

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::id::derived_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClarificationStatus {
    Open,
    Answered,
    Resolved,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClarificationRecord {
    pub id: String,
    pub questions: Vec<String>,
    #[serde(default)]
    pub answers: Vec<String>,
    pub status: ClarificationStatus,
    pub created_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<String>,
}

impl ClarificationRecord {
    /// Open a new record. The id is content-addressed over questions and
    /// creation time, so the same questions asked at the same instant map to
    /// the same record.
    pub fn open(questions: Vec<String>, now: &str) -> Self {
        let id = derived_id(
            "clarification",
            &json!({ "questions": &questions, "createdAt": now }),
        );
        Self {
            id,
            questions,
            answers: Vec::new(),
            status: ClarificationStatus::Open,
            created_at: now.to_string(),
            resolved_at: None,
        }
    }

    /// Record the user's answers, index-aligned with the questions.
    pub fn answer(&mut self, answers: Vec<String>, now: &str) {
        self.answers = answers;
        self.status = ClarificationStatus::Answered;
        self.resolved_at = Some(now.to_string());
    }

    /// Force-resolve the record (used by `finalize_scope`).
    pub fn resolve(&mut self, now: &str) {
        if self.status != ClarificationStatus::Resolved {
            self.status = ClarificationStatus::Resolved;
            self.resolved_at.get_or_insert_with(|| now.to_string());
        }
    }

    /// Answered or resolved records count toward planning readiness.
    pub fn is_answered(&self) -> bool {
        matches!(
            self.status,
            ClarificationStatus::Answered | ClarificationStatus::Resolved
        )
    }
}
