//! Approval requests
//!
//! Approvals are user gates. Each is consumed exactly once; consuming an
//! approval removes it from the project state.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

use super::id::derived_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalKind {
    Plan,
    ExecutionStart,
    ExecutionRetry,
}

impl std::fmt::Display for ApprovalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Plan => write!(f, "plan"),
            Self::ExecutionStart => write!(f, "execution_start"),
            Self::ExecutionRetry => write!(f, "execution_retry"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalRequest {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: ApprovalKind,
    pub requested_at: String,
    pub details: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_ids: Option<Vec<String>>,
}

impl ApprovalRequest {
    pub fn new(
        kind: ApprovalKind,
        details: Value,
        plan_id: Option<String>,
        task_ids: Option<Vec<String>>,
        now: &str,
    ) -> Self {
        let id = derived_id(
            "approval",
            &json!({
                "type": kind.to_string(),
                "requestedAt": now,
                "details": &details,
                "planId": &plan_id,
                "taskIds": &task_ids,
            }),
        );
        Self {
            id,
            kind,
            requested_at: now.to_string(),
            details,
            plan_id,
            task_ids,
        }
    }

    /// Approval for adopting a plan.
    pub fn plan(plan_id: &str, task_count: usize, now: &str) -> Self {
        Self::new(
            ApprovalKind::Plan,
            json!({ "planId": plan_id, "taskCount": task_count }),
            Some(plan_id.to_string()),
            None,
            now,
        )
    }

    /// Approval gating the start of execution.
    pub fn execution_start(plan_id: &str, task_ids: Vec<String>, now: &str) -> Self {
        Self::new(
            ApprovalKind::ExecutionStart,
            json!({ "planId": plan_id, "taskCount": task_ids.len() }),
            Some(plan_id.to_string()),
            Some(task_ids),
            now,
        )
    }

    /// Approval gating a retry of failed tasks.
    pub fn execution_retry(task_ids: Vec<String>, now: &str) -> Self {
        Self::new(
            ApprovalKind::ExecutionRetry,
            json!({ "taskCount": task_ids.len() }),
            None,
            Some(task_ids),
            now,
        )
    }

    /// Approvals that gate dispatching execution tasks.
    pub fn blocks_execution(&self) -> bool {
        matches!(
            self.kind,
            ApprovalKind::ExecutionStart | ApprovalKind::ExecutionRetry
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_approval() {
        let a = ApprovalRequest::plan("plan-abc", 3, "t1");
        assert_eq!(a.kind, ApprovalKind::Plan);
        assert_eq!(a.plan_id.as_deref(), Some("plan-abc"));
        assert!(a.task_ids.is_none());
        assert!(a.id.starts_with("approval-"));
        assert!(!a.blocks_execution());
    }

    #[test]
    fn test_execution_approvals_block_dispatch() {
        let start = ApprovalRequest::execution_start("plan-abc", vec!["t1".to_string()], "t1");
        let retry = ApprovalRequest::execution_retry(vec!["t1".to_string()], "t1");
        assert!(start.blocks_execution());
        assert!(retry.blocks_execution());
    }

    #[test]
    fn test_id_deterministic_for_same_content() {
        let a = ApprovalRequest::plan("plan-abc", 3, "t1");
        let b = ApprovalRequest::plan("plan-abc", 3, "t1");
        assert_eq!(a.id, b.id);

        let c = ApprovalRequest::plan("plan-abc", 3, "t2");
        assert_ne!(a.id, c.id);
    }
}
