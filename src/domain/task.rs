//! Agent tasks and agent results
//!
//! An AgentTask is a unit of work handed to an external backend: the LLM
//! planner for `planning` tasks, the executor for `execution` tasks. The
//! backend reports back with an AgentResult, which re-enters the state
//! machine as an `agent_result` intent.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::clarification::ClarificationRecord;
use super::id::task_id;
use super::plan::TaskDef;
use super::state::ProjectContext;

/// What kind of backend a task is routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    Planning,
    Execution,
}

/// Task lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::InProgress => write!(f, "in_progress"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Which prompt mode a planning task should run in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanningStage {
    #[default]
    Clarification,
    Final,
}

/// Payload carried by a planning task.
///
/// Stored as the task's opaque `input` mapping; the planner driver
/// deserializes it back to decide between clarification and final planning.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlanningInput {
    pub stage: PlanningStage,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<ProjectContext>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clarifications: Vec<ClarificationRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// A unit of work dispatched to an agent backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentTask {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub status: TaskStatus,
    /// Opaque backend payload.
    pub input: Value,
    pub created_at: String,
    /// Set the first time the task is handed to a backend; never changes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dispatched_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    /// Links an execution task back to its ExecutionTaskDef in the plan.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition_id: Option<String>,
}

impl AgentTask {
    /// Synthesize a planning task.
    pub fn planning(input: &PlanningInput, now: &str) -> Self {
        Self {
            id: task_id(),
            kind: TaskKind::Planning,
            status: TaskStatus::Pending,
            input: serde_json::to_value(input).unwrap_or(Value::Null),
            created_at: now.to_string(),
            dispatched_at: None,
            plan_id: None,
            definition_id: None,
        }
    }

    /// Synthesize an execution task from a plan's task definition.
    pub fn execution(def: &TaskDef, plan_id: &str, now: &str) -> Self {
        Self {
            id: task_id(),
            kind: TaskKind::Execution,
            status: TaskStatus::Pending,
            input: serde_json::to_value(def).unwrap_or(Value::Null),
            created_at: now.to_string(),
            dispatched_at: None,
            plan_id: Some(plan_id.to_string()),
            definition_id: Some(def.id.clone()),
        }
    }

    /// Mark the task as handed to its backend.
    ///
    /// `dispatchedAt` is write-once: a retried task keeps the timestamp of
    /// its first dispatch.
    pub fn mark_dispatched(&mut self, now: &str) {
        self.status = TaskStatus::InProgress;
        self.dispatched_at.get_or_insert_with(|| now.to_string());
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, TaskStatus::Completed | TaskStatus::Failed)
    }
}

/// Outcome status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultStatus {
    Success,
    Failure,
}

/// Completion report from an agent backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentResult {
    pub task_id: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AgentResult {
    pub fn success(task_id: impl Into<String>, output: Value) -> Self {
        Self {
            task_id: task_id.into(),
            status: ResultStatus::Success,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(task_id: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            task_id: task_id.into(),
            status: ResultStatus::Failure,
            output: None,
            error: Some(error.into()),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == ResultStatus::Success
    }
}
