//! Project state root aggregate
//!
//! Exactly one ProjectState lives per store. The orchestrator façade is its
//! single writer; everything else works on detached copies.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::approval::ApprovalRequest;
use super::clarification::ClarificationRecord;
use super::discussion::DiscussionEntry;
use super::execution::ExecutionState;
use super::plan::PlanSnapshot;
use super::task::{AgentTask, TaskKind, TaskStatus};

/// Project lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    Planning,
    AwaitingClarification,
    AwaitingApproval,
    AwaitingExecutionApproval,
    Executing,
    Paused,
    Completed,
    Error,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Planning => write!(f, "planning"),
            Self::AwaitingClarification => write!(f, "awaiting_clarification"),
            Self::AwaitingApproval => write!(f, "awaiting_approval"),
            Self::AwaitingExecutionApproval => write!(f, "awaiting_execution_approval"),
            Self::Executing => write!(f, "executing"),
            Self::Paused => write!(f, "paused"),
            Self::Completed => write!(f, "completed"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Structured project context supplied at creation or gathered later.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProjectContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icp: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub tech_stack: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub constraints: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub core_features: Vec<String>,
}

/// Per-project approval gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub require_execution_approval: bool,
    pub require_retry_approval: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            require_execution_approval: false,
            require_retry_approval: true,
        }
    }
}

/// One accepted intent, recorded in the history log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransitionRecord {
    pub timestamp: String,
    pub intent_type: String,
    pub from: Phase,
    pub to: Phase,
}

/// The root aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectState {
    pub project_id: String,
    pub phase: Phase,
    pub version: u64,
    pub updated_at: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<ProjectContext>,
    #[serde(default)]
    pub plans: BTreeMap<String, PlanSnapshot>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_plan_id: Option<String>,
    #[serde(default)]
    pub pending_tasks: Vec<AgentTask>,
    #[serde(default)]
    pub approvals: Vec<ApprovalRequest>,
    #[serde(default)]
    pub clarifications: Vec<ClarificationRecord>,
    #[serde(default)]
    pub discussion: Vec<DiscussionEntry>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution: Option<ExecutionState>,
    #[serde(default)]
    pub settings: Settings,
    #[serde(default)]
    pub history: Vec<TransitionRecord>,
}

impl ProjectState {
    /// Bootstrap a fresh project in phase `idle`.
    pub fn new(
        project_id: impl Into<String>,
        goal: Option<String>,
        context: Option<ProjectContext>,
        settings: Settings,
        now: &str,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            phase: Phase::Idle,
            version: 0,
            updated_at: now.to_string(),
            goal,
            context,
            plans: BTreeMap::new(),
            current_plan_id: None,
            pending_tasks: Vec::new(),
            approvals: Vec::new(),
            clarifications: Vec::new(),
            discussion: Vec::new(),
            execution: None,
            settings,
            history: Vec::new(),
        }
    }

    pub fn task(&self, id: &str) -> Option<&AgentTask> {
        self.pending_tasks.iter().find(|t| t.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut AgentTask> {
        self.pending_tasks.iter_mut().find(|t| t.id == id)
    }

    pub fn approval(&self, id: &str) -> Option<&ApprovalRequest> {
        self.approvals.iter().find(|a| a.id == id)
    }

    /// Consume an approval: removes it from the list and returns it.
    pub fn take_approval(&mut self, id: &str) -> Option<ApprovalRequest> {
        let idx = self.approvals.iter().position(|a| a.id == id)?;
        Some(self.approvals.remove(idx))
    }

    /// Any execution-gating approval still outstanding?
    pub fn has_pending_execution_approval(&self) -> bool {
        self.approvals.iter().any(|a| a.blocks_execution())
    }

    pub fn clarification_mut(&mut self, id: &str) -> Option<&mut ClarificationRecord> {
        self.clarifications.iter_mut().find(|c| c.id == id)
    }

    /// Clarifications whose answers count toward readiness.
    pub fn answered_clarifications(&self) -> Vec<ClarificationRecord> {
        self.clarifications
            .iter()
            .filter(|c| c.is_answered())
            .cloned()
            .collect()
    }

    pub fn execution_tasks(&self) -> impl Iterator<Item = &AgentTask> {
        self.pending_tasks
            .iter()
            .filter(|t| t.kind == TaskKind::Execution)
    }

    /// Pending execution tasks (candidates for `run_tasks`).
    pub fn pending_execution_task_ids(&self) -> Vec<String> {
        self.execution_tasks()
            .filter(|t| t.status == TaskStatus::Pending)
            .map(|t| t.id.clone())
            .collect()
    }

    /// Failed execution tasks, optionally filtered by an id list.
    pub fn failed_execution_task_ids(&self, filter: Option<&[String]>) -> Vec<String> {
        self.execution_tasks()
            .filter(|t| t.status == TaskStatus::Failed)
            .filter(|t| filter.is_none_or(|ids| ids.contains(&t.id)))
            .map(|t| t.id.clone())
            .collect()
    }

    /// Rebuild the derived execution view from tasks and existing results.
    pub fn recompute_execution(&mut self) {
        let results = self
            .execution
            .take()
            .map(|e| e.results)
            .unwrap_or_default();
        self.execution = Some(ExecutionState::recompute(&self.pending_tasks, results));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::task::PlanningInput;

    #[test]
    fn test_new_project_is_idle_at_version_zero() {
        let state = ProjectState::new("p1", Some("build X".to_string()), None, Settings::default(), "t1");
        assert_eq!(state.phase, Phase::Idle);
        assert_eq!(state.version, 0);
        assert!(state.history.is_empty());
        assert!(state.settings.require_retry_approval);
        assert!(!state.settings.require_execution_approval);
    }

    #[test]
    fn test_take_approval_consumes_once() {
        let mut state = ProjectState::new("p1", None, None, Settings::default(), "t1");
        state
            .approvals
            .push(ApprovalRequest::plan("plan-x", 1, "t1"));
        let id = state.approvals[0].id.clone();

        let taken = state.take_approval(&id);
        assert!(taken.is_some());
        assert!(state.take_approval(&id).is_none());
        assert!(state.approvals.is_empty());
    }

    #[test]
    fn test_pending_execution_approval_detection() {
        let mut state = ProjectState::new("p1", None, None, Settings::default(), "t1");
        assert!(!state.has_pending_execution_approval());

        state
            .approvals
            .push(ApprovalRequest::plan("plan-x", 1, "t1"));
        assert!(!state.has_pending_execution_approval());

        state
            .approvals
            .push(ApprovalRequest::execution_start("plan-x", vec![], "t1"));
        assert!(state.has_pending_execution_approval());
    }

    #[test]
    fn test_state_round_trips_through_json() {
        let mut state = ProjectState::new("p1", Some("goal".to_string()), None, Settings::default(), "t1");
        state
            .pending_tasks
            .push(AgentTask::planning(&PlanningInput::default(), "t1"));
        state
            .clarifications
            .push(ClarificationRecord::open(vec!["Q?".to_string()], "t1"));
        state.recompute_execution();

        let json = serde_json::to_string(&state).unwrap();
        let loaded: ProjectState = serde_json::from_str(&json).unwrap();
        assert_eq!(state, loaded);
    }

    #[test]
    fn test_persisted_field_names_are_camel_case() {
        let state = ProjectState::new("p1", None, None, Settings::default(), "t1");
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("projectId").is_some());
        assert!(json.get("updatedAt").is_some());
        assert!(json.get("pendingTasks").is_some());
        assert_eq!(json["settings"]["requireRetryApproval"], true);
    }
}
