//! Intents accepted by the state machine

use serde::{Deserialize, Serialize};

use crate::domain::{AgentResult, ProjectContext, Settings};

/// A typed message asking the orchestrator to advance state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Intent {
    /// Bootstrap a fresh project. Only valid when no state is loaded.
    #[serde(rename_all = "camelCase")]
    CreateProject {
        project_id: String,
        goal: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<ProjectContext>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        settings: Option<Settings>,
    },

    /// Kick off a new planning round for an additional feature.
    AddFeature { description: String },

    /// Out-of-band clarification request (the planner path goes through
    /// `agent_result`).
    #[serde(rename_all = "camelCase")]
    RequestClarifications {
        questions: Vec<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        discussion: Option<String>,
    },

    /// Answer an open clarification, index-aligned with its questions.
    #[serde(rename_all = "camelCase")]
    AnswerClarifications {
        clarification_id: String,
        answers: Vec<String>,
    },

    /// Close scoping and force a final planning round.
    FinalizeScope {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        note: Option<String>,
    },

    /// Adopt a proposed plan.
    #[serde(rename_all = "camelCase")]
    ApprovePlan {
        approval_id: String,
        plan_id: String,
    },

    /// Consume an execution-start or execution-retry approval.
    #[serde(rename_all = "camelCase")]
    ApproveExecution { approval_id: String },

    /// Start a fresh planning round from scratch.
    Replan {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// Dispatch pending execution tasks (all, or a subset).
    #[serde(rename_all = "camelCase")]
    RunTasks {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_ids: Option<Vec<String>>,
    },

    /// Reset failed execution tasks and dispatch them again.
    #[serde(rename_all = "camelCase")]
    RetryTasks {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        task_ids: Option<Vec<String>>,
    },

    /// Halt execution, keeping tasks where they are.
    PauseExecution {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    /// A backend completion re-entering the machine.
    AgentResult { result: AgentResult },
}

impl Intent {
    /// Wire name, recorded in TransitionRecords.
    pub fn intent_type(&self) -> &'static str {
        match self {
            Self::CreateProject { .. } => "create_project",
            Self::AddFeature { .. } => "add_feature",
            Self::RequestClarifications { .. } => "request_clarifications",
            Self::AnswerClarifications { .. } => "answer_clarifications",
            Self::FinalizeScope { .. } => "finalize_scope",
            Self::ApprovePlan { .. } => "approve_plan",
            Self::ApproveExecution { .. } => "approve_execution",
            Self::Replan { .. } => "replan",
            Self::RunTasks { .. } => "run_tasks",
            Self::RetryTasks { .. } => "retry_tasks",
            Self::PauseExecution { .. } => "pause_execution",
            Self::AgentResult { .. } => "agent_result",
        }
    }
}
