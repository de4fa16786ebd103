//! Side-effect requests produced by the state machine
//!
//! Effects carry detached copies of the data they refer to; executing them
//! never mutates project state.

use serde::{Deserialize, Serialize};

use crate::domain::{AgentTask, ApprovalRequest, TaskKind};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Effect {
    /// Hand a task to the agent backend (planner or executor).
    DispatchAgentTask { task: AgentTask },
    /// Surface a new pending approval to the user.
    RequestApproval { approval: ApprovalRequest },
}

impl Effect {
    pub fn dispatch(task: AgentTask) -> Self {
        Self::DispatchAgentTask { task }
    }

    pub fn approval(approval: ApprovalRequest) -> Self {
        Self::RequestApproval { approval }
    }

    /// True for dispatches of planning tasks (used in tests and logging).
    pub fn is_planning_dispatch(&self) -> bool {
        matches!(self, Self::DispatchAgentTask { task } if task.kind == TaskKind::Planning)
    }

    pub fn is_execution_dispatch(&self) -> bool {
        matches!(self, Self::DispatchAgentTask { task } if task.kind == TaskKind::Execution)
    }
}
