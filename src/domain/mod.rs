//! Domain types for the orchestrator
//!
//! Everything here is plain data: serde-mapped aggregates, deterministic id
//! helpers, and the derived execution view. Mutation policy lives in the
//! state machine; the orchestrator façade owns the single writable copy.

mod approval;
mod clarification;
mod discussion;
mod execution;
pub mod id;
mod plan;
mod state;
mod task;

pub use approval::{ApprovalKind, ApprovalRequest};
pub use clarification::{ClarificationRecord, ClarificationStatus};
pub use discussion::{DiscussionEntry, DiscussionKind};
pub use execution::{ExecutionState, ExecutionSummary, TaskFailure};
pub use id::{derived_id, short_hash, stable_json};
pub use plan::{Feature, Milestone, PlanSnapshot, TaskDef};
pub use state::{Phase, ProjectContext, ProjectState, Settings, TransitionRecord};
pub use task::{
    AgentResult, AgentTask, PlanningInput, PlanningStage, ResultStatus, TaskKind, TaskStatus,
};

use chrono::{DateTime, SecondsFormat, Utc};

/// Render an injected clock value as the ISO-8601 UTC string stored in state.
pub fn timestamp(now: &DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}
