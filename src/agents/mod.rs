//! Agent backends
//!
//! The dispatcher routes planning tasks to a [`PlannerBackend`] and
//! execution tasks to an [`ExecutorBackend`]. Backends never touch project
//! state: they take a detached task and report an AgentResult, which
//! re-enters the machine as an `agent_result` intent. Backend failures are
//! encoded in the result, not raised.

mod envelope;
mod executor;
pub mod mock;
mod planner;

pub use envelope::{ResultEnvelope, TaskEnvelope, parse_executor_output};
pub use executor::ProcessExecutor;
pub use planner::LlmPlanner;

use async_trait::async_trait;

use crate::domain::{AgentResult, AgentTask};

/// Backend that runs planning tasks (the LLM planner).
#[async_trait]
pub trait PlannerBackend: Send + Sync {
    async fn plan(&self, task: &AgentTask) -> AgentResult;
}

/// Backend that runs execution tasks.
#[async_trait]
pub trait ExecutorBackend: Send + Sync {
    async fn execute(&self, task: &AgentTask) -> AgentResult;
}
