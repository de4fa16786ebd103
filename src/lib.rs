//! Helmsman - local, human-in-the-loop agent orchestrator
//!
//! A user supplies a project goal; Helmsman drives an iterative
//! conversation with an LLM planner to refine scope, produces an
//! approvable structured plan, and dispatches the plan's tasks to an
//! executor backend. The user keeps architectural control: plan adoption
//! and (optionally) execution start and retries require explicit
//! approvals.
//!
//! # Architecture
//!
//! The core is a single-writer reducer:
//!
//! - [`machine`] - pure `transit(state, intent, now)` transition function
//! - [`planning`] - planner output normalization and readiness decision
//! - [`dispatch`] - ordered effect execution against the backends
//! - [`orchestrator`] - the façade that owns state and serializes intents
//!
//! Around it sit the collaborators: [`store`] (persistence), [`llm`] and
//! [`agents`] (planner/executor backends), [`prompts`] (templates),
//! [`tui`] (read-only dashboard), and [`cli`]/[`config`] wiring.
//!
//! State is durably written before any effect runs, so a restart replays
//! cleanly: outstanding tasks stay put until an explicit `agent_result`
//! re-enters the machine.

pub mod agents;
pub mod cli;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod llm;
pub mod machine;
pub mod orchestrator;
pub mod planning;
pub mod prompts;
pub mod store;
pub mod tui;

pub use config::{Config, PlannerMode};
pub use dispatch::{ApprovalSink, Dispatcher, LogApprovalSink};
pub use domain::{
    AgentResult, AgentTask, ApprovalKind, ApprovalRequest, ClarificationRecord, DiscussionEntry,
    ExecutionState, Phase, PlanSnapshot, ProjectContext, ProjectState, Settings,
};
pub use machine::{Effect, Intent, MachineError, Transition, transit};
pub use orchestrator::{Orchestrator, StateTransitionResult};
pub use planning::{NormalizeError, PlanningOutput};
pub use store::{JsonFileStore, MemoryStore, ProjectStore, StoreError};
