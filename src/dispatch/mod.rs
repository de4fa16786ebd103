//! Effect dispatcher
//!
//! Serializes the effect list produced by the state machine against the
//! external collaborators. Effects run strictly in list order, awaiting
//! each before the next, so an approval always surfaces before any task
//! dispatch that follows it. Backend failures become failed AgentResults;
//! they never reach back into state.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::agents::{ExecutorBackend, PlannerBackend};
use crate::domain::{AgentResult, ApprovalRequest, TaskKind};
use crate::machine::Effect;

/// Surface notified when a new approval is pending (the dashboard, a log).
#[async_trait]
pub trait ApprovalSink: Send + Sync {
    async fn notify(&self, approval: &ApprovalRequest);
}

/// Default sink: announce the approval in the log.
pub struct LogApprovalSink;

#[async_trait]
impl ApprovalSink for LogApprovalSink {
    async fn notify(&self, approval: &ApprovalRequest) {
        info!(
            approval_id = %approval.id,
            kind = %approval.kind,
            "approval pending"
        );
    }
}

pub struct Dispatcher {
    planner: Arc<dyn PlannerBackend>,
    executor: Arc<dyn ExecutorBackend>,
    approvals: Arc<dyn ApprovalSink>,
}

impl Dispatcher {
    pub fn new(
        planner: Arc<dyn PlannerBackend>,
        executor: Arc<dyn ExecutorBackend>,
        approvals: Arc<dyn ApprovalSink>,
    ) -> Self {
        Self {
            planner,
            executor,
            approvals,
        }
    }

    /// Execute effects in order, returning backend completions in the order
    /// they were produced. The caller feeds completions back as
    /// `agent_result` intents.
    pub async fn run(&self, effects: &[Effect]) -> Vec<AgentResult> {
        let mut completions = Vec::new();
        for effect in effects {
            match effect {
                Effect::DispatchAgentTask { task } => {
                    debug!(task_id = %task.id, kind = ?task.kind, "dispatching task");
                    let result = match task.kind {
                        TaskKind::Planning => self.planner.plan(task).await,
                        TaskKind::Execution => self.executor.execute(task).await,
                    };
                    completions.push(result);
                }
                Effect::RequestApproval { approval } => {
                    self.approvals.notify(approval).await;
                }
            }
        }
        completions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agents::mock::{MockExecutor, MockPlanner};
    use crate::domain::{AgentTask, PlanningInput};
    use serde_json::json;
    use std::sync::Mutex;

    struct RecordingSink {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ApprovalSink for RecordingSink {
        async fn notify(&self, approval: &ApprovalRequest) {
            if let Ok(mut seen) = self.seen.lock() {
                seen.push(approval.id.clone());
            }
        }
    }

    #[tokio::test]
    async fn test_effects_run_in_order() {
        let planner = Arc::new(MockPlanner::with_outputs(vec![json!({"questions": ["Q?"]})]));
        let executor = Arc::new(MockExecutor::succeeding());
        let sink = Arc::new(RecordingSink {
            seen: Mutex::new(Vec::new()),
        });
        let dispatcher = Dispatcher::new(planner, executor, sink.clone());

        let task = AgentTask::planning(&PlanningInput::default(), "t1");
        let approval = ApprovalRequest::plan("plan-x", 1, "t1");
        let effects = vec![
            Effect::approval(approval.clone()),
            Effect::dispatch(task.clone()),
        ];

        let completions = dispatcher.run(&effects).await;

        assert_eq!(completions.len(), 1);
        assert_eq!(completions[0].task_id, task.id);
        assert_eq!(sink.seen.lock().unwrap().as_slice(), &[approval.id.clone()]);
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_failed_completion() {
        // Exhausted script: planner reports failure instead of raising
        let planner = Arc::new(MockPlanner::with_outputs(vec![]));
        let executor = Arc::new(MockExecutor::succeeding());
        let dispatcher = Dispatcher::new(planner, executor, Arc::new(LogApprovalSink));

        let task = AgentTask::planning(&PlanningInput::default(), "t1");
        let completions = dispatcher.run(&[Effect::dispatch(task)]).await;

        assert_eq!(completions.len(), 1);
        assert!(!completions[0].is_success());
    }
}
