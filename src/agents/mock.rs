//! Scripted backends for tests

use std::collections::HashSet;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::{Value, json};

use crate::domain::{AgentResult, AgentTask};

use super::{ExecutorBackend, PlannerBackend};

/// Planner that replays scripted outputs in order.
pub struct MockPlanner {
    outputs: Mutex<VecDeque<Value>>,
}

impl MockPlanner {
    pub fn with_outputs(outputs: Vec<Value>) -> Self {
        Self {
            outputs: Mutex::new(outputs.into_iter().collect()),
        }
    }
}

#[async_trait]
impl PlannerBackend for MockPlanner {
    async fn plan(&self, task: &AgentTask) -> AgentResult {
        let next = self.outputs.lock().ok().and_then(|mut q| q.pop_front());
        match next {
            Some(output) => AgentResult::success(&task.id, output),
            None => AgentResult::failure(&task.id, "mock planner script exhausted"),
        }
    }
}

/// Executor that succeeds unless the task title is in the failure set.
pub struct MockExecutor {
    fail_titles: HashSet<String>,
}

impl MockExecutor {
    pub fn succeeding() -> Self {
        Self {
            fail_titles: HashSet::new(),
        }
    }

    pub fn failing_titles(titles: &[&str]) -> Self {
        Self {
            fail_titles: titles.iter().map(|t| t.to_string()).collect(),
        }
    }
}

#[async_trait]
impl ExecutorBackend for MockExecutor {
    async fn execute(&self, task: &AgentTask) -> AgentResult {
        let title = task
            .input
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if self.fail_titles.contains(title) {
            AgentResult::failure(&task.id, format!("{} failed", title))
        } else {
            AgentResult::success(&task.id, json!({ "artifacts": [format!("{} done", title)] }))
        }
    }
}
