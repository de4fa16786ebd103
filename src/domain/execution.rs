//! Derived execution state
//!
//! ExecutionState is never the source of truth: on every update it is
//! recomputed from `pendingTasks` plus the result map, so inconsistencies
//! are self-healing.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::task::{AgentResult, AgentTask, TaskKind, TaskStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionSummary {
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub in_progress: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFailure {
    pub task_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ExecutionState {
    /// Results keyed by task id; only execution tasks appear here.
    pub results: BTreeMap<String, AgentResult>,
    pub summary: ExecutionSummary,
    pub failures: Vec<TaskFailure>,
}

impl ExecutionState {
    /// Rebuild the derived view from the task list and a result map.
    ///
    /// Results for tasks that no longer exist (or are not execution tasks)
    /// are dropped.
    pub fn recompute(tasks: &[AgentTask], mut results: BTreeMap<String, AgentResult>) -> Self {
        let execution_tasks: Vec<&AgentTask> =
            tasks.iter().filter(|t| t.kind == TaskKind::Execution).collect();

        results.retain(|task_id, _| execution_tasks.iter().any(|t| &t.id == task_id));

        let mut summary = ExecutionSummary {
            total: execution_tasks.len(),
            ..Default::default()
        };
        let mut failures = Vec::new();

        for task in &execution_tasks {
            match task.status {
                TaskStatus::Completed => summary.completed += 1,
                TaskStatus::Failed => {
                    summary.failed += 1;
                    let reason = results
                        .get(&task.id)
                        .and_then(|r| r.error.clone())
                        .unwrap_or_else(|| "task failed".to_string());
                    failures.push(TaskFailure {
                        task_id: task.id.clone(),
                        reason,
                    });
                }
                TaskStatus::InProgress => summary.in_progress += 1,
                TaskStatus::Pending => {}
            }
        }

        Self {
            results,
            summary,
            failures,
        }
    }

    /// All execution tasks are completed and nothing failed.
    pub fn is_complete(&self) -> bool {
        self.summary.total > 0
            && self.summary.completed == self.summary.total
            && self.summary.failed == 0
    }

    /// Failures exist and no task can still make progress.
    pub fn is_stuck(&self) -> bool {
        self.summary.failed > 0
            && self.summary.completed + self.summary.failed == self.summary.total
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::plan::TaskDef;

    fn exec_task(id: &str, status: TaskStatus) -> AgentTask {
        let def = TaskDef {
            id: format!("def-{}", id),
            title: id.to_string(),
            description: None,
            role: "backend".to_string(),
            depends_on: Vec::new(),
            payload: None,
        };
        let mut task = AgentTask::execution(&def, "plan-1", "t0");
        task.id = id.to_string();
        task.status = status;
        task
    }

    #[test]
    fn test_recompute_counts() {
        let tasks = vec![
            exec_task("a", TaskStatus::Completed),
            exec_task("b", TaskStatus::Failed),
            exec_task("c", TaskStatus::InProgress),
            exec_task("d", TaskStatus::Pending),
        ];
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), AgentResult::success("a", serde_json::json!({})));
        results.insert("b".to_string(), AgentResult::failure("b", "compile error"));

        let state = ExecutionState::recompute(&tasks, results);

        assert_eq!(state.summary.total, 4);
        assert_eq!(state.summary.completed, 1);
        assert_eq!(state.summary.failed, 1);
        assert_eq!(state.summary.in_progress, 1);
        assert_eq!(state.failures.len(), 1);
        assert_eq!(state.failures[0].reason, "compile error");
        assert!(!state.is_complete());
        assert!(!state.is_stuck());
    }

    #[test]
    fn test_stale_results_are_dropped() {
        let tasks = vec![exec_task("a", TaskStatus::Completed)];
        let mut results = BTreeMap::new();
        results.insert("a".to_string(), AgentResult::success("a", serde_json::json!({})));
        results.insert("gone".to_string(), AgentResult::failure("gone", "stale"));

        let state = ExecutionState::recompute(&tasks, results);
        assert_eq!(state.results.len(), 1);
        assert!(state.results.contains_key("a"));
    }

    #[test]
    fn test_planning_tasks_excluded() {
        let planning = AgentTask::planning(&crate::domain::task::PlanningInput::default(), "t0");
        let tasks = vec![planning, exec_task("a", TaskStatus::Completed)];

        let state = ExecutionState::recompute(&tasks, BTreeMap::new());
        assert_eq!(state.summary.total, 1);
        assert!(state.is_complete());
    }

    #[test]
    fn test_is_stuck_when_all_terminal_with_failures() {
        let tasks = vec![
            exec_task("a", TaskStatus::Completed),
            exec_task("b", TaskStatus::Failed),
        ];
        let state = ExecutionState::recompute(&tasks, BTreeMap::new());
        assert!(state.is_stuck());
        assert_eq!(state.failures[0].reason, "task failed");
    }

    #[test]
    fn test_empty_task_list_is_neither_complete_nor_stuck() {
        let state = ExecutionState::recompute(&[], BTreeMap::new());
        assert!(!state.is_complete());
        assert!(!state.is_stuck());
    }
}
