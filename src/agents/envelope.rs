//! Executor wire envelopes
//!
//! Tasks go out as a JSON envelope on stdin; results come back as a JSON
//! envelope on stdout. An executor that answers in free text is treated as
//! a success whose sole artifact is the raw text.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::{AgentResult, AgentTask, ResultStatus};

/// Envelope sent to the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub task_id: String,
    pub inputs: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraints: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expected_outputs: Option<Vec<Value>>,
}

impl TaskEnvelope {
    /// Build the envelope from a task. A definition payload may carry
    /// `constraints` / `expectedOutputs`, which are lifted to the envelope.
    pub fn from_task(task: &AgentTask) -> Self {
        let payload = task.input.get("payload");
        Self {
            task_id: task.id.clone(),
            inputs: task.input.clone(),
            constraints: payload.and_then(|p| p.get("constraints")).cloned(),
            expected_outputs: payload
                .and_then(|p| p.get("expectedOutputs"))
                .and_then(Value::as_array)
                .cloned(),
        }
    }
}

/// Envelope received from the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultEnvelope {
    pub task_id: String,
    pub status: ResultStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifacts: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logs: Option<Vec<Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Interpret raw executor stdout for the given task.
///
/// The known task id wins over whatever the envelope claims, so a confused
/// executor cannot complete someone else's task.
pub fn parse_executor_output(task_id: &str, stdout: &str) -> AgentResult {
    let trimmed = stdout.trim();

    match serde_json::from_str::<ResultEnvelope>(trimmed) {
        Ok(envelope) => {
            if envelope.task_id != task_id {
                debug!(
                    claimed = %envelope.task_id,
                    actual = %task_id,
                    "executor result envelope names a different task id"
                );
            }
            match envelope.status {
                ResultStatus::Success => AgentResult::success(
                    task_id,
                    json!({
                        "artifacts": envelope.artifacts.unwrap_or_default(),
                        "logs": envelope.logs.unwrap_or_default(),
                    }),
                ),
                ResultStatus::Failure => AgentResult::failure(
                    task_id,
                    envelope.error.unwrap_or_else(|| "executor reported failure".to_string()),
                ),
            }
        }
        // Free text counts as success with the text as sole artifact
        Err(_) => AgentResult::success(task_id, json!({ "artifacts": [trimmed] })),
    }
}
