//! Process executor backend
//!
//! Runs a configured shell command per task: the task envelope goes in on
//! stdin, the result envelope (or free text) comes back on stdout.

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, warn};

use crate::domain::{AgentResult, AgentTask};

use super::envelope::{TaskEnvelope, parse_executor_output};
use super::ExecutorBackend;

pub struct ProcessExecutor {
    command: String,
}

impl ProcessExecutor {
    pub fn new(command: impl Into<String>) -> Self {
        Self {
            command: command.into(),
        }
    }
}

#[async_trait]
impl ExecutorBackend for ProcessExecutor {
    async fn execute(&self, task: &AgentTask) -> AgentResult {
        let envelope = TaskEnvelope::from_task(task);
        let payload = match serde_json::to_string(&envelope) {
            Ok(payload) => payload,
            Err(e) => return AgentResult::failure(&task.id, format!("envelope encoding failed: {}", e)),
        };

        debug!(task_id = %task.id, command = %self.command, "spawning executor");
        let mut child = match Command::new("sh")
            .arg("-c")
            .arg(&self.command)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(e) => return AgentResult::failure(&task.id, format!("failed to spawn executor: {}", e)),
        };

        // A closed stdin just means the executor does not read its input;
        // the exit status decides success either way
        if let Some(mut stdin) = child.stdin.take()
            && let Err(e) = stdin.write_all(payload.as_bytes()).await
        {
            warn!(task_id = %task.id, error = %e, "executor did not consume task envelope");
        }

        let output = match child.wait_with_output().await {
            Ok(output) => output,
            Err(e) => return AgentResult::failure(&task.id, format!("executor wait failed: {}", e)),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = if stderr.trim().is_empty() {
                format!("executor exited with {}", output.status)
            } else {
                stderr.trim().to_string()
            };
            return AgentResult::failure(&task.id, reason);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_executor_output(&task.id, &stdout)
    }
}
