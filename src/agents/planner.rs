//! LLM planner driver
//!
//! Renders the stage-appropriate prompt, calls the model, and validates the
//! response. A response that fails validation earns exactly one retry with
//! the strict-JSON reminder appended; a second failure is reported as a
//! failed result and the machine takes it from there.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::PlannerMode;
use crate::domain::{AgentResult, AgentTask, PlanningInput};
use crate::llm::{CompletionRequest, LlmClient, Message};
use crate::planning::{self, normalizer};
use crate::prompts::{CLARIFY_CHECKLIST, CLARIFY_CONVERSATION, PLAN_FINAL, PromptLoader};

use super::PlannerBackend;

pub struct LlmPlanner {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    mode: PlannerMode,
    max_tokens: u32,
}

enum AttemptError {
    /// Transport or provider problem; a stricter prompt will not help.
    Llm(String),
    /// The model answered but the answer did not validate.
    Parse(String),
}

impl LlmPlanner {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        prompts: Arc<PromptLoader>,
        mode: PlannerMode,
        max_tokens: u32,
    ) -> Self {
        Self {
            llm,
            prompts,
            mode,
            max_tokens,
        }
    }

    fn template_for(&self, input: &PlanningInput) -> &'static str {
        if planning::is_ready(input) {
            PLAN_FINAL
        } else {
            match self.mode {
                PlannerMode::Conversation => CLARIFY_CONVERSATION,
                PlannerMode::Checklist => CLARIFY_CHECKLIST,
            }
        }
    }

    async fn attempt(&self, system_prompt: &str) -> Result<Value, AttemptError> {
        let request = CompletionRequest {
            system_prompt: system_prompt.to_string(),
            messages: vec![Message::user("Respond now with the JSON object.")],
            max_tokens: self.max_tokens,
        };
        let response = self
            .llm
            .complete(request)
            .await
            .map_err(|e| AttemptError::Llm(e.to_string()))?;

        let value = normalizer::extract_json(&response.content)
            .map_err(|e| AttemptError::Parse(e.to_string()))?;
        normalizer::parse(&value).map_err(|e| AttemptError::Parse(e.to_string()))?;
        Ok(value)
    }
}

#[async_trait]
impl PlannerBackend for LlmPlanner {
    async fn plan(&self, task: &AgentTask) -> AgentResult {
        let input: PlanningInput = match serde_json::from_value(task.input.clone()) {
            Ok(input) => input,
            Err(e) => {
                return AgentResult::failure(&task.id, format!("malformed planning input: {}", e));
            }
        };

        let template = self.template_for(&input);
        let ctx = planning::prompt_context(&input);
        let prompt = match self.prompts.render(template, &ctx) {
            Ok(prompt) => prompt,
            Err(e) => return AgentResult::failure(&task.id, format!("prompt render failed: {}", e)),
        };

        debug!(task_id = %task.id, template, model = self.llm.model(), "planner call");
        match self.attempt(&prompt).await {
            Ok(value) => AgentResult::success(&task.id, value),
            Err(AttemptError::Llm(e)) => {
                warn!(task_id = %task.id, error = %e, "planner transport failed");
                AgentResult::failure(&task.id, e)
            }
            Err(AttemptError::Parse(first)) => {
                warn!(task_id = %task.id, error = %first, "planner output invalid; retrying with strict prompt");
                let reminder = self.prompts.strict_json_reminder().unwrap_or_default();
                let strict_prompt = format!("{}{}", prompt, reminder);
                match self.attempt(&strict_prompt).await {
                    Ok(value) => AgentResult::success(&task.id, value),
                    Err(AttemptError::Llm(e)) => AgentResult::failure(&task.id, e),
                    Err(AttemptError::Parse(second)) => AgentResult::failure(&task.id, second),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{PlanningStage, ProjectContext};
    use crate::llm::MockLlm;
    use serde_json::json;

    fn ready_input() -> PlanningInput {
        PlanningInput {
            stage: PlanningStage::Clarification,
            goal: Some("build X".to_string()),
            context: Some(ProjectContext {
                icp: Some("SMB".to_string()),
                tech_stack: vec!["rust".to_string()],
                constraints: vec!["OSS".to_string()],
                core_features: vec!["auth".to_string()],
            }),
            clarifications: Vec::new(),
            note: None,
        }
    }

    fn planner_with(responses: Vec<&str>) -> (Arc<MockLlm>, LlmPlanner) {
        let llm = Arc::new(MockLlm::new(responses));
        let prompts = Arc::new(PromptLoader::new(None).unwrap());
        let planner = LlmPlanner::new(llm.clone(), prompts, PlannerMode::Conversation, 4096);
        (llm, planner)
    }

    fn valid_plan_json() -> String {
        json!({
            "plan": {
                "roadmap": [{"title": "M1"}],
                "features": [{"title": "F1"}],
                "tasks": [{"title": "T1", "role": "backend"}]
            }
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_ready_input_uses_final_prompt() {
        let plan = valid_plan_json();
        let (llm, planner) = planner_with(vec![plan.as_str()]);
        let task = AgentTask::planning(&ready_input(), "t1");

        let result = planner.plan(&task).await;
        assert!(result.is_success());
        assert!(result.output.unwrap().get("plan").is_some());

        let requests = llm.seen_requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system_prompt.contains("final execution plan"));
    }

    #[tokio::test]
    async fn test_unready_input_uses_clarification_prompt() {
        let questions = json!({"questions": ["Who is the target user?"]}).to_string();
        let (llm, planner) = planner_with(vec![questions.as_str()]);
        let input = PlanningInput {
            goal: Some("build X".to_string()),
            ..Default::default()
        };
        let task = AgentTask::planning(&input, "t1");

        let result = planner.plan(&task).await;
        assert!(result.is_success());

        let requests = llm.seen_requests();
        assert!(requests[0].system_prompt.contains("not yet ready for a final plan"));
    }

    #[tokio::test]
    async fn test_invalid_output_retries_with_reminder() {
        let plan = valid_plan_json();
        let (llm, planner) = planner_with(vec!["garbage", plan.as_str()]);
        let task = AgentTask::planning(&ready_input(), "t1");

        let result = planner.plan(&task).await;
        assert!(result.is_success());

        let requests = llm.seen_requests();
        assert_eq!(requests.len(), 2);
        assert!(requests[1].system_prompt.contains("could not be parsed"));
        assert!(requests[1].system_prompt.starts_with(&requests[0].system_prompt));
    }

    #[tokio::test]
    async fn test_second_failure_reports_failure() {
        let (llm, planner) = planner_with(vec!["garbage", "still garbage"]);
        let task = AgentTask::planning(&ready_input(), "t1");

        let result = planner.plan(&task).await;
        assert!(!result.is_success());
        assert_eq!(
            result.error.as_deref(),
            Some("No valid JSON object found in response")
        );
        assert_eq!(llm.seen_requests().len(), 2);
    }

    #[tokio::test]
    async fn test_transport_error_does_not_retry() {
        // Empty script: the mock errors on the first call
        let (llm, planner) = planner_with(vec![]);
        let task = AgentTask::planning(&ready_input(), "t1");

        let result = planner.plan(&task).await;
        assert!(!result.is_success());
        assert_eq!(llm.seen_requests().len(), 1);
    }

    #[tokio::test]
    async fn test_structurally_invalid_output_also_retries() {
        // Parses as JSON but fails strict validation (two questions)
        let bad = json!({"questions": ["One?", "Two?"]}).to_string();
        let good = json!({"questions": ["One?"]}).to_string();
        let (llm, planner) = planner_with(vec![bad.as_str(), good.as_str()]);
        let input = PlanningInput::default();
        let task = AgentTask::planning(&input, "t1");

        let result = planner.plan(&task).await;
        assert!(result.is_success());
        assert_eq!(llm.seen_requests().len(), 2);
    }
}
