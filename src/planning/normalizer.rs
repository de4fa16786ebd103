//! Planning output normalizer
//!
//! Raw planner output arrives as free text (possibly wrapped in prose or
//! fenced code blocks) or as an already-decoded mapping. This module turns
//! it into a strict PlanningOutput: exactly one question, or a structurally
//! valid plan draft. Anything else is a typed failure — the caller decides
//! whether to retry with a stricter prompt.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

/// Why planner output could not be normalized.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("No valid JSON object found in response")]
    NoJson,

    #[error("planner output is not a JSON object")]
    NotAnObject,

    #[error("planner output must contain exactly one of `questions` or `plan`")]
    WrongShape,

    #[error("`questions` must contain exactly one non-empty question")]
    BadQuestions,

    #[error("invalid plan: {0}")]
    InvalidPlan(String),
}

/// Strictly validated planner output.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanningOutput {
    /// A single clarifying question for the user.
    Questions(Vec<String>),
    /// A structurally valid plan (raw value, ready for tolerant
    /// normalization into a snapshot).
    Plan(Value),
}

/// Parse raw planner output into a strict PlanningOutput.
pub fn parse(raw: &Value) -> Result<PlanningOutput, NormalizeError> {
    let object = match raw {
        Value::String(text) => extract_json(text)?,
        other => other.clone(),
    };
    validate(&object)
}

/// Pull a JSON object out of free text.
///
/// Tried in order: full parse when the trimmed text starts with `{`; the
/// body of the first fenced code block; the substring from the first `{` to
/// the last `}`.
pub fn extract_json(text: &str) -> Result<Value, NormalizeError> {
    let trimmed = text.trim();

    if trimmed.starts_with('{')
        && let Ok(value) = serde_json::from_str::<Value>(trimmed)
    {
        return Ok(value);
    }

    if let Some(body) = fenced_block(trimmed)
        && let Ok(value) = serde_json::from_str::<Value>(body.trim())
    {
        return Ok(value);
    }

    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}'))
        && start < end
        && let Ok(value) = serde_json::from_str::<Value>(&trimmed[start..=end])
    {
        return Ok(value);
    }

    debug!(len = text.len(), "no JSON object extracted from planner text");
    Err(NormalizeError::NoJson)
}

/// Body of the first ``` or ```json fenced block, if any.
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_fence = &text[open + 3..];
    // Skip an optional language tag on the fence line
    let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
    let body = &after_fence[body_start..];
    let close = body.find("```")?;
    Some(&body[..close])
}

fn validate(object: &Value) -> Result<PlanningOutput, NormalizeError> {
    let map = object.as_object().ok_or(NormalizeError::NotAnObject)?;

    let questions = map.get("questions");
    let plan = map.get("plan");

    match (questions, plan) {
        (Some(_), Some(_)) | (None, None) => Err(NormalizeError::WrongShape),
        (Some(q), None) => validate_questions(q),
        (None, Some(p)) => validate_plan(p).map(|()| PlanningOutput::Plan(p.clone())),
    }
}

fn validate_questions(value: &Value) -> Result<PlanningOutput, NormalizeError> {
    let items = value.as_array().ok_or(NormalizeError::BadQuestions)?;
    if items.len() != 1 {
        return Err(NormalizeError::BadQuestions);
    }
    let question = items[0]
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(NormalizeError::BadQuestions)?;
    Ok(PlanningOutput::Questions(vec![question.to_string()]))
}

fn validate_plan(plan: &Value) -> Result<(), NormalizeError> {
    let map = plan
        .as_object()
        .ok_or_else(|| NormalizeError::InvalidPlan("plan is not an object".to_string()))?;

    for (key, label) in [
        ("roadmap", "milestone"),
        ("features", "feature"),
        ("tasks", "task"),
    ] {
        let items = map
            .get(key)
            .and_then(Value::as_array)
            .ok_or_else(|| NormalizeError::InvalidPlan(format!("`{}` must be a non-empty array", key)))?;
        if items.is_empty() {
            return Err(NormalizeError::InvalidPlan(format!(
                "`{}` must contain at least one {}",
                key, label
            )));
        }
        for (i, item) in items.iter().enumerate() {
            let title_ok = item
                .get("title")
                .and_then(Value::as_str)
                .is_some_and(|t| !t.trim().is_empty());
            if !title_ok {
                return Err(NormalizeError::InvalidPlan(format!(
                    "{} {} is missing a non-empty title",
                    label,
                    i + 1
                )));
            }
        }
    }

    // Role is an open string; absence is tolerated (normalization supplies
    // the "execution" default), but a present non-string role is not.
    if let Some(tasks) = map.get("tasks").and_then(Value::as_array) {
        for (i, task) in tasks.iter().enumerate() {
            if let Some(role) = task.get("role")
                && !role.is_string()
            {
                return Err(NormalizeError::InvalidPlan(format!(
                    "task {} has a non-string role",
                    i + 1
                )));
            }
        }
    }

    Ok(())
}
