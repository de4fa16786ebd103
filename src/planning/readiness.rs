//! Readiness decision and prompt context
//!
//! Decides whether the planner should run in clarification mode or final
//! planning mode. Final planning needs coverage of five required fields;
//! coverage can come from the structured context or from answered
//! clarifications that mention the field by keyword.

use serde::Serialize;

use crate::domain::{ClarificationRecord, PlanningInput, PlanningStage, ProjectContext};

const ICP_KEYWORDS: &[&str] = &["icp", "customer", "user", "audience", "target"];
const TECH_KEYWORDS: &[&str] = &["tech", "stack", "technology", "framework", "language"];
const CONSTRAINT_KEYWORDS: &[&str] = &["constraint", "limit", "budget", "timeline", "deadline"];
const FEATURE_KEYWORDS: &[&str] = &["feature", "functionality", "requirement", "must-have", "core"];

/// Everything the prompt templater needs for one planner call.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PromptContext {
    pub goal: Option<String>,
    pub context: Option<ProjectContext>,
    pub answered_clarifications: Vec<AnsweredClarification>,
    pub stage: PlanningStage,
    pub note: Option<String>,
}

/// A question/answer pair rendered into prompts.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnsweredClarification {
    pub question: String,
    pub answer: String,
}

/// True when the planner should be asked for a final plan.
///
/// A `final` stage forces readiness regardless of coverage — the user has
/// explicitly closed scoping.
pub fn is_ready(input: &PlanningInput) -> bool {
    if input.stage == PlanningStage::Final {
        return true;
    }

    let has_goal = input
        .goal
        .as_deref()
        .is_some_and(|g| !g.trim().is_empty());

    has_goal
        && covered(input, context_icp, ICP_KEYWORDS)
        && covered(input, context_tech, TECH_KEYWORDS)
        && covered(input, context_constraints, CONSTRAINT_KEYWORDS)
        && covered(input, context_features, FEATURE_KEYWORDS)
}

/// Build the context handed to the prompt templater.
pub fn prompt_context(input: &PlanningInput) -> PromptContext {
    PromptContext {
        goal: input.goal.clone(),
        context: input.context.clone(),
        answered_clarifications: answered_pairs(&input.clarifications),
        stage: input.stage,
        note: input.note.clone(),
    }
}

fn covered(
    input: &PlanningInput,
    structured: fn(&ProjectContext) -> bool,
    keywords: &[&str],
) -> bool {
    if input.context.as_ref().is_some_and(structured) {
        return true;
    }
    answered_pairs(&input.clarifications).iter().any(|pair| {
        let haystack = format!("{} {}", pair.question, pair.answer).to_lowercase();
        keywords.iter().any(|kw| haystack.contains(kw))
    })
}

fn context_icp(ctx: &ProjectContext) -> bool {
    ctx.icp.as_deref().is_some_and(|s| !s.trim().is_empty())
}

fn context_tech(ctx: &ProjectContext) -> bool {
    !ctx.tech_stack.is_empty()
}

fn context_constraints(ctx: &ProjectContext) -> bool {
    !ctx.constraints.is_empty()
}

fn context_features(ctx: &ProjectContext) -> bool {
    !ctx.core_features.is_empty()
}

/// Question/answer pairs from answered clarifications with non-empty answers.
fn answered_pairs(clarifications: &[ClarificationRecord]) -> Vec<AnsweredClarification> {
    clarifications
        .iter()
        .filter(|c| c.is_answered())
        .flat_map(|c| {
            c.questions.iter().zip(c.answers.iter()).filter_map(|(q, a)| {
                if a.trim().is_empty() {
                    None
                } else {
                    Some(AnsweredClarification {
                        question: q.clone(),
                        answer: a.clone(),
                    })
                }
            })
        })
        .collect()
}
