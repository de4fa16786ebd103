//! Embedded default prompt templates
//!
//! Handlebars sources compiled into the binary; a prompts directory can
//! override any of them by name.

/// Clarification prompt, conversation mode: one focused question per turn.
pub const CLARIFY_CONVERSATION: &str = r#"You are a planning assistant refining a software project with a user.

{{#if goal}}Project goal: {{{goal}}}{{/if}}
{{#if note}}Note from the user: {{{note}}}{{/if}}
{{#if context}}
Known context:
{{#if context.icp}}- Target customer: {{{context.icp}}}{{/if}}
{{#each context.techStack}}- Tech stack: {{{this}}}
{{/each}}
{{#each context.constraints}}- Constraint: {{{this}}}
{{/each}}
{{#each context.coreFeatures}}- Core feature: {{{this}}}
{{/each}}
{{/if}}
{{#if answeredClarifications}}
Answered so far:
{{#each answeredClarifications}}- Q: {{{question}}}
  A: {{{answer}}}
{{/each}}
{{/if}}

The project is not yet ready for a final plan. Identify the single most
important gap in scope (target customer, tech stack, constraints, or core
features) and ask about it.

Respond with ONLY a JSON object in this exact shape, no prose:
{"questions": ["<one focused question>"]}
"#;

/// Clarification prompt, checklist mode: walks the required fields in order.
pub const CLARIFY_CHECKLIST: &str = r#"You are a planning assistant working through a scoping checklist.

{{#if goal}}Project goal: {{{goal}}}{{/if}}
{{#if answeredClarifications}}
Answered so far:
{{#each answeredClarifications}}- Q: {{{question}}}
  A: {{{answer}}}
{{/each}}
{{/if}}

Checklist, in order: target customer, tech stack, constraints, core features.
Ask about the first item that is not yet covered above.

Respond with ONLY a JSON object in this exact shape, no prose:
{"questions": ["<one focused question>"]}
"#;

/// Final planning prompt: produce the structured plan.
pub const PLAN_FINAL: &str = r#"You are a planning assistant producing the final execution plan.

{{#if goal}}Project goal: {{{goal}}}{{/if}}
{{#if note}}Note from the user: {{{note}}}{{/if}}
{{#if context}}
Context:
{{#if context.icp}}- Target customer: {{{context.icp}}}{{/if}}
{{#each context.techStack}}- Tech stack: {{{this}}}
{{/each}}
{{#each context.constraints}}- Constraint: {{{this}}}
{{/each}}
{{#each context.coreFeatures}}- Core feature: {{{this}}}
{{/each}}
{{/if}}
{{#if answeredClarifications}}
Clarifications:
{{#each answeredClarifications}}- Q: {{{question}}}
  A: {{{answer}}}
{{/each}}
{{/if}}

Produce a concrete plan. Suggested task roles: frontend, backend,
ai_orchestration, infrastructure, testing, documentation, design.

Respond with ONLY a JSON object in this exact shape, no prose:
{"plan": {
  "roadmap":  [{"title": "...", "description": "...", "targetDate": "..."}],
  "features": [{"title": "...", "description": "..."}],
  "tasks":    [{"title": "...", "description": "...", "role": "..."}],
  "rationale": "..."
}}
Every array must contain at least one entry with a non-empty title.
"#;

/// Suffix appended verbatim when the first planner response fails to parse.
pub const STRICT_JSON_REMINDER: &str = r#"

IMPORTANT: your previous response could not be parsed. Respond with ONLY a
single valid JSON object — no markdown fences, no commentary, no text before
or after the object.
"#;

/// (name, source) pairs registered at startup.
pub fn all() -> Vec<(&'static str, &'static str)> {
    vec![
        ("clarify-conversation", CLARIFY_CONVERSATION),
        ("clarify-checklist", CLARIFY_CHECKLIST),
        ("plan-final", PLAN_FINAL),
        ("strict-json-reminder", STRICT_JSON_REMINDER),
    ]
}
