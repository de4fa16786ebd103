//! The state machine
//!
//! `transit` is a pure function from `(state, intent, now)` to a new state
//! plus a list of side-effect requests. Failure modes are encoded as phase
//! changes with discussion entries, never as panics or exceptions. Every
//! accepted branch leaves through [`finish`], which installs the phase,
//! bumps the version, stamps `updatedAt`, and appends a TransitionRecord.

mod effect;
mod intent;

pub use effect::Effect;
pub use intent::Intent;

use chrono::{DateTime, Utc};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::domain::{
    AgentResult, AgentTask, ApprovalRequest, ClarificationRecord, DiscussionEntry, DiscussionKind,
    ExecutionState, Phase, PlanSnapshot, PlanningInput, PlanningStage, ProjectContext,
    ProjectState, Settings, TaskKind, TaskStatus, TransitionRecord, timestamp,
};
use crate::planning::normalizer;

/// Result of one transition: the next state and its side-effect requests.
#[derive(Debug, Clone)]
pub struct Transition {
    pub state: ProjectState,
    pub effects: Vec<Effect>,
}

/// The only way `transit` itself can refuse to run.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum MachineError {
    #[error("no project loaded; only `create_project` can bootstrap state")]
    NoProject,
}

/// Advance the project by one intent.
///
/// `now` is injected so transitions are deterministic under test.
pub fn transit(
    current: Option<&ProjectState>,
    intent: &Intent,
    now: &DateTime<Utc>,
) -> Result<Transition, MachineError> {
    let ts = timestamp(now);
    debug!(intent = intent.intent_type(), "transit");

    match (current, intent) {
        (
            None,
            Intent::CreateProject {
                project_id,
                goal,
                context,
                settings,
            },
        ) => Ok(create_project(
            project_id,
            goal,
            context.clone(),
            *settings,
            intent,
            &ts,
        )),
        (None, _) => Err(MachineError::NoProject),
        (Some(state), Intent::CreateProject { .. }) => Ok(reject(
            state.clone(),
            intent,
            "project already exists; create_project ignored",
            &ts,
        )),
        (Some(state), _) => Ok(step(state.clone(), intent, &ts)),
    }
}

fn step(state: ProjectState, intent: &Intent, ts: &str) -> Transition {
    match intent {
        Intent::AddFeature { description } => {
            planning_round(state, intent, PlanningStage::Clarification, Some(description.clone()), ts)
        }
        Intent::RequestClarifications {
            questions,
            discussion,
        } => request_clarifications(state, intent, questions, discussion.as_deref(), ts),
        Intent::AnswerClarifications {
            clarification_id,
            answers,
        } => answer_clarifications(state, intent, clarification_id, answers, ts),
        Intent::FinalizeScope { note } => finalize_scope(state, intent, note.clone(), ts),
        Intent::ApprovePlan {
            approval_id,
            plan_id,
        } => approve_plan(state, intent, approval_id, plan_id, ts),
        Intent::ApproveExecution { approval_id } => {
            approve_execution(state, intent, approval_id, ts)
        }
        Intent::Replan { reason } => planning_round(
            state,
            intent,
            PlanningStage::Clarification,
            Some(reason.clone().unwrap_or_else(|| "replan".to_string())),
            ts,
        ),
        Intent::RunTasks { task_ids } => run_tasks(state, intent, task_ids.as_deref(), ts),
        Intent::RetryTasks { task_ids } => retry_tasks(state, intent, task_ids.as_deref(), ts),
        Intent::PauseExecution { reason } => pause_execution(state, intent, reason.as_deref(), ts),
        Intent::AgentResult { result } => agent_result(state, intent, result, ts),
        // Handled by `transit` before dispatching here
        Intent::CreateProject { .. } => {
            let message = "project already exists; create_project ignored";
            reject(state, intent, message, ts)
        }
    }
}

// === Single exit point ===

/// Install the transition: phase, version, updatedAt, history.
fn finish(
    mut state: ProjectState,
    intent: &Intent,
    to: Phase,
    effects: Vec<Effect>,
    ts: &str,
) -> Transition {
    let from = state.phase;
    state.phase = to;
    state.version += 1;
    state.updated_at = ts.to_string();
    state.history.push(TransitionRecord {
        timestamp: ts.to_string(),
        intent_type: intent.intent_type().to_string(),
        from,
        to,
    });
    Transition { state, effects }
}

/// Precondition failure: phase → error, system discussion entry, no effects.
fn fail(mut state: ProjectState, intent: &Intent, message: &str, ts: &str) -> Transition {
    state
        .discussion
        .push(DiscussionEntry::new(DiscussionKind::System, message, ts));
    finish(state, intent, Phase::Error, Vec::new(), ts)
}

/// Rejection that must not poison state: phase preserved, version bumped.
fn reject(mut state: ProjectState, intent: &Intent, message: &str, ts: &str) -> Transition {
    let phase = state.phase;
    state
        .discussion
        .push(DiscussionEntry::new(DiscussionKind::System, message, ts));
    finish(state, intent, phase, Vec::new(), ts)
}

/// Intent applies to nothing: state is returned untouched, version included.
fn unchanged(state: ProjectState) -> Transition {
    Transition {
        state,
        effects: Vec::new(),
    }
}

// === Intent handlers ===

fn create_project(
    project_id: &str,
    goal: &str,
    context: Option<ProjectContext>,
    settings: Option<Settings>,
    intent: &Intent,
    ts: &str,
) -> Transition {
    let mut state = ProjectState::new(
        project_id,
        Some(goal.to_string()),
        context,
        settings.unwrap_or_default(),
        ts,
    );
    let effect = synthesize_planning_task(&mut state, PlanningStage::Clarification, None, ts);
    finish(state, intent, Phase::Planning, vec![effect], ts)
}

/// Append a freshly dispatched planning task and return its dispatch effect.
fn synthesize_planning_task(
    state: &mut ProjectState,
    stage: PlanningStage,
    note: Option<String>,
    ts: &str,
) -> Effect {
    let input = PlanningInput {
        stage,
        goal: state.goal.clone(),
        context: state.context.clone(),
        clarifications: state.answered_clarifications(),
        note,
    };
    let mut task = AgentTask::planning(&input, ts);
    task.mark_dispatched(ts);
    state.pending_tasks.push(task.clone());
    Effect::dispatch(task)
}

/// Shared body for `add_feature` and `replan`.
fn planning_round(
    mut state: ProjectState,
    intent: &Intent,
    stage: PlanningStage,
    note: Option<String>,
    ts: &str,
) -> Transition {
    let effect = synthesize_planning_task(&mut state, stage, note, ts);
    finish(state, intent, Phase::Planning, vec![effect], ts)
}

fn request_clarifications(
    mut state: ProjectState,
    intent: &Intent,
    questions: &[String],
    discussion: Option<&str>,
    ts: &str,
) -> Transition {
    state
        .clarifications
        .push(ClarificationRecord::open(questions.to_vec(), ts));
    if let Some(note) = discussion {
        state
            .discussion
            .push(DiscussionEntry::new(DiscussionKind::Clarification, note, ts));
    }
    finish(state, intent, Phase::AwaitingClarification, Vec::new(), ts)
}

fn answer_clarifications(
    mut state: ProjectState,
    intent: &Intent,
    clarification_id: &str,
    answers: &[String],
    ts: &str,
) -> Transition {
    match state.clarification_mut(clarification_id) {
        Some(record) => record.answer(answers.to_vec(), ts),
        None => {
            let message = format!("unknown clarification id: {}", clarification_id);
            return fail(state, intent, &message, ts);
        }
    }
    let effect = synthesize_planning_task(&mut state, PlanningStage::Clarification, None, ts);
    finish(state, intent, Phase::Planning, vec![effect], ts)
}

fn finalize_scope(
    mut state: ProjectState,
    intent: &Intent,
    note: Option<String>,
    ts: &str,
) -> Transition {
    for record in &mut state.clarifications {
        record.resolve(ts);
    }
    let effect = synthesize_planning_task(&mut state, PlanningStage::Final, note, ts);
    finish(state, intent, Phase::Planning, vec![effect], ts)
}

fn approve_plan(
    mut state: ProjectState,
    intent: &Intent,
    approval_id: &str,
    plan_id: &str,
    ts: &str,
) -> Transition {
    let matches = state.approval(approval_id).is_some_and(|a| {
        a.kind == crate::domain::ApprovalKind::Plan && a.plan_id.as_deref() == Some(plan_id)
    });
    if !matches {
        let message = format!("no plan approval {} for plan {}", approval_id, plan_id);
        return fail(state, intent, &message, ts);
    }
    let Some(plan) = state.plans.get(plan_id).cloned() else {
        let message = format!("plan {} not found", plan_id);
        return fail(state, intent, &message, ts);
    };

    state.take_approval(approval_id);
    state.current_plan_id = Some(plan_id.to_string());

    let mut new_tasks: Vec<AgentTask> = plan
        .tasks
        .iter()
        .map(|def| AgentTask::execution(def, plan_id, ts))
        .collect();

    if state.settings.require_execution_approval {
        let task_ids: Vec<String> = new_tasks.iter().map(|t| t.id.clone()).collect();
        state.pending_tasks.append(&mut new_tasks);
        state.recompute_execution();

        let approval = ApprovalRequest::execution_start(plan_id, task_ids, ts);
        state.approvals.push(approval.clone());
        return finish(
            state,
            intent,
            Phase::AwaitingExecutionApproval,
            vec![Effect::approval(approval)],
            ts,
        );
    }

    if new_tasks.is_empty() {
        state.recompute_execution();
        return finish(state, intent, Phase::Completed, Vec::new(), ts);
    }

    let mut effects = Vec::with_capacity(new_tasks.len());
    for task in &mut new_tasks {
        task.mark_dispatched(ts);
        effects.push(Effect::dispatch(task.clone()));
    }
    state.pending_tasks.append(&mut new_tasks);
    state.recompute_execution();
    finish(state, intent, Phase::Executing, effects, ts)
}

fn approve_execution(
    mut state: ProjectState,
    intent: &Intent,
    approval_id: &str,
    ts: &str,
) -> Transition {
    let blocks = state
        .approval(approval_id)
        .is_some_and(|a| a.blocks_execution());
    if !blocks {
        let message = format!("no execution approval with id {}", approval_id);
        return fail(state, intent, &message, ts);
    }
    // Presence was just checked
    let Some(approval) = state.take_approval(approval_id) else {
        let message = format!("no execution approval with id {}", approval_id);
        return fail(state, intent, &message, ts);
    };

    let task_ids = approval.task_ids.unwrap_or_default();
    let effects = dispatch_tasks(&mut state, &task_ids, ts);
    state.recompute_execution();
    finish(state, intent, Phase::Executing, effects, ts)
}

/// Mark the listed tasks dispatched, producing one effect per task.
fn dispatch_tasks(state: &mut ProjectState, task_ids: &[String], ts: &str) -> Vec<Effect> {
    let mut effects = Vec::new();
    for id in task_ids {
        if let Some(task) = state.task_mut(id) {
            task.mark_dispatched(ts);
            effects.push(Effect::dispatch(task.clone()));
        }
    }
    effects
}

fn run_tasks(
    mut state: ProjectState,
    intent: &Intent,
    task_ids: Option<&[String]>,
    ts: &str,
) -> Transition {
    if state.has_pending_execution_approval() {
        return reject(
            state,
            intent,
            "run_tasks rejected: an execution approval is still pending",
            ts,
        );
    }

    let ids: Vec<String> = match task_ids {
        Some(ids) => ids
            .iter()
            .filter(|id| {
                state
                    .task(id)
                    .is_some_and(|t| t.kind == TaskKind::Execution && t.status == TaskStatus::Pending)
            })
            .cloned()
            .collect(),
        None => state.pending_execution_task_ids(),
    };

    let phase = state.phase;
    let effects = dispatch_tasks(&mut state, &ids, ts);
    state.recompute_execution();
    finish(state, intent, phase, effects, ts)
}

fn retry_tasks(
    mut state: ProjectState,
    intent: &Intent,
    task_ids: Option<&[String]>,
    ts: &str,
) -> Transition {
    let selected = state.failed_execution_task_ids(task_ids);
    if selected.is_empty() {
        return unchanged(state);
    }

    // Reset the tasks and purge their stale results before recomputing
    let mut results = state
        .execution
        .take()
        .map(|e| e.results)
        .unwrap_or_default();
    for id in &selected {
        results.remove(id);
        if let Some(task) = state.task_mut(id) {
            task.status = TaskStatus::Pending;
        }
    }
    state.execution = Some(ExecutionState::recompute(&state.pending_tasks, results));

    if state.settings.require_retry_approval {
        let approval = ApprovalRequest::execution_retry(selected, ts);
        state.approvals.push(approval.clone());
        return finish(
            state,
            intent,
            Phase::AwaitingExecutionApproval,
            vec![Effect::approval(approval)],
            ts,
        );
    }

    let effects = dispatch_tasks(&mut state, &selected, ts);
    state.recompute_execution();
    finish(state, intent, Phase::Executing, effects, ts)
}

fn pause_execution(
    mut state: ProjectState,
    intent: &Intent,
    reason: Option<&str>,
    ts: &str,
) -> Transition {
    let message = match reason {
        Some(reason) => format!("execution paused: {}", reason),
        None => "execution paused".to_string(),
    };
    state
        .discussion
        .push(DiscussionEntry::new(DiscussionKind::System, message, ts));
    finish(state, intent, Phase::Paused, Vec::new(), ts)
}

// === Agent result handling ===

fn agent_result(
    mut state: ProjectState,
    intent: &Intent,
    result: &AgentResult,
    ts: &str,
) -> Transition {
    let Some(task) = state.task(&result.task_id) else {
        let message = format!("agent_result for unknown task: {}", result.task_id);
        return fail(state, intent, &message, ts);
    };

    // A terminal task already absorbed its result; replays are no-ops.
    if task.is_terminal() {
        debug!(task_id = %result.task_id, "duplicate agent_result ignored");
        return unchanged(state);
    }
    let kind = task.kind;

    let status = if result.is_success() {
        TaskStatus::Completed
    } else {
        TaskStatus::Failed
    };
    if let Some(task) = state.task_mut(&result.task_id) {
        task.status = status;
    }

    match kind {
        TaskKind::Planning => planning_result(state, intent, result, ts),
        TaskKind::Execution => execution_result(state, intent, result, ts),
    }
}

fn planning_result(
    mut state: ProjectState,
    intent: &Intent,
    result: &AgentResult,
    ts: &str,
) -> Transition {
    if !result.is_success() {
        let reason = result.error.as_deref().unwrap_or("planner failed");
        let message = format!("planning failed: {}", reason);
        return fail(state, intent, &message, ts);
    }

    let output = planner_output_value(result);
    fold_planner_discussion(&mut state, output.as_ref(), ts);

    let questions = output
        .as_ref()
        .and_then(|v| v.get("questions"))
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect::<Vec<String>>()
        })
        .unwrap_or_default();

    if !questions.is_empty() {
        let record = ClarificationRecord::open(questions.clone(), ts);
        state.discussion.push(DiscussionEntry::new(
            DiscussionKind::Clarification,
            questions.join(" "),
            ts,
        ));
        state.clarifications.push(record);
        return finish(state, intent, Phase::AwaitingClarification, Vec::new(), ts);
    }

    if let Some(plan_value) = output.as_ref().and_then(|v| v.get("plan")) {
        let snapshot = PlanSnapshot::from_value(plan_value, ts);
        let plan_id = snapshot.id.clone();
        let task_count = snapshot.tasks.len();
        // Content-addressed: an identical proposal keeps the stored snapshot
        state.plans.entry(plan_id.clone()).or_insert(snapshot);
        state.current_plan_id = Some(plan_id.clone());

        let approval = ApprovalRequest::plan(&plan_id, task_count, ts);
        state.approvals.push(approval.clone());
        state.discussion.push(DiscussionEntry::new(
            DiscussionKind::Plan,
            format!("proposed plan {} with {} tasks", plan_id, task_count),
            ts,
        ));
        return finish(
            state,
            intent,
            Phase::AwaitingApproval,
            vec![Effect::approval(approval)],
            ts,
        );
    }

    state.discussion.push(DiscussionEntry::new(
        DiscussionKind::System,
        "planner returned neither questions nor a plan",
        ts,
    ));
    finish(state, intent, Phase::Planning, Vec::new(), ts)
}

/// Decode the planner result into a JSON mapping, tolerating string output.
fn planner_output_value(result: &AgentResult) -> Option<Value> {
    match result.output.as_ref()? {
        Value::String(text) => normalizer::extract_json(text).ok(),
        other => Some(other.clone()),
    }
}

/// Fold an optional planner-provided `discussion` array into the timeline.
fn fold_planner_discussion(state: &mut ProjectState, output: Option<&Value>, ts: &str) {
    let Some(items) = output
        .and_then(|v| v.get("discussion"))
        .and_then(Value::as_array)
    else {
        return;
    };
    for item in items {
        if let Some(entry) = DiscussionEntry::from_planner_value(item, ts) {
            state.discussion.push(entry);
        }
    }
}

fn execution_result(
    mut state: ProjectState,
    intent: &Intent,
    result: &AgentResult,
    ts: &str,
) -> Transition {
    let mut results = state
        .execution
        .take()
        .map(|e| e.results)
        .unwrap_or_default();
    results.insert(result.task_id.clone(), result.clone());

    let execution = ExecutionState::recompute(&state.pending_tasks, results);
    let next_phase = if execution.is_complete() {
        Phase::Completed
    } else if execution.is_stuck() {
        Phase::Error
    } else {
        state.phase
    };

    if !result.is_success() {
        let reason = result.error.as_deref().unwrap_or("task failed");
        state.discussion.push(DiscussionEntry::new(
            DiscussionKind::Execution,
            format!("task {} failed: {}", result.task_id, reason),
            ts,
        ));
    }

    state.execution = Some(execution);
    finish(state, intent, next_phase, Vec::new(), ts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn t(n: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, n).unwrap()
    }

    fn create_intent(settings: Option<Settings>) -> Intent {
        Intent::CreateProject {
            project_id: "p1".to_string(),
            goal: "build X".to_string(),
            context: Some(ProjectContext {
                icp: Some("SMB".to_string()),
                tech_stack: vec!["rust".to_string()],
                constraints: vec!["OSS".to_string()],
                core_features: vec!["auth".to_string()],
            }),
            settings,
        }
    }

    fn created(settings: Option<Settings>) -> ProjectState {
        transit(None, &create_intent(settings), &t(1)).unwrap().state
    }

    fn plan_output() -> Value {
        json!({
            "plan": {
                "roadmap": [{"title": "M1"}],
                "features": [{"title": "F1"}],
                "tasks": [{"title": "T1", "role": "backend"}]
            }
        })
    }

    /// Drive a fresh project to `awaiting_approval` and return the state.
    fn proposed(settings: Option<Settings>) -> ProjectState {
        let state = created(settings);
        let task_id = state.pending_tasks[0].id.clone();
        let intent = Intent::AgentResult {
            result: AgentResult::success(task_id, plan_output()),
        };
        transit(Some(&state), &intent, &t(2)).unwrap().state
    }

    fn approve(state: &ProjectState, at: DateTime<Utc>) -> Transition {
        let approval = &state.approvals[0];
        let intent = Intent::ApprovePlan {
            approval_id: approval.id.clone(),
            plan_id: approval.plan_id.clone().unwrap(),
        };
        transit(Some(state), &intent, &at).unwrap()
    }

    #[test]
    fn test_create_project_bootstraps_planning() {
        let result = transit(None, &create_intent(None), &t(1)).unwrap();
        let state = &result.state;

        assert_eq!(state.phase, Phase::Planning);
        assert_eq!(state.version, 1);
        assert_eq!(state.history.len(), 1);
        assert_eq!(state.history[0].from, Phase::Idle);
        assert_eq!(state.pending_tasks.len(), 1);
        assert_eq!(state.pending_tasks[0].kind, TaskKind::Planning);
        assert!(state.pending_tasks[0].dispatched_at.is_some());
        assert_eq!(result.effects.len(), 1);
        assert!(result.effects[0].is_planning_dispatch());
    }

    #[test]
    fn test_create_on_existing_state_is_rejected() {
        let state = created(None);
        let result = transit(Some(&state), &create_intent(None), &t(2)).unwrap();

        assert_eq!(result.state.phase, Phase::Planning);
        assert_eq!(result.state.version, state.version + 1);
        assert!(result.effects.is_empty());
        assert_eq!(result.state.pending_tasks.len(), 1);
    }

    #[test]
    fn test_non_create_without_state_errors() {
        let err = transit(None, &Intent::Replan { reason: None }, &t(1)).unwrap_err();
        assert_eq!(err, MachineError::NoProject);
    }

    #[test]
    fn test_planner_questions_open_clarification() {
        let state = created(None);
        let task_id = state.pending_tasks[0].id.clone();
        let intent = Intent::AgentResult {
            result: AgentResult::success(task_id, json!({"questions": ["Who is the target user?"]})),
        };
        let result = transit(Some(&state), &intent, &t(2)).unwrap();

        assert_eq!(result.state.phase, Phase::AwaitingClarification);
        assert_eq!(result.state.clarifications.len(), 1);
        assert_eq!(
            result.state.clarifications[0].questions,
            vec!["Who is the target user?"]
        );
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_planner_string_output_is_extracted() {
        let state = created(None);
        let task_id = state.pending_tasks[0].id.clone();
        let text = format!("Here you go:\n```json\n{}\n```", plan_output());
        let intent = Intent::AgentResult {
            result: AgentResult::success(task_id, Value::String(text)),
        };
        let result = transit(Some(&state), &intent, &t(2)).unwrap();
        assert_eq!(result.state.phase, Phase::AwaitingApproval);
    }

    #[test]
    fn test_planner_plan_creates_snapshot_and_approval() {
        let state = proposed(None);

        assert_eq!(state.phase, Phase::AwaitingApproval);
        assert_eq!(state.plans.len(), 1);
        assert_eq!(state.approvals.len(), 1);
        assert_eq!(state.approvals[0].kind, crate::domain::ApprovalKind::Plan);
        assert_eq!(state.current_plan_id, state.approvals[0].plan_id);
    }

    #[test]
    fn test_identical_plan_deduplicates() {
        let state = proposed(None);
        let first_plan_id = state.current_plan_id.clone().unwrap();

        // A replan round proposing the same content lands on the same snapshot
        let result = transit(Some(&state), &Intent::Replan { reason: None }, &t(3)).unwrap();
        let task_id = result.state.pending_tasks.last().unwrap().id.clone();
        let intent = Intent::AgentResult {
            result: AgentResult::success(task_id, plan_output()),
        };
        let again = transit(Some(&result.state), &intent, &t(4)).unwrap().state;

        assert_eq!(again.plans.len(), 1);
        assert_eq!(again.current_plan_id.as_deref(), Some(first_plan_id.as_str()));
    }

    #[test]
    fn test_planner_neither_shape_returns_to_planning() {
        let state = created(None);
        let task_id = state.pending_tasks[0].id.clone();
        let intent = Intent::AgentResult {
            result: AgentResult::success(task_id, json!({"discussion": ["thinking"]})),
        };
        let result = transit(Some(&state), &intent, &t(2)).unwrap();

        assert_eq!(result.state.phase, Phase::Planning);
        // Folded planner discussion plus the bookkeeping note
        assert_eq!(result.state.discussion.len(), 2);
    }

    #[test]
    fn test_planner_failure_moves_to_error() {
        let state = created(None);
        let task_id = state.pending_tasks[0].id.clone();
        let intent = Intent::AgentResult {
            result: AgentResult::failure(task_id, "No valid JSON object found in response"),
        };
        let result = transit(Some(&state), &intent, &t(2)).unwrap();

        assert_eq!(result.state.phase, Phase::Error);
        assert!(result.state.discussion.iter().any(|d| d.message.contains("planning failed")));
    }

    #[test]
    fn test_approve_plan_dispatches_execution() {
        let state = proposed(None);
        let result = approve(&state, t(3));

        assert_eq!(result.state.phase, Phase::Executing);
        assert!(result.state.approvals.is_empty());
        assert_eq!(result.effects.len(), 1);
        assert!(result.effects[0].is_execution_dispatch());
        let exec = result.state.execution.as_ref().unwrap();
        assert_eq!(exec.summary.total, 1);
        assert_eq!(exec.summary.in_progress, 1);
    }

    #[test]
    fn test_approve_plan_with_wrong_plan_id_fails() {
        let state = proposed(None);
        let intent = Intent::ApprovePlan {
            approval_id: state.approvals[0].id.clone(),
            plan_id: "plan-bogus".to_string(),
        };
        let result = transit(Some(&state), &intent, &t(3)).unwrap();
        assert_eq!(result.state.phase, Phase::Error);
        // The approval was not consumed
        assert_eq!(result.state.approvals.len(), 1);
    }

    #[test]
    fn test_approve_plan_zero_tasks_completes() {
        let state = created(None);
        let task_id = state.pending_tasks[0].id.clone();
        // Tolerant normalization accepts an empty tasks array at this layer
        let output = json!({
            "plan": {
                "roadmap": [{"title": "M1"}],
                "features": [{"title": "F1"}],
                "tasks": []
            }
        });
        let intent = Intent::AgentResult {
            result: AgentResult::success(task_id, output),
        };
        let state = transit(Some(&state), &intent, &t(2)).unwrap().state;
        let result = approve(&state, t(3));

        assert_eq!(result.state.phase, Phase::Completed);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_execution_approval_gate() {
        let settings = Settings {
            require_execution_approval: true,
            require_retry_approval: true,
        };
        let state = proposed(Some(settings));
        let result = approve(&state, t(3));

        assert_eq!(result.state.phase, Phase::AwaitingExecutionApproval);
        assert_eq!(result.effects.len(), 1);
        assert!(matches!(result.effects[0], Effect::RequestApproval { .. }));
        let approval = &result.state.approvals[0];
        assert_eq!(approval.kind, crate::domain::ApprovalKind::ExecutionStart);

        // run_tasks is rejected while the gate is pending
        let rejected = transit(
            Some(&result.state),
            &Intent::RunTasks { task_ids: None },
            &t(4),
        )
        .unwrap();
        assert_eq!(rejected.state.phase, Phase::AwaitingExecutionApproval);
        assert_eq!(rejected.state.version, result.state.version + 1);
        assert!(rejected.effects.is_empty());

        // approve_execution dispatches
        let approved = transit(
            Some(&rejected.state),
            &Intent::ApproveExecution {
                approval_id: approval.id.clone(),
            },
            &t(5),
        )
        .unwrap();
        assert_eq!(approved.state.phase, Phase::Executing);
        assert_eq!(approved.effects.len(), 1);
        assert!(approved.state.approvals.is_empty());
    }

    #[test]
    fn test_approve_execution_unknown_id_fails() {
        let state = proposed(None);
        let intent = Intent::ApproveExecution {
            approval_id: "approval-bogus".to_string(),
        };
        let result = transit(Some(&state), &intent, &t(3)).unwrap();
        assert_eq!(result.state.phase, Phase::Error);
    }

    #[test]
    fn test_approve_execution_rejects_plan_approval() {
        let state = proposed(None);
        let intent = Intent::ApproveExecution {
            approval_id: state.approvals[0].id.clone(),
        };
        let result = transit(Some(&state), &intent, &t(3)).unwrap();
        assert_eq!(result.state.phase, Phase::Error);
        assert_eq!(result.state.approvals.len(), 1);
    }

    #[test]
    fn test_execution_success_completes_project() {
        let state = approve(&proposed(None), t(3)).state;
        let exec_id = state
            .execution_tasks()
            .next()
            .map(|t| t.id.clone())
            .unwrap();

        let intent = Intent::AgentResult {
            result: AgentResult::success(exec_id, json!({"artifacts": ["done"]})),
        };
        let result = transit(Some(&state), &intent, &t(4)).unwrap();

        assert_eq!(result.state.phase, Phase::Completed);
        let exec = result.state.execution.as_ref().unwrap();
        assert_eq!(exec.summary.completed, 1);
        assert_eq!(exec.summary.failed, 0);
        assert!(exec.failures.is_empty());
    }

    #[test]
    fn test_execution_failure_moves_to_error_when_stuck() {
        let state = approve(&proposed(None), t(3)).state;
        let exec_id = state
            .execution_tasks()
            .next()
            .map(|t| t.id.clone())
            .unwrap();

        let intent = Intent::AgentResult {
            result: AgentResult::failure(exec_id.clone(), "build broke"),
        };
        let result = transit(Some(&state), &intent, &t(4)).unwrap();

        assert_eq!(result.state.phase, Phase::Error);
        let exec = result.state.execution.as_ref().unwrap();
        assert_eq!(exec.failures.len(), 1);
        assert_eq!(exec.failures[0].task_id, exec_id);
        assert_eq!(exec.failures[0].reason, "build broke");
    }

    #[test]
    fn test_agent_result_unknown_task_fails() {
        let state = created(None);
        let intent = Intent::AgentResult {
            result: AgentResult::success("task-nope", json!({})),
        };
        let result = transit(Some(&state), &intent, &t(2)).unwrap();
        assert_eq!(result.state.phase, Phase::Error);
    }

    #[test]
    fn test_duplicate_agent_result_is_noop() {
        let state = approve(&proposed(None), t(3)).state;
        let exec_id = state
            .execution_tasks()
            .next()
            .map(|t| t.id.clone())
            .unwrap();
        let intent = Intent::AgentResult {
            result: AgentResult::success(exec_id, json!({})),
        };

        let once = transit(Some(&state), &intent, &t(4)).unwrap().state;
        let twice = transit(Some(&once), &intent, &t(5)).unwrap().state;
        assert_eq!(once, twice);
    }

    #[test]
    fn test_retry_with_no_failures_is_noop() {
        let state = approve(&proposed(None), t(3)).state;
        let result = transit(Some(&state), &Intent::RetryTasks { task_ids: None }, &t(4)).unwrap();
        assert_eq!(result.state, state);
        assert!(result.effects.is_empty());
    }

    #[test]
    fn test_retry_with_approval_gate() {
        let state = approve(&proposed(None), t(3)).state;
        let exec_id = state
            .execution_tasks()
            .next()
            .map(|t| t.id.clone())
            .unwrap();
        let failed = transit(
            Some(&state),
            &Intent::AgentResult {
                result: AgentResult::failure(exec_id.clone(), "boom"),
            },
            &t(4),
        )
        .unwrap()
        .state;

        // Default settings require retry approval
        let retried = transit(Some(&failed), &Intent::RetryTasks { task_ids: None }, &t(5)).unwrap();
        assert_eq!(retried.state.phase, Phase::AwaitingExecutionApproval);
        let approval = &retried.state.approvals[0];
        assert_eq!(approval.kind, crate::domain::ApprovalKind::ExecutionRetry);
        assert_eq!(approval.task_ids.as_deref(), Some(&[exec_id.clone()][..]));

        // The failed task was reset and its result purged
        let task = retried.state.task(&exec_id).unwrap();
        assert_eq!(task.status, TaskStatus::Pending);
        assert!(
            !retried
                .state
                .execution
                .as_ref()
                .unwrap()
                .results
                .contains_key(&exec_id)
        );

        // Approving the retry re-dispatches with the original dispatchedAt
        let original_dispatch = task.dispatched_at.clone();
        let approved = transit(
            Some(&retried.state),
            &Intent::ApproveExecution {
                approval_id: approval.id.clone(),
            },
            &t(6),
        )
        .unwrap();
        assert_eq!(approved.state.phase, Phase::Executing);
        assert_eq!(approved.effects.len(), 1);
        assert_eq!(
            approved.state.task(&exec_id).unwrap().dispatched_at,
            original_dispatch
        );
    }

    #[test]
    fn test_retry_without_approval_dispatches_immediately() {
        let settings = Settings {
            require_execution_approval: false,
            require_retry_approval: false,
        };
        let state = approve(&proposed(Some(settings)), t(3)).state;
        let exec_id = state
            .execution_tasks()
            .next()
            .map(|t| t.id.clone())
            .unwrap();
        let failed = transit(
            Some(&state),
            &Intent::AgentResult {
                result: AgentResult::failure(exec_id, "boom"),
            },
            &t(4),
        )
        .unwrap()
        .state;

        let retried = transit(Some(&failed), &Intent::RetryTasks { task_ids: None }, &t(5)).unwrap();
        assert_eq!(retried.state.phase, Phase::Executing);
        assert_eq!(retried.effects.len(), 1);
        assert!(retried.effects[0].is_execution_dispatch());
    }

    #[test]
    fn test_answer_clarifications_round_trips_to_planning() {
        let state = created(None);
        let task_id = state.pending_tasks[0].id.clone();
        let asked = transit(
            Some(&state),
            &Intent::AgentResult {
                result: AgentResult::success(task_id, json!({"questions": ["Who?"]})),
            },
            &t(2),
        )
        .unwrap()
        .state;

        let clarification_id = asked.clarifications[0].id.clone();
        let result = transit(
            Some(&asked),
            &Intent::AnswerClarifications {
                clarification_id,
                answers: vec!["SMB dev teams".to_string()],
            },
            &t(3),
        )
        .unwrap();

        assert_eq!(result.state.phase, Phase::Planning);
        assert_eq!(result.state.clarifications[0].answers, vec!["SMB dev teams"]);
        assert!(result.state.clarifications[0].is_answered());
        // A fresh planning task was synthesized and dispatched
        assert_eq!(result.state.pending_tasks.len(), 2);
        assert!(result.effects[0].is_planning_dispatch());
        // The new task carries the answered clarification
        let input = &result.state.pending_tasks[1].input;
        assert_eq!(input["clarifications"][0]["answers"][0], "SMB dev teams");
    }

    #[test]
    fn test_answer_unknown_clarification_fails() {
        let state = created(None);
        let result = transit(
            Some(&state),
            &Intent::AnswerClarifications {
                clarification_id: "clarification-bogus".to_string(),
                answers: vec![],
            },
            &t(2),
        )
        .unwrap();
        assert_eq!(result.state.phase, Phase::Error);
    }

    #[test]
    fn test_finalize_scope_resolves_and_goes_final() {
        let state = created(None);
        let task_id = state.pending_tasks[0].id.clone();
        let asked = transit(
            Some(&state),
            &Intent::AgentResult {
                result: AgentResult::success(task_id, json!({"questions": ["Who?"]})),
            },
            &t(2),
        )
        .unwrap()
        .state;

        let result = transit(
            Some(&asked),
            &Intent::FinalizeScope {
                note: Some("ship it".to_string()),
            },
            &t(3),
        )
        .unwrap();

        assert_eq!(result.state.phase, Phase::Planning);
        assert!(
            result
                .state
                .clarifications
                .iter()
                .all(|c| c.status == crate::domain::ClarificationStatus::Resolved)
        );
        let input = &result.state.pending_tasks.last().unwrap().input;
        assert_eq!(input["stage"], "final");
        assert_eq!(input["note"], "ship it");
    }

    #[test]
    fn test_pause_execution_records_reason() {
        let state = approve(&proposed(None), t(3)).state;
        let result = transit(
            Some(&state),
            &Intent::PauseExecution {
                reason: Some("lunch".to_string()),
            },
            &t(4),
        )
        .unwrap();
        assert_eq!(result.state.phase, Phase::Paused);
        assert!(result.state.discussion.iter().any(|d| d.message.contains("lunch")));
    }

    #[test]
    fn test_request_clarifications_out_of_band() {
        let state = created(None);
        let result = transit(
            Some(&state),
            &Intent::RequestClarifications {
                questions: vec!["What is the budget?".to_string()],
                discussion: Some("scoping call notes".to_string()),
            },
            &t(2),
        )
        .unwrap();

        assert_eq!(result.state.phase, Phase::AwaitingClarification);
        assert_eq!(result.state.clarifications.len(), 1);
        assert!(result.effects.is_empty());
        assert!(
            result
                .state
                .discussion
                .iter()
                .any(|d| d.message == "scoping call notes")
        );
    }

    #[test]
    fn test_replan_from_error_phase() {
        let state = created(None);
        let errored = transit(
            Some(&state),
            &Intent::AgentResult {
                result: AgentResult::failure(state.pending_tasks[0].id.clone(), "bad output"),
            },
            &t(2),
        )
        .unwrap()
        .state;
        assert_eq!(errored.phase, Phase::Error);

        let result = transit(Some(&errored), &Intent::Replan { reason: None }, &t(3)).unwrap();
        assert_eq!(result.state.phase, Phase::Planning);
        let input = &result.state.pending_tasks.last().unwrap().input;
        assert_eq!(input["note"], "replan");
    }

    #[test]
    fn test_version_and_history_track_every_accepted_intent() {
        let state = created(None);
        assert_eq!(state.version, state.history.len() as u64);

        let rejected = transit(Some(&state), &create_intent(None), &t(2)).unwrap().state;
        assert_eq!(rejected.version, rejected.history.len() as u64);
        assert_eq!(rejected.version, state.version + 1);
    }
}
