//! Orchestrator façade
//!
//! The single writer of project state. One intent is processed to
//! completion at a time: compute the transition, persist the new state,
//! then execute effects. Persistence happens before any effect runs, so a
//! crash mid-dispatch replays cleanly — the task stays `pending`/
//! `in_progress` until an explicit result arrives.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use eyre::{Context, Result, bail};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::dispatch::Dispatcher;
use crate::domain::{AgentResult, ProjectState};
use crate::machine::{self, Effect, Intent};
use crate::store::ProjectStore;

/// Outcome of one handled intent.
#[derive(Debug)]
pub struct StateTransitionResult {
    /// The committed state after the intent.
    pub state: ProjectState,
    /// Effects the machine produced (already executed).
    pub effects: Vec<Effect>,
    /// Backend completions gathered while executing the effects. Feed these
    /// back as `agent_result` intents to continue the lifecycle.
    pub completions: Vec<AgentResult>,
}

pub struct Orchestrator {
    store: Arc<dyn ProjectStore>,
    dispatcher: Dispatcher,
    current: Mutex<Option<ProjectState>>,
}

impl Orchestrator {
    pub fn new(store: Arc<dyn ProjectStore>, dispatcher: Dispatcher) -> Self {
        Self {
            store,
            dispatcher,
            current: Mutex::new(None),
        }
    }

    /// Load the committed snapshot from the store, if any.
    pub async fn initialize(&self) -> Result<Option<ProjectState>> {
        let loaded = self.store.load().await.context("Failed to load project state")?;
        let mut current = self.current.lock().await;
        *current = loaded.clone();
        if let Some(state) = &loaded {
            info!(project_id = %state.project_id, version = state.version, phase = %state.phase, "project loaded");
        }
        Ok(loaded)
    }

    /// Current in-memory snapshot.
    pub async fn state(&self) -> Option<ProjectState> {
        self.current.lock().await.clone()
    }

    /// Handle one intent with the wall clock.
    pub async fn handle_intent(&self, intent: &Intent) -> Result<StateTransitionResult> {
        self.handle_intent_at(intent, Utc::now()).await
    }

    /// Handle one intent with an injected clock (used by tests).
    ///
    /// Intents serialize on the state lock: at most one is in flight, and
    /// effect execution finishes before the next intent starts.
    pub async fn handle_intent_at(
        &self,
        intent: &Intent,
        now: DateTime<Utc>,
    ) -> Result<StateTransitionResult> {
        let mut current = self.current.lock().await;

        if current.is_none() && !matches!(intent, Intent::CreateProject { .. }) {
            bail!(
                "no project loaded; `{}` requires an existing project",
                intent.intent_type()
            );
        }

        let transition = machine::transit(current.as_ref(), intent, &now)
            .context("State machine rejected the intent")?;

        // Durably commit before any side effect runs. On failure the
        // in-memory snapshot is left at the pre-call state.
        if let Err(e) = self.store.save(&transition.state).await {
            warn!(error = %e, "state save failed; intent not applied");
            return Err(e).context("Failed to persist project state");
        }
        *current = Some(transition.state.clone());
        debug!(
            intent = intent.intent_type(),
            version = transition.state.version,
            phase = %transition.state.phase,
            effects = transition.effects.len(),
            "intent applied"
        );

        let completions = self.dispatcher.run(&transition.effects).await;

        Ok(StateTransitionResult {
            state: transition.state,
            effects: transition.effects,
            completions,
        })
    }

    /// Handle an intent, then keep feeding backend completions back in as
    /// `agent_result` intents until the system is quiescent.
    ///
    /// This is how the CLI drives a whole planning or execution round in
    /// one call.
    pub async fn run_to_quiescence(&self, intent: &Intent) -> Result<ProjectState> {
        let mut result = self.handle_intent(intent).await?;
        let mut queue: Vec<AgentResult> = result.completions;

        while let Some(completion) = queue.pop() {
            let feed = Intent::AgentResult { result: completion };
            result = self.handle_intent(&feed).await?;
            queue.extend(result.completions);
        }

        Ok(result.state)
    }
}
