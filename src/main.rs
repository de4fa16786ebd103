//! Helmsman CLI entry point

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use eyre::{Context, Result, bail};
use tracing::info;

use helmsman::agents::{LlmPlanner, ProcessExecutor};
use helmsman::cli::{Cli, Command, OutputFormat, log_path};
use helmsman::config::Config;
use helmsman::dispatch::{Dispatcher, LogApprovalSink};
use helmsman::domain::{ApprovalKind, Phase, ProjectContext, ProjectState};
use helmsman::machine::Intent;
use helmsman::orchestrator::Orchestrator;
use helmsman::prompts::PromptLoader;
use helmsman::store::{JsonFileStore, ProjectStore};
use helmsman::{llm, tui};

fn setup_logging(verbose: bool) -> Result<()> {
    let log_file = log_path();
    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir).context("Failed to create log directory")?;
    }

    // Logs go to a file, never stdout: the dashboard owns the terminal
    let level = if verbose { tracing::Level::DEBUG } else { tracing::Level::INFO };
    let writer = fs::File::create(&log_file).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()),
        )
        .init();

    info!("Logging initialized (verbose: {})", verbose);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    match cli.command {
        Some(Command::Init {
            goal,
            project_id,
            icp,
            tech_stack,
            constraints,
            core_features,
        }) => {
            cmd_init(&config, goal, project_id, icp, tech_stack, constraints, core_features).await
        }
        Some(Command::Answer {
            clarification_id,
            answers,
        }) => cmd_answer(&config, clarification_id, answers).await,
        Some(Command::Finalize { note }) => {
            cmd_intent(&config, Intent::FinalizeScope { note }).await
        }
        Some(Command::ApprovePlan {
            approval_id,
            plan_id,
        }) => cmd_approve_plan(&config, approval_id, plan_id).await,
        Some(Command::ApproveExecution { approval_id }) => {
            cmd_approve_execution(&config, approval_id).await
        }
        Some(Command::Run { task_ids }) => {
            let task_ids = if task_ids.is_empty() { None } else { Some(task_ids) };
            cmd_intent(&config, Intent::RunTasks { task_ids }).await
        }
        Some(Command::Retry { task_ids }) => {
            let task_ids = if task_ids.is_empty() { None } else { Some(task_ids) };
            cmd_intent(&config, Intent::RetryTasks { task_ids }).await
        }
        Some(Command::Pause { reason }) => {
            cmd_intent(&config, Intent::PauseExecution { reason }).await
        }
        Some(Command::Replan { reason }) => cmd_intent(&config, Intent::Replan { reason }).await,
        Some(Command::AddFeature { description }) => {
            cmd_intent(&config, Intent::AddFeature { description }).await
        }
        Some(Command::Status { format }) => cmd_status(&config, format).await,
        Some(Command::Tui) => tui::run(&config.storage.state_file).await,
        None => {
            cmd_status(&config, OutputFormat::Text).await
        }
    }
}

/// Wire the full stack: store, planner, executor, dispatcher, façade.
fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let llm_client = llm::create_client(&config.llm).context("Failed to create LLM client")?;
    let prompts = Arc::new(
        PromptLoader::new(config.storage.prompts_dir.as_deref())
            .context("Failed to load prompt templates")?,
    );
    let planner = Arc::new(LlmPlanner::new(
        llm_client,
        prompts,
        config.orchestrator.planner_mode,
        config.llm.max_tokens,
    ));
    let executor = Arc::new(ProcessExecutor::new(&config.orchestrator.executor_command));
    let dispatcher = Dispatcher::new(planner, executor, Arc::new(LogApprovalSink));
    let store = Arc::new(JsonFileStore::new(&config.storage.state_file));
    Ok(Orchestrator::new(store, dispatcher))
}

#[allow(clippy::too_many_arguments)]
async fn cmd_init(
    config: &Config,
    goal: String,
    project_id: Option<String>,
    icp: Option<String>,
    tech_stack: Vec<String>,
    constraints: Vec<String>,
    core_features: Vec<String>,
) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    if orchestrator.initialize().await?.is_some() {
        bail!(
            "a project already exists in {}; use `helmsman replan` or `helmsman add-feature`",
            config.storage.state_file.display()
        );
    }

    let context = if icp.is_some()
        || !tech_stack.is_empty()
        || !constraints.is_empty()
        || !core_features.is_empty()
    {
        Some(ProjectContext {
            icp,
            tech_stack,
            constraints,
            core_features,
        })
    } else {
        None
    };

    let intent = Intent::CreateProject {
        project_id: project_id.unwrap_or_else(|| format!("project-{}", uuid::Uuid::now_v7())),
        goal,
        context,
        settings: Some(config.settings()),
    };

    let state = orchestrator.run_to_quiescence(&intent).await?;
    print_status(&state);
    Ok(())
}

async fn cmd_answer(
    config: &Config,
    clarification_id: Option<String>,
    answers: Vec<String>,
) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let Some(state) = orchestrator.initialize().await? else {
        bail!("no project found; run `helmsman init <goal>` first");
    };

    let clarification_id = match clarification_id {
        Some(id) => id,
        None => state
            .clarifications
            .iter()
            .rev()
            .find(|c| !c.is_answered())
            .map(|c| c.id.clone())
            .ok_or_else(|| eyre::eyre!("no open clarification to answer"))?,
    };

    let intent = Intent::AnswerClarifications {
        clarification_id,
        answers,
    };
    let state = orchestrator.run_to_quiescence(&intent).await?;
    print_status(&state);
    Ok(())
}

async fn cmd_approve_plan(
    config: &Config,
    approval_id: Option<String>,
    plan_id: Option<String>,
) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let Some(state) = orchestrator.initialize().await? else {
        bail!("no project found; run `helmsman init <goal>` first");
    };

    let approval = state
        .approvals
        .iter()
        .find(|a| {
            a.kind == ApprovalKind::Plan
                && approval_id.as_ref().is_none_or(|id| &a.id == id)
        })
        .ok_or_else(|| eyre::eyre!("no pending plan approval"))?;

    let plan_id = match plan_id.or_else(|| approval.plan_id.clone()) {
        Some(id) => id,
        None => bail!("approval {} does not reference a plan", approval.id),
    };

    let intent = Intent::ApprovePlan {
        approval_id: approval.id.clone(),
        plan_id,
    };
    let state = orchestrator.run_to_quiescence(&intent).await?;
    print_status(&state);
    Ok(())
}

async fn cmd_approve_execution(config: &Config, approval_id: Option<String>) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    let Some(state) = orchestrator.initialize().await? else {
        bail!("no project found; run `helmsman init <goal>` first");
    };

    let approval_id = match approval_id {
        Some(id) => id,
        None => state
            .approvals
            .iter()
            .find(|a| a.blocks_execution())
            .map(|a| a.id.clone())
            .ok_or_else(|| eyre::eyre!("no pending execution approval"))?,
    };

    let intent = Intent::ApproveExecution { approval_id };
    let state = orchestrator.run_to_quiescence(&intent).await?;
    print_status(&state);
    Ok(())
}

/// Shared body for intents that need no argument resolution.
async fn cmd_intent(config: &Config, intent: Intent) -> Result<()> {
    let orchestrator = build_orchestrator(config)?;
    if orchestrator.initialize().await?.is_none() {
        bail!("no project found; run `helmsman init <goal>` first");
    }
    let state = orchestrator.run_to_quiescence(&intent).await?;
    print_status(&state);
    Ok(())
}

async fn cmd_status(config: &Config, format: OutputFormat) -> Result<()> {
    let store = JsonFileStore::new(PathBuf::from(&config.storage.state_file));
    let Some(state) = store.load().await? else {
        println!("No project in {}. Run `helmsman init <goal>`.", config.storage.state_file.display());
        return Ok(());
    };

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&state)?);
        }
        OutputFormat::Text => print_status(&state),
    }
    Ok(())
}

/// Human-readable project summary with next-step hints.
fn print_status(state: &ProjectState) {
    println!("Project: {}", state.project_id);
    if let Some(goal) = &state.goal {
        println!("Goal: {}", goal);
    }
    println!("Phase: {} (v{})", state.phase, state.version);

    match state.phase {
        Phase::AwaitingClarification => {
            for clarification in state.clarifications.iter().filter(|c| !c.is_answered()) {
                for question in &clarification.questions {
                    println!();
                    println!("Planner asks: {}", question);
                }
                println!("Answer with: helmsman answer \"<answer>\"");
            }
        }
        Phase::AwaitingApproval => {
            for approval in &state.approvals {
                if approval.kind != ApprovalKind::Plan {
                    continue;
                }
                if let Some(plan) = approval.plan_id.as_ref().and_then(|id| state.plans.get(id)) {
                    println!();
                    println!("Proposed plan {} ({} tasks):", plan.id, plan.tasks.len());
                    for task in &plan.tasks {
                        println!("  - [{}] {}", task.role, task.title);
                    }
                    if let Some(rationale) = &plan.rationale {
                        println!("  Rationale: {}", rationale);
                    }
                }
                println!("Approve with: helmsman approve-plan");
            }
        }
        Phase::AwaitingExecutionApproval => {
            println!("Execution is gated. Approve with: helmsman approve-execution");
        }
        _ => {}
    }

    if let Some(execution) = &state.execution {
        println!();
        println!(
            "Execution: {}/{} completed, {} failed, {} in progress",
            execution.summary.completed,
            execution.summary.total,
            execution.summary.failed,
            execution.summary.in_progress
        );
        for failure in &execution.failures {
            println!("  failed: {} ({})", failure.task_id, failure.reason);
        }
    }
}
