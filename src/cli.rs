//! Command-line interface definitions

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Local, human-in-the-loop agent orchestrator
#[derive(Debug, Parser)]
#[command(name = "helmsman", version, about)]
pub struct Cli {
    /// Path to a config file (default: .helmsman.yml, then user config dir)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create a project and start the first planning round
    Init {
        /// The project goal
        goal: String,

        /// Project identifier (generated when omitted)
        #[arg(long)]
        project_id: Option<String>,

        /// Target customer profile
        #[arg(long)]
        icp: Option<String>,

        /// Tech stack entry (repeatable)
        #[arg(long = "tech")]
        tech_stack: Vec<String>,

        /// Constraint (repeatable)
        #[arg(long = "constraint")]
        constraints: Vec<String>,

        /// Core feature (repeatable)
        #[arg(long = "feature")]
        core_features: Vec<String>,
    },

    /// Answer the open clarification
    Answer {
        /// Clarification id (defaults to the most recent open record)
        #[arg(long)]
        clarification_id: Option<String>,

        /// Answers, index-aligned with the questions
        answers: Vec<String>,
    },

    /// Close scoping and request the final plan
    Finalize {
        #[arg(long)]
        note: Option<String>,
    },

    /// Adopt the proposed plan
    ApprovePlan {
        /// Approval id (defaults to the pending plan approval)
        #[arg(long)]
        approval_id: Option<String>,

        /// Plan id (defaults to the approval's plan)
        #[arg(long)]
        plan_id: Option<String>,
    },

    /// Consume a pending execution-start or execution-retry approval
    ApproveExecution {
        /// Approval id (defaults to the pending execution approval)
        #[arg(long)]
        approval_id: Option<String>,
    },

    /// Dispatch pending execution tasks
    Run {
        /// Task ids (all pending execution tasks when omitted)
        task_ids: Vec<String>,
    },

    /// Reset failed tasks and dispatch them again
    Retry {
        /// Task ids (all failed execution tasks when omitted)
        task_ids: Vec<String>,
    },

    /// Pause execution
    Pause {
        #[arg(long)]
        reason: Option<String>,
    },

    /// Start a fresh planning round
    Replan {
        #[arg(long)]
        reason: Option<String>,
    },

    /// Plan an additional feature
    AddFeature {
        /// What to add
        description: String,
    },

    /// Show project status
    Status {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Open the read-only dashboard
    Tui,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

/// Log file location under the platform data dir.
pub fn log_path() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("helmsman")
        .join("logs")
        .join("helmsman.log")
}
