//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `conductor`.
#[derive(Debug, Parser)]
#[command(name = "conductor", version, about = "Schedule plan tasks and gate agent handbacks")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Selects the plan a command operates on.
#[derive(Debug, Args)]
pub struct PlanArg {
    /// Plan ID. May be omitted when the store holds exactly one plan.
    #[arg(long = "plan", value_name = "ID")]
    pub id: Option<String>,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Build an execution plan from a project plan YAML file.
    Submit {
        /// Path to the project plan.
        file: PathBuf,
        /// Skip acceptance- and success-criterion tasks.
        #[arg(long)]
        no_criteria: bool,
        /// Skip user- and developer-story tasks.
        #[arg(long)]
        no_stories: bool,
        /// Start execution immediately.
        #[arg(long)]
        start: bool,
    },
    /// Print the execution order.
    Order {
        #[command(flatten)]
        plan: PlanArg,
    },
    /// List ready tasks, highest priority first.
    Next {
        #[command(flatten)]
        plan: PlanArg,
        /// Maximum number of tasks to list.
        #[arg(long, default_value_t = 5)]
        limit: usize,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Show plan progress.
    Status {
        #[command(flatten)]
        plan: PlanArg,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// List tasks waiting on dependencies or frozen by a block.
    Blocked {
        #[command(flatten)]
        plan: PlanArg,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Start (or restart) execution of a draft or paused plan.
    Start {
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Pause an active plan.
    Pause {
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Resume a paused plan.
    Resume {
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Cancel a plan and every unfinished task.
    Cancel {
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Set a task's status.
    Update {
        /// Task ID.
        task: String,
        /// New status (pending, ready, in-progress, blocked, completed, cancelled).
        status: String,
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Block a task and everything downstream of it.
    Block {
        /// Task ID.
        task: String,
        /// Why the task is blocked.
        #[arg(long)]
        reason: Option<String>,
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Place a manual hold on a task.
    Hold {
        /// Task ID.
        task: String,
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Remove a manual hold and re-evaluate the task's block.
    Release {
        /// Task ID.
        task: String,
        #[command(flatten)]
        plan: PlanArg,
    },
    /// Explain why a task is blocked.
    Why {
        /// Task ID.
        task: String,
        #[command(flatten)]
        plan: PlanArg,
        /// Print JSON instead of text.
        #[arg(long)]
        json: bool,
    },
    /// Validate an agent's outcome report and apply the decision.
    Handback {
        /// Work order the agent was given (YAML).
        #[arg(long = "order", value_name = "FILE")]
        order: PathBuf,
        /// Outcome report the agent returned (YAML).
        #[arg(long = "outcome", value_name = "FILE")]
        outcome: PathBuf,
        #[command(flatten)]
        plan: PlanArg,
        /// Print the validation result as JSON.
        #[arg(long)]
        json: bool,
    },
}
