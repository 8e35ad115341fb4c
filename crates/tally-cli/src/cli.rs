//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use tally_core::TagMode;

/// Time-entry tracker.
///
/// Records time entries against tasks and projects and keeps their tracked
/// totals in sync.
#[derive(Debug, Parser)]
#[command(name = "tally", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a finished entry from a start time and a duration.
    Create(CreateArgs),

    /// Start a timer now.
    Start(StartArgs),

    /// Stop a running timer.
    Stop(StopArgs),

    /// Edit one or more entries (comma-separated ids).
    Update(UpdateArgs),

    /// Delete an entry.
    Delete(DeleteArgs),

    /// Add or remove tags on one or more entries (comma-separated ids).
    Tag(TagArgs),

    /// Show one entry.
    Show(ShowArgs),

    /// List running timers.
    Running(RunningArgs),

    /// List entries created within a time range.
    Range(RangeArgs),

    /// Show the dashboard: last week's shortest entries and recent activity.
    Dash(OutputArgs),

    /// Recompute tracked totals.
    #[command(subcommand)]
    Sync(SyncTarget),

    /// Manage tasks.
    #[command(subcommand)]
    Tasks(TasksAction),

    /// Manage projects.
    #[command(subcommand)]
    Projects(ProjectsAction),
}

/// Output selection shared by every command.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct OutputArgs {
    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Fields describing a new entry.
#[derive(Debug, Clone, Default, Args)]
pub struct EntryArgs {
    /// Free-text description.
    #[arg(short, long)]
    pub description: Option<String>,

    /// Workspace ID (defaults to `workspace_id` from config).
    #[arg(long)]
    pub workspace: Option<String>,

    /// Project ID.
    #[arg(short, long)]
    pub project: Option<String>,

    /// Task ID.
    #[arg(short, long)]
    pub task: Option<String>,

    /// Mark the entry billable.
    #[arg(long)]
    pub billable: bool,

    /// Tags, comma-separated.
    #[arg(long, value_delimiter = ',')]
    pub tags: Vec<String>,

    /// Only the duration is meaningful, not the start time.
    #[arg(long)]
    pub duration_only: bool,

    /// Client label (defaults to `created_with` from config).
    #[arg(long)]
    pub created_with: Option<String>,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    #[command(flatten)]
    pub entry: EntryArgs,

    /// Start time (ISO 8601 or relative, e.g. "2 hours ago").
    #[arg(long)]
    pub start: String,

    /// Duration in seconds.
    #[arg(long, allow_negative_numbers = true)]
    pub duration: i64,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct StartArgs {
    #[command(flatten)]
    pub entry: EntryArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct StopArgs {
    /// Entry ID.
    pub id: String,

    /// Stop time instead of now (ISO 8601 or relative).
    #[arg(long)]
    pub at: Option<String>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Entry IDs, comma-separated.
    pub ids: String,

    #[arg(short, long)]
    pub description: Option<String>,

    #[arg(long)]
    pub workspace: Option<String>,

    /// Project ID (empty to clear).
    #[arg(short, long)]
    pub project: Option<String>,

    /// Task ID (empty to clear).
    #[arg(short, long)]
    pub task: Option<String>,

    #[arg(long)]
    pub billable: Option<bool>,

    /// New start time (ISO 8601 or relative).
    #[arg(long)]
    pub start: Option<String>,

    /// New stop time (ISO 8601 or relative).
    #[arg(long)]
    pub stop: Option<String>,

    /// Replacement tag set, comma-separated.
    #[arg(long, value_delimiter = ',')]
    pub tags: Option<Vec<String>>,

    #[arg(long)]
    pub duration_only: Option<bool>,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Entry ID.
    pub id: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct TagArgs {
    /// Entry IDs, comma-separated.
    pub ids: String,

    /// Tags, comma-separated.
    #[arg(value_delimiter = ',', required = true)]
    pub tags: Vec<String>,

    /// Whether to add or remove the tags.
    #[arg(long, default_value = "add")]
    pub mode: TagMode,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Entry ID.
    pub id: String,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// 1-based paging.
#[derive(Debug, Clone, Copy, Args)]
pub struct PageArgs {
    #[arg(long, default_value_t = 1)]
    pub page: u32,

    #[arg(long, default_value_t = 50)]
    pub page_size: u32,
}

#[derive(Debug, Args)]
pub struct RunningArgs {
    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

#[derive(Debug, Args)]
pub struct RangeArgs {
    /// Range start (ISO 8601 or relative).
    #[arg(long)]
    pub from: String,

    /// Range end (ISO 8601 or relative, defaults to now).
    #[arg(long)]
    pub to: Option<String>,

    #[command(flatten)]
    pub page: PageArgs,

    #[command(flatten)]
    pub output: OutputArgs,
}

/// Aggregate to recompute.
#[derive(Debug, Subcommand)]
pub enum SyncTarget {
    /// Recompute a task's tracked seconds.
    Task {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Recompute a project's estimated hours.
    Project {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum TasksAction {
    /// Create a task.
    Add {
        /// Task name.
        name: String,
        /// Owning project ID.
        #[arg(short, long)]
        project: Option<String>,
        /// Use this ID instead of generating one.
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show a task and its tracked time.
    Show {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Debug, Subcommand)]
pub enum ProjectsAction {
    /// Create a project.
    Add {
        /// Project name.
        name: String,
        /// Workspace ID (defaults to `workspace_id` from config).
        #[arg(long)]
        workspace: Option<String>,
        /// Keep `estimated_hours` in sync with tracked time.
        #[arg(long)]
        auto_estimates: bool,
        /// Use this ID instead of generating one.
        #[arg(long)]
        id: Option<String>,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Show a project and its estimate.
    Show {
        id: String,
        #[command(flatten)]
        output: OutputArgs,
    },
}
