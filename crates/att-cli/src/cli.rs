//! Command-line argument definitions.

use std::path::PathBuf;

use att_core::{EntryId, GroupId, PeriodId, TaskId};
use clap::{Parser, Subcommand};

use crate::commands::report::ReportArgs;

/// Academic time tracker.
///
/// Organizes work into groups and tasks, times one session at a time and
/// reports totals per group or task, optionally per academic period.
#[derive(Debug, Parser)]
#[command(name = "att", version, about, long_about = None)]
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
    /// Manage groups.
    #[command(subcommand)]
    Group(GroupAction),

    /// Manage tasks.
    #[command(subcommand)]
    Task(TaskAction),

    /// Manage academic periods.
    #[command(subcommand)]
    Period(PeriodAction),

    /// Inspect or delete time entries.
    #[command(subcommand)]
    Entry(EntryAction),

    /// Start timing a task.
    Start {
        /// Task to time.
        task_id: TaskId,
    },

    /// Stop the running timer.
    Stop {
        /// Note stored on the time entry.
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Stop the running timer, or start one on the task when idle.
    Toggle {
        /// Task to time when no timer is running.
        task_id: TaskId,

        /// Note stored when a running timer is stopped.
        #[arg(short, long)]
        note: Option<String>,
    },

    /// Show the running timer.
    Status,

    /// Report time per group or task.
    Report(ReportArgs),

    /// Export everything to a CSV file.
    Export {
        /// Destination file.
        path: PathBuf,
    },

    /// Snapshot the database into the backup directory.
    Backup,

    /// Replace the database with a backup.
    Restore {
        /// Backup file to restore.
        file: PathBuf,
    },
}

#[derive(Debug, Subcommand)]
pub enum GroupAction {
    /// Create a group.
    Add {
        /// Group name.
        name: String,
    },
    /// List groups.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete a group with its tasks and time entries.
    Delete { id: GroupId },
}

#[derive(Debug, Subcommand)]
pub enum TaskAction {
    /// Create a task in a group.
    Add {
        group_id: GroupId,
        /// Task name.
        name: String,
    },
    /// List the tasks of a group with their totals.
    List {
        group_id: GroupId,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete a task with its time entries.
    Delete { id: TaskId },
}

#[derive(Debug, Subcommand)]
pub enum PeriodAction {
    /// Create a period (dates as YYYY-MM-DD, both inclusive).
    Add {
        name: String,
        start: String,
        end: String,
    },
    /// List periods.
    List {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete a period. Entries keep their period tag.
    Delete { id: PeriodId },
}

#[derive(Debug, Subcommand)]
pub enum EntryAction {
    /// List the time entries of a task.
    List {
        task_id: TaskId,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Delete a time entry.
    Delete { id: EntryId },
}
