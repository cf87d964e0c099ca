//! Report command for group-wise and task-wise time totals.
//!
//! `att report` sums closed time entries per group (default) or per task,
//! optionally restricted to one academic period and, per task, to one group.

use std::fmt::Display;
use std::io::Write;

use anyhow::{Result, bail};
use att_core::{
    Aggregation, GroupId, PeriodId, Store, TaskScope, TimeTotal, Tracker, format_duration,
    format_share,
};
use clap::{Args, ValueEnum};

use super::util::{write_json, write_table};

const FUTURE_PERIOD: &str = "This period is in the future";
const NO_DATA: &str = "No data available";

/// What the report groups time by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportBy {
    Group,
    Task,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Aggregate per group or per task.
    #[arg(long, value_enum, default_value_t = ReportBy::Group)]
    pub by: ReportBy,

    /// Only count entries tagged with this period.
    #[arg(long)]
    pub period: Option<PeriodId>,

    /// Only count tasks of this group (requires `--by task`).
    #[arg(long)]
    pub group: Option<GroupId>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

pub fn run<W: Write, S: Store>(writer: &mut W, tracker: &Tracker<S>, args: &ReportArgs) -> Result<()> {
    match args.by {
        ReportBy::Group => {
            if args.group.is_some() {
                bail!("--group requires --by task");
            }
            let result = tracker.time_by_group(args.period)?;
            if args.json {
                return write_json(writer, &result);
            }
            let heading = heading(tracker, "group", args)?;
            write_totals(writer, &heading, &result)
        }
        ReportBy::Task => {
            let result = tracker.time_by_task(TaskScope {
                group_id: args.group,
                period_id: args.period,
            })?;
            if args.json {
                return write_json(writer, &result);
            }
            let heading = heading(tracker, "task", args)?;
            write_totals(writer, &heading, &result)
        }
    }
}

/// `Time by task (Work, Fall 2025)`. Scope names are looked up only after
/// aggregation has validated the ids.
fn heading<S: Store>(tracker: &Tracker<S>, unit: &str, args: &ReportArgs) -> Result<String> {
    let mut scope = Vec::new();
    if let Some(group_id) = args.group {
        scope.push(tracker.group(group_id)?.name.to_string());
    }
    match args.period {
        Some(period_id) => scope.push(tracker.period(period_id)?.name.to_string()),
        None => scope.push("all time".to_string()),
    }
    Ok(format!("Time by {unit} ({})", scope.join(", ")))
}

fn write_totals<W: Write, I: Display>(
    writer: &mut W,
    heading: &str,
    result: &Aggregation<TimeTotal<I>>,
) -> Result<()> {
    let records = match result {
        Aggregation::FuturePeriod { .. } => {
            writeln!(writer, "{FUTURE_PERIOD}")?;
            return Ok(());
        }
        Aggregation::Totals { records } if records.is_empty() => {
            writeln!(writer, "{NO_DATA}")?;
            return Ok(());
        }
        Aggregation::Totals { records } => records,
    };

    let total: i64 = records.iter().map(|r| r.total_time).sum();
    let rows: Vec<Vec<String>> = records
        .iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.name.to_string(),
                format_duration(r.total_time),
                format_share(r.total_time, total),
            ]
        })
        .collect();

    writeln!(writer, "{heading}")?;
    write_table(writer, &["ID", "Name", "Total", "Share"], &rows)?;
    writeln!(writer, "Total: {}", format_duration(total))?;
    Ok(())
}
