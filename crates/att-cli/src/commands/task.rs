//! Task management commands.

use std::io::Write;

use anyhow::Result;
use att_core::{Store, Tracker, format_duration};

use super::util::{write_json, write_table};
use crate::cli::TaskAction;

pub fn run<W: Write, S: Store>(
    writer: &mut W,
    tracker: &Tracker<S>,
    action: &TaskAction,
) -> Result<()> {
    match action {
        TaskAction::Add { group_id, name } => {
            let task = tracker.create_task(*group_id, name)?;
            writeln!(
                writer,
                "Created task {} in group {}: {}",
                task.id, task.group_id, task.name
            )?;
        }
        TaskAction::List { group_id, json } => {
            let summaries = tracker.task_summaries(*group_id)?;
            if *json {
                return write_json(writer, &summaries);
            }
            if summaries.is_empty() {
                writeln!(writer, "No tasks.")?;
                return Ok(());
            }
            let rows: Vec<Vec<String>> = summaries
                .iter()
                .map(|s| {
                    vec![
                        s.id.to_string(),
                        s.name.to_string(),
                        format_duration(s.total_seconds),
                        format!("{:.2}", s.total_hours),
                        format!("{:.2}", s.hours_per_week),
                    ]
                })
                .collect();
            write_table(
                writer,
                &["ID", "Name", "Total", "Hours", "Hours/Week"],
                &rows,
            )?;
        }
        TaskAction::Delete { id } => {
            tracker.delete_task(*id)?;
            writeln!(writer, "Deleted task {id}")?;
        }
    }
    Ok(())
}
