//! Time entry commands.

use std::io::Write;

use anyhow::Result;
use att_core::{Store, TimeEntry, Tracker, format_duration};

use super::util::{write_json, write_table};
use crate::cli::EntryAction;

fn entry_row(entry: &TimeEntry) -> Vec<String> {
    vec![
        entry.id.to_string(),
        entry.start_time.date_naive().to_string(),
        entry
            .closed_duration()
            .map_or_else(|| "running".to_string(), format_duration),
        entry.period_id.map(|id| id.to_string()).unwrap_or_default(),
        entry.note.clone().unwrap_or_default(),
    ]
}

pub fn run<W: Write, S: Store>(
    writer: &mut W,
    tracker: &Tracker<S>,
    action: &EntryAction,
) -> Result<()> {
    match action {
        EntryAction::List { task_id, json } => {
            let entries = tracker.entries(*task_id)?;
            if *json {
                return write_json(writer, &entries);
            }
            if entries.is_empty() {
                writeln!(writer, "No time entries.")?;
                return Ok(());
            }
            let rows: Vec<Vec<String>> = entries.iter().map(entry_row).collect();
            write_table(
                writer,
                &["ID", "Date", "Duration", "Period", "Note"],
                &rows,
            )?;
        }
        EntryAction::Delete { id } => {
            tracker.delete_entry(*id)?;
            writeln!(writer, "Deleted time entry {id}")?;
        }
    }
    Ok(())
}
