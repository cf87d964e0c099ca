//! Tabular export of every entity.
//!
//! The document always holds the same four sections in the same order, each
//! with a title row and a column row. Data rows follow ascending id.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::entity::{Group, Period, Task, TimeEntry};

pub const GROUPS_TITLE: &str = "Groups";
pub const TASKS_TITLE: &str = "Tasks";
pub const ENTRIES_TITLE: &str = "Time Entries";
pub const PERIODS_TITLE: &str = "Academic Periods";

const GROUP_COLUMNS: &[&str] = &["ID", "Name"];
const TASK_COLUMNS: &[&str] = &["ID", "Name", "Group ID"];
const ENTRY_COLUMNS: &[&str] = &[
    "ID",
    "Task ID",
    "Start Time",
    "End Time",
    "Duration",
    "Note",
    "Period ID",
];
const PERIOD_COLUMNS: &[&str] = &["ID", "Name", "Start Date", "End Date"];

/// One titled table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Section {
    pub title: &'static str,
    pub columns: &'static [&'static str],
    pub rows: Vec<Vec<String>>,
}

impl Section {
    fn new(title: &'static str, columns: &'static [&'static str]) -> Self {
        Self {
            title,
            columns,
            rows: Vec::new(),
        }
    }
}

/// Groups, tasks, time entries and periods, in that order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportDocument {
    pub sections: Vec<Section>,
}

impl ExportDocument {
    /// Flattens the document into rows: title, columns, data, and one empty
    /// row between sections.
    pub fn rows(&self) -> Vec<Vec<String>> {
        let mut rows = Vec::new();
        for (index, section) in self.sections.iter().enumerate() {
            if index > 0 {
                rows.push(Vec::new());
            }
            rows.push(vec![section.title.to_string()]);
            rows.push(section.columns.iter().map(ToString::to_string).collect());
            rows.extend(section.rows.iter().cloned());
        }
        rows
    }
}

fn timestamp(value: chrono::DateTime<chrono::Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn optional<T: ToString>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Builds the export document. Inputs may arrive in any order.
pub fn build(
    groups: &[Group],
    tasks: &[Task],
    entries: &[TimeEntry],
    periods: &[Period],
) -> ExportDocument {
    let mut group_section = Section::new(GROUPS_TITLE, GROUP_COLUMNS);
    let mut sorted: Vec<&Group> = groups.iter().collect();
    sorted.sort_by_key(|g| g.id);
    group_section.rows = sorted
        .into_iter()
        .map(|g| vec![g.id.to_string(), g.name.to_string()])
        .collect();

    let mut task_section = Section::new(TASKS_TITLE, TASK_COLUMNS);
    let mut sorted: Vec<&Task> = tasks.iter().collect();
    sorted.sort_by_key(|t| t.id);
    task_section.rows = sorted
        .into_iter()
        .map(|t| vec![t.id.to_string(), t.name.to_string(), t.group_id.to_string()])
        .collect();

    let mut entry_section = Section::new(ENTRIES_TITLE, ENTRY_COLUMNS);
    let mut sorted: Vec<&TimeEntry> = entries.iter().collect();
    sorted.sort_by_key(|e| e.id);
    entry_section.rows = sorted
        .into_iter()
        .map(|e| {
            vec![
                e.id.to_string(),
                e.task_id.to_string(),
                timestamp(e.start_time),
                optional(e.end_time.map(timestamp)),
                optional(e.duration),
                e.note.clone().unwrap_or_default(),
                optional(e.period_id),
            ]
        })
        .collect();

    let mut period_section = Section::new(PERIODS_TITLE, PERIOD_COLUMNS);
    let mut sorted: Vec<&Period> = periods.iter().collect();
    sorted.sort_by_key(|p| p.id);
    period_section.rows = sorted
        .into_iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                p.name.to_string(),
                p.start_date.format("%Y-%m-%d").to_string(),
                p.end_date.format("%Y-%m-%d").to_string(),
            ]
        })
        .collect();

    ExportDocument {
        sections: vec![group_section, task_section, entry_section, period_section],
    }
}
