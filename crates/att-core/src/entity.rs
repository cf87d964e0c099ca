//! Groups, tasks, academic periods and time entries.
//!
//! These are plain records. Construction of the `New*` inputs performs all
//! validation so a store never sees an empty name or an inverted date range.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{EntryId, GroupId, Name, PeriodId, TaskId, ValidationError, parse_date};

/// Top-level category owning tasks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: GroupId,
    pub name: Name,
}

/// Unit of work tracked under a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub name: Name,
    pub group_id: GroupId,
}

/// Named date range used to scope aggregation and tag entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub id: PeriodId,
    pub name: Name,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl Period {
    /// Whether `date` falls inside the inclusive range.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }
}

/// One open-or-closed timed session against a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeEntry {
    pub id: EntryId,
    pub task_id: TaskId,
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds; present only once the entry is closed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_id: Option<PeriodId>,
}

impl TimeEntry {
    pub const fn is_open(&self) -> bool {
        self.end_time.is_none()
    }

    /// Duration in seconds for a closed entry, `None` while open.
    pub const fn closed_duration(&self) -> Option<i64> {
        match (self.end_time, self.duration) {
            (Some(_), Some(seconds)) => Some(seconds),
            _ => None,
        }
    }
}

/// Whole seconds between two instants, never negative.
///
/// A clock that moved backwards yields zero.
pub fn clamped_duration(start: DateTime<Utc>, end: DateTime<Utc>) -> i64 {
    (end - start).num_seconds().max(0)
}

/// Input for creating a group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGroup {
    pub name: Name,
}

impl NewGroup {
    pub fn new(name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            name: Name::new(name, "group name")?,
        })
    }
}

/// Input for creating a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: Name,
    pub group_id: GroupId,
}

impl NewTask {
    pub fn new(group_id: GroupId, name: impl Into<String>) -> Result<Self, ValidationError> {
        Ok(Self {
            name: Name::new(name, "task name")?,
            group_id,
        })
    }
}

/// Input for creating an academic period.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPeriod {
    pub name: Name,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl NewPeriod {
    pub fn new(
        name: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ValidationError> {
        let name = Name::new(name, "period name")?;
        if start_date > end_date {
            return Err(ValidationError::InvertedDateRange {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            name,
            start_date,
            end_date,
        })
    }

    /// Builds a period from raw `YYYY-MM-DD` strings.
    ///
    /// Every field is required.
    pub fn parse(name: &str, start_date: &str, end_date: &str) -> Result<Self, ValidationError> {
        if start_date.trim().is_empty() {
            return Err(ValidationError::Missing {
                field: "start date",
            });
        }
        if end_date.trim().is_empty() {
            return Err(ValidationError::Missing { field: "end date" });
        }
        let start = parse_date(start_date, "start date")?;
        let end = parse_date(end_date, "end date")?;
        Self::new(name, start, end)
    }
}

/// An entry opened by `start`, before the store assigns its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub task_id: TaskId,
    pub start_time: DateTime<Utc>,
    pub period_id: Option<PeriodId>,
}

/// The closing half of a session, computed by the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClosedSession {
    pub end_time: DateTime<Utc>,
    pub duration: i64,
    pub note: String,
}
