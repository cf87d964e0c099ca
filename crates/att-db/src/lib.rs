//! Storage layer for the academic time tracker.
//!
//! Provides a `rusqlite` implementation of [`att_core::Store`].
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! Share it across threads through [`att_core::Tracker`], which serializes
//! access behind a mutex.
//!
//! # Schema
//!
//! Ids are `INTEGER PRIMARY KEY AUTOINCREMENT`, so a deleted id is never
//! handed out again. Tasks reference groups and time entries reference tasks
//! with `ON DELETE CASCADE`. `time_entries.period_id` carries no foreign key:
//! deleting a period leaves the tag on its entries.
//!
//! ## Timestamp Format
//!
//! Timestamps are stored as TEXT in RFC 3339 UTC with milliseconds
//! (e.g. `2025-10-01T09:00:00.000Z`), so lexicographic order matches
//! chronological order. Period bounds are stored as `YYYY-MM-DD`.
//!
//! ## Single open entry
//!
//! A partial unique index over `end_time IS NULL` admits at most one open
//! entry, backing up the timer's own check.

use std::path::{Path, PathBuf};

use att_core::{
    ClosedSession, EntryId, Group, GroupId, GroupTotal, Name, NewEntry, NewGroup, NewPeriod,
    NewTask, Period, PeriodId, Store, Task, TaskId, TaskScope, TaskTotal, TimeEntry,
    ValidationError,
};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Params, Row, params};
use thiserror::Error;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Tables a tracker database must contain.
const REQUIRED_TABLES: &[&str] = &["groups", "tasks", "time_entries", "academic_periods"];

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Failed to parse a stored entry timestamp.
    #[error("invalid timestamp for time entry {entry_id}: {timestamp}")]
    TimestampParse {
        entry_id: i64,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
    /// Failed to parse a stored period date.
    #[error("invalid date for period {period_id}: {date}")]
    DateParse {
        period_id: i64,
        date: String,
        #[source]
        source: chrono::ParseError,
    },
    /// A file offered for restore is not a tracker database.
    #[error("{} is not a valid backup: {reason}", path.display())]
    InvalidBackup { path: PathBuf, reason: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        tracing::debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        self.conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS groups (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                group_id INTEGER NOT NULL,
                FOREIGN KEY (group_id) REFERENCES groups(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_tasks_group ON tasks(group_id);

            CREATE TABLE IF NOT EXISTS academic_periods (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                start_date TEXT NOT NULL,
                end_date TEXT NOT NULL
            );

            -- start_time/end_time: RFC 3339 UTC (e.g. '2025-10-01T09:00:00.000Z')
            -- duration: whole seconds, set when the entry is closed
            CREATE TABLE IF NOT EXISTS time_entries (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL,
                start_time TEXT NOT NULL,
                end_time TEXT,
                duration INTEGER,
                note TEXT,
                period_id INTEGER,
                FOREIGN KEY (task_id) REFERENCES tasks(id) ON DELETE CASCADE
            );

            CREATE INDEX IF NOT EXISTS idx_time_entries_task ON time_entries(task_id);
            CREATE INDEX IF NOT EXISTS idx_time_entries_period ON time_entries(period_id);
            CREATE UNIQUE INDEX IF NOT EXISTS idx_time_entries_single_open
                ON time_entries((end_time IS NULL)) WHERE end_time IS NULL;
            ",
        )?;
        Ok(())
    }

    /// Writes a consistent snapshot of the database to `dest`, which must not
    /// exist yet.
    pub fn backup_to(&self, dest: &Path) -> Result<(), DbError> {
        self.conn
            .execute("VACUUM INTO ?1", params![dest.to_string_lossy().into_owned()])?;
        tracing::debug!(dest = %dest.display(), "database snapshot written");
        Ok(())
    }

    /// Checks that `path` is a readable tracker database without modifying it.
    pub fn verify(path: &Path) -> Result<(), DbError> {
        let invalid = |reason: String| DbError::InvalidBackup {
            path: path.to_path_buf(),
            reason,
        };
        if !path.is_file() {
            return Err(invalid("file does not exist".to_string()));
        }

        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
            .map_err(|e| invalid(e.to_string()))?;
        let check: String = conn
            .query_row("PRAGMA quick_check", [], |row| row.get(0))
            .map_err(|e| invalid(e.to_string()))?;
        if check != "ok" {
            return Err(invalid(format!("integrity check failed: {check}")));
        }

        for table in REQUIRED_TABLES {
            let found: Option<String> = conn
                .query_row(
                    "SELECT name FROM sqlite_master WHERE type = 'table' AND name = ?1",
                    [table],
                    |row| row.get(0),
                )
                .optional()
                .map_err(|e| invalid(e.to_string()))?;
            if found.is_none() {
                return Err(invalid(format!("missing table {table}")));
            }
        }
        Ok(())
    }

    fn query_entries<P: Params>(&self, filter: &str, params: P) -> Result<Vec<TimeEntry>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT id, task_id, start_time, end_time, duration, note, period_id
            FROM time_entries
            {filter}
            "
        ))?;
        let rows = stmt.query_map(params, EntryRow::from_row)?;
        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.into_entry()?);
        }
        Ok(entries)
    }

    fn query_periods<P: Params>(&self, filter: &str, params: P) -> Result<Vec<Period>, DbError> {
        let mut stmt = self.conn.prepare(&format!(
            "
            SELECT id, name, start_date, end_date
            FROM academic_periods
            {filter}
            "
        ))?;
        let rows = stmt.query_map(params, PeriodRow::from_row)?;
        let mut periods = Vec::new();
        for row in rows {
            periods.push(row?.into_period()?);
        }
        Ok(periods)
    }
}

/// A time entry as stored, before timestamps are parsed.
struct EntryRow {
    id: EntryId,
    task_id: TaskId,
    start_time: String,
    end_time: Option<String>,
    duration: Option<i64>,
    note: Option<String>,
    period_id: Option<PeriodId>,
}

impl EntryRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: id_at(row, 0)?,
            task_id: id_at(row, 1)?,
            start_time: row.get(2)?,
            end_time: row.get(3)?,
            duration: row.get(4)?,
            note: row.get(5)?,
            period_id: row
                .get::<_, Option<i64>>(6)?
                .map(|value| convert_id(6, value))
                .transpose()?,
        })
    }

    fn into_entry(self) -> Result<TimeEntry, DbError> {
        let entry_id = self.id.get();
        Ok(TimeEntry {
            id: self.id,
            task_id: self.task_id,
            start_time: parse_timestamp(&self.start_time, entry_id)?,
            end_time: self
                .end_time
                .as_deref()
                .map(|value| parse_timestamp(value, entry_id))
                .transpose()?,
            duration: self.duration,
            note: self.note,
            period_id: self.period_id,
        })
    }
}

struct PeriodRow {
    id: PeriodId,
    name: Name,
    start_date: String,
    end_date: String,
}

impl PeriodRow {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: id_at(row, 0)?,
            name: name_at(row, 1, "period name")?,
            start_date: row.get(2)?,
            end_date: row.get(3)?,
        })
    }

    fn into_period(self) -> Result<Period, DbError> {
        let period_id = self.id.get();
        Ok(Period {
            id: self.id,
            name: self.name,
            start_date: parse_date(&self.start_date, period_id)?,
            end_date: parse_date(&self.end_date, period_id)?,
        })
    }
}

fn convert_id<T>(idx: usize, value: i64) -> rusqlite::Result<T>
where
    T: TryFrom<i64, Error = ValidationError>,
{
    T::try_from(value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(e)))
}

fn id_at<T>(row: &Row<'_>, idx: usize) -> rusqlite::Result<T>
where
    T: TryFrom<i64, Error = ValidationError>,
{
    convert_id(idx, row.get(idx)?)
}

fn name_at(row: &Row<'_>, idx: usize, field: &'static str) -> rusqlite::Result<Name> {
    let value: String = row.get(idx)?;
    Name::new(value, field)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn group_from_row(row: &Row<'_>) -> rusqlite::Result<Group> {
    Ok(Group {
        id: id_at(row, 0)?,
        name: name_at(row, 1, "group name")?,
    })
}

fn task_from_row(row: &Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        id: id_at(row, 0)?,
        name: name_at(row, 1, "task name")?,
        group_id: id_at(row, 2)?,
    })
}

fn parse_timestamp(timestamp: &str, entry_id: i64) -> Result<DateTime<Utc>, DbError> {
    DateTime::parse_from_rfc3339(timestamp)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|source| DbError::TimestampParse {
            entry_id,
            timestamp: timestamp.to_string(),
            source,
        })
}

fn format_timestamp(timestamp: DateTime<Utc>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_date(date: &str, period_id: i64) -> Result<NaiveDate, DbError> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).map_err(|source| DbError::DateParse {
        period_id,
        date: date.to_string(),
        source,
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

impl Store for Database {
    type Error = DbError;

    fn create_group(&mut self, group: &NewGroup) -> Result<Group, DbError> {
        let id: GroupId = self.conn.query_row(
            "INSERT INTO groups (name) VALUES (?1) RETURNING id",
            [group.name.as_str()],
            |row| id_at(row, 0),
        )?;
        Ok(Group {
            id,
            name: group.name.clone(),
        })
    }

    fn group(&self, id: GroupId) -> Result<Option<Group>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name FROM groups WHERE id = ?1",
                [id.get()],
                group_from_row,
            )
            .optional()?)
    }

    fn groups(&self) -> Result<Vec<Group>, DbError> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM groups ORDER BY id ASC")?;
        let rows = stmt.query_map([], group_from_row)?;
        let mut groups = Vec::new();
        for row in rows {
            groups.push(row?);
        }
        Ok(groups)
    }

    fn delete_group(&mut self, id: GroupId) -> Result<bool, DbError> {
        let tx = self.conn.transaction()?;
        let entries = tx.execute(
            "DELETE FROM time_entries WHERE task_id IN (SELECT id FROM tasks WHERE group_id = ?1)",
            [id.get()],
        )?;
        let tasks = tx.execute("DELETE FROM tasks WHERE group_id = ?1", [id.get()])?;
        let deleted = tx.execute("DELETE FROM groups WHERE id = ?1", [id.get()])?;
        tx.commit()?;
        if deleted > 0 {
            tracing::debug!(group = %id, tasks, entries, "group deleted with cascade");
        }
        Ok(deleted > 0)
    }

    fn create_task(&mut self, task: &NewTask) -> Result<Task, DbError> {
        let id: TaskId = self.conn.query_row(
            "INSERT INTO tasks (name, group_id) VALUES (?1, ?2) RETURNING id",
            params![task.name.as_str(), task.group_id.get()],
            |row| id_at(row, 0),
        )?;
        Ok(Task {
            id,
            name: task.name.clone(),
            group_id: task.group_id,
        })
    }

    fn task(&self, id: TaskId) -> Result<Option<Task>, DbError> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, group_id FROM tasks WHERE id = ?1",
                [id.get()],
                task_from_row,
            )
            .optional()?)
    }

    fn tasks(&self, group_id: Option<GroupId>) -> Result<Vec<Task>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT id, name, group_id
            FROM tasks
            WHERE ?1 IS NULL OR group_id = ?1
            ORDER BY id ASC
            ",
        )?;
        let rows = stmt.query_map(params![group_id.map(GroupId::get)], task_from_row)?;
        let mut tasks = Vec::new();
        for row in rows {
            tasks.push(row?);
        }
        Ok(tasks)
    }

    fn delete_task(&mut self, id: TaskId) -> Result<bool, DbError> {
        let tx = self.conn.transaction()?;
        let entries = tx.execute("DELETE FROM time_entries WHERE task_id = ?1", [id.get()])?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", [id.get()])?;
        tx.commit()?;
        if deleted > 0 {
            tracing::debug!(task = %id, entries, "task deleted with cascade");
        }
        Ok(deleted > 0)
    }

    fn create_period(&mut self, period: &NewPeriod) -> Result<Period, DbError> {
        let id: PeriodId = self.conn.query_row(
            "
            INSERT INTO academic_periods (name, start_date, end_date)
            VALUES (?1, ?2, ?3)
            RETURNING id
            ",
            params![
                period.name.as_str(),
                format_date(period.start_date),
                format_date(period.end_date)
            ],
            |row| id_at(row, 0),
        )?;
        Ok(Period {
            id,
            name: period.name.clone(),
            start_date: period.start_date,
            end_date: period.end_date,
        })
    }

    fn period(&self, id: PeriodId) -> Result<Option<Period>, DbError> {
        Ok(self
            .query_periods("WHERE id = ?1", [id.get()])?
            .into_iter()
            .next())
    }

    fn periods(&self) -> Result<Vec<Period>, DbError> {
        self.query_periods("ORDER BY id ASC", params![])
    }

    fn delete_period(&mut self, id: PeriodId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM academic_periods WHERE id = ?1", [id.get()])?;
        Ok(deleted > 0)
    }

    fn start_session(&mut self, entry: &NewEntry) -> Result<TimeEntry, DbError> {
        let id: EntryId = self.conn.query_row(
            "
            INSERT INTO time_entries (task_id, start_time, period_id)
            VALUES (?1, ?2, ?3)
            RETURNING id
            ",
            params![
                entry.task_id.get(),
                format_timestamp(entry.start_time),
                entry.period_id.map(PeriodId::get)
            ],
            |row| id_at(row, 0),
        )?;
        Ok(TimeEntry {
            id,
            task_id: entry.task_id,
            start_time: entry.start_time,
            end_time: None,
            duration: None,
            note: None,
            period_id: entry.period_id,
        })
    }

    fn end_session(
        &mut self,
        id: EntryId,
        closed: &ClosedSession,
    ) -> Result<Option<TimeEntry>, DbError> {
        let updated = self.conn.execute(
            "
            UPDATE time_entries
            SET end_time = ?1, duration = ?2, note = ?3
            WHERE id = ?4 AND end_time IS NULL
            ",
            params![
                format_timestamp(closed.end_time),
                closed.duration,
                closed.note,
                id.get()
            ],
        )?;
        if updated == 0 {
            return Ok(None);
        }
        self.entry(id)
    }

    fn entry(&self, id: EntryId) -> Result<Option<TimeEntry>, DbError> {
        Ok(self
            .query_entries("WHERE id = ?1", [id.get()])?
            .into_iter()
            .next())
    }

    fn entries(&self, task_id: Option<TaskId>) -> Result<Vec<TimeEntry>, DbError> {
        self.query_entries(
            "WHERE ?1 IS NULL OR task_id = ?1 ORDER BY id ASC",
            params![task_id.map(TaskId::get)],
        )
    }

    fn open_entry(&self) -> Result<Option<TimeEntry>, DbError> {
        Ok(self
            .query_entries(
                "WHERE end_time IS NULL ORDER BY id DESC LIMIT 1",
                params![],
            )?
            .into_iter()
            .next())
    }

    fn delete_entry(&mut self, id: EntryId) -> Result<bool, DbError> {
        let deleted = self
            .conn
            .execute("DELETE FROM time_entries WHERE id = ?1", [id.get()])?;
        Ok(deleted > 0)
    }

    fn time_by_group(&self, period_id: Option<PeriodId>) -> Result<Vec<GroupTotal>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT g.id, g.name, SUM(e.duration)
            FROM groups g
            JOIN tasks t ON t.group_id = g.id
            JOIN time_entries e ON e.task_id = t.id
            WHERE e.end_time IS NOT NULL
              AND e.duration IS NOT NULL
              AND (?1 IS NULL OR e.period_id = ?1)
            GROUP BY g.id, g.name
            ORDER BY g.id ASC
            ",
        )?;
        let rows = stmt.query_map(params![period_id.map(PeriodId::get)], |row| {
            Ok(GroupTotal {
                id: id_at(row, 0)?,
                name: name_at(row, 1, "group name")?,
                total_time: row.get(2)?,
            })
        })?;
        let mut totals = Vec::new();
        for row in rows {
            totals.push(row?);
        }
        Ok(totals)
    }

    fn time_by_task(&self, scope: &TaskScope) -> Result<Vec<TaskTotal>, DbError> {
        let mut stmt = self.conn.prepare(
            "
            SELECT t.id, t.name, SUM(e.duration)
            FROM tasks t
            JOIN time_entries e ON e.task_id = t.id
            WHERE e.end_time IS NOT NULL
              AND e.duration IS NOT NULL
              AND (?1 IS NULL OR t.group_id = ?1)
              AND (?2 IS NULL OR e.period_id = ?2)
            GROUP BY t.id, t.name
            ORDER BY t.id ASC
            ",
        )?;
        let rows = stmt.query_map(
            params![
                scope.group_id.map(GroupId::get),
                scope.period_id.map(PeriodId::get)
            ],
            |row| {
                Ok(TaskTotal {
                    id: id_at(row, 0)?,
                    name: name_at(row, 1, "task name")?,
                    total_time: row.get(2)?,
                })
            },
        )?;
        let mut totals = Vec::new();
        for row in rows {
            totals.push(row?);
        }
        Ok(totals)
    }
}
