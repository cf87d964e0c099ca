//! Group-wise and task-wise time totals.
//!
//! Only closed entries count. A period filter matches on the entry's own
//! `period_id` tag, not on its timestamps. Results are ordered by id and omit
//! groups or tasks without a single matching entry.
//!
//! Scoping to a period that has not started yet never sums anything: the
//! engine answers [`Aggregation::FuturePeriod`] so callers can tell "too
//! early" apart from "nothing recorded".

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::entity::{Group, Period, Task, TimeEntry};
use crate::error::{CollaboratorExt, EntityKind, Error, Result};
use crate::period::{self, PeriodStatus};
use crate::store::{Store, TaskScope};
use crate::types::{GroupId, Name, PeriodId, TaskId};

const SECONDS_PER_HOUR: f64 = 3600.0;
const DAYS_PER_WEEK: f64 = 7.0;

/// Total closed time attributed to one group or task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeTotal<I> {
    pub id: I,
    pub name: Name,
    /// Seconds.
    pub total_time: i64,
}

pub type GroupTotal = TimeTotal<GroupId>;
pub type TaskTotal = TimeTotal<TaskId>;

/// Outcome of an aggregation query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Aggregation<T> {
    /// Sums for the scope; empty means no data.
    Totals { records: Vec<T> },
    /// The requested period has not started; nothing was summed.
    FuturePeriod { period: Period },
}

impl<T> Aggregation<T> {
    pub const fn is_future(&self) -> bool {
        matches!(self, Self::FuturePeriod { .. })
    }

    /// The records, or `None` for a future period.
    pub fn records(&self) -> Option<&[T]> {
        match self {
            Self::Totals { records } => Some(records),
            Self::FuturePeriod { .. } => None,
        }
    }
}

/// A task with its derived hour totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: TaskId,
    pub name: Name,
    pub total_seconds: i64,
    pub total_hours: f64,
    pub hours_per_week: f64,
}

impl TaskSummary {
    #[expect(
        clippy::cast_precision_loss,
        reason = "second totals stay far below 2^52"
    )]
    fn new(task: &Task, total_seconds: i64) -> Self {
        let hours = total_seconds as f64 / SECONDS_PER_HOUR;
        Self {
            id: task.id,
            name: task.name.clone(),
            total_seconds,
            total_hours: round2(hours),
            hours_per_week: round2(hours / DAYS_PER_WEEK),
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Closed entries carrying the requested period tag (any tag when `None`).
fn matching(
    entries: &[TimeEntry],
    period_id: Option<PeriodId>,
) -> impl Iterator<Item = (&TimeEntry, i64)> {
    entries.iter().filter_map(move |entry| {
        let seconds = entry.closed_duration()?;
        if period_id.is_some() && entry.period_id != period_id {
            return None;
        }
        Some((entry, seconds))
    })
}

/// Sums closed entries per owning group.
pub fn sum_by_group(
    groups: &[Group],
    tasks: &[Task],
    entries: &[TimeEntry],
    period_id: Option<PeriodId>,
) -> Vec<GroupTotal> {
    let owner: HashMap<TaskId, GroupId> = tasks.iter().map(|t| (t.id, t.group_id)).collect();
    let mut totals: BTreeMap<GroupId, i64> = BTreeMap::new();
    for (entry, seconds) in matching(entries, period_id) {
        if let Some(group_id) = owner.get(&entry.task_id) {
            *totals.entry(*group_id).or_default() += seconds;
        }
    }

    let names: HashMap<GroupId, &Name> = groups.iter().map(|g| (g.id, &g.name)).collect();
    totals
        .into_iter()
        .filter_map(|(id, total_time)| {
            names.get(&id).map(|name| TimeTotal {
                id,
                name: (*name).clone(),
                total_time,
            })
        })
        .collect()
}

/// Sums closed entries per task. Entries of tasks not in `tasks` are ignored,
/// which is how a group filter is applied.
pub fn sum_by_task(
    tasks: &[Task],
    entries: &[TimeEntry],
    period_id: Option<PeriodId>,
) -> Vec<TaskTotal> {
    let names: HashMap<TaskId, &Name> = tasks.iter().map(|t| (t.id, &t.name)).collect();
    let mut totals: BTreeMap<TaskId, i64> = BTreeMap::new();
    for (entry, seconds) in matching(entries, period_id) {
        if names.contains_key(&entry.task_id) {
            *totals.entry(entry.task_id).or_default() += seconds;
        }
    }

    totals
        .into_iter()
        .filter_map(|(id, total_time)| {
            names.get(&id).map(|name| TimeTotal {
                id,
                name: (*name).clone(),
                total_time,
            })
        })
        .collect()
}

/// Runs aggregation queries against a store as of a given day.
pub struct AggregationEngine<'a, S> {
    store: &'a S,
    today: NaiveDate,
}

impl<'a, S: Store> AggregationEngine<'a, S> {
    pub const fn new(store: &'a S, today: NaiveDate) -> Self {
        Self { store, today }
    }

    /// Resolves the period and short-circuits if it lies in the future.
    fn scope_period(&self, period_id: Option<PeriodId>) -> Result<Option<Period>> {
        let period = period::resolve(self.store, period_id)?;
        Ok(period.filter(|p| period::classify(p, self.today) == PeriodStatus::Future))
    }

    pub fn by_group(&self, period_id: Option<PeriodId>) -> Result<Aggregation<GroupTotal>> {
        if let Some(period) = self.scope_period(period_id)? {
            tracing::debug!(period = %period.id, "group aggregation skipped for future period");
            return Ok(Aggregation::FuturePeriod { period });
        }
        let records = self.store.time_by_group(period_id).collab()?;
        Ok(Aggregation::Totals { records })
    }

    pub fn by_task(&self, scope: TaskScope) -> Result<Aggregation<TaskTotal>> {
        if let Some(period) = self.scope_period(scope.period_id)? {
            tracing::debug!(period = %period.id, "task aggregation skipped for future period");
            return Ok(Aggregation::FuturePeriod { period });
        }
        if let Some(group_id) = scope.group_id {
            self.require_group(group_id)?;
        }
        let records = self.store.time_by_task(&scope).collab()?;
        Ok(Aggregation::Totals { records })
    }

    /// Every task of a group with its hour totals, including idle tasks.
    pub fn task_summaries(&self, group_id: GroupId) -> Result<Vec<TaskSummary>> {
        self.require_group(group_id)?;
        let tasks = self.store.tasks(Some(group_id)).collab()?;
        let scope = TaskScope {
            group_id: Some(group_id),
            period_id: None,
        };
        let totals: HashMap<TaskId, i64> = self
            .store
            .time_by_task(&scope)
            .collab()?
            .into_iter()
            .map(|t| (t.id, t.total_time))
            .collect();
        Ok(tasks
            .iter()
            .map(|task| TaskSummary::new(task, totals.get(&task.id).copied().unwrap_or(0)))
            .collect())
    }

    fn require_group(&self, group_id: GroupId) -> Result<()> {
        match self.store.group(group_id).collab()? {
            Some(_) => Ok(()),
            None => Err(Error::not_found(EntityKind::Group, group_id)),
        }
    }
}
