//! The persistence collaborator the core reads and writes through.

use serde::{Deserialize, Serialize};

use crate::aggregate::{GroupTotal, TaskTotal, sum_by_group, sum_by_task};
use crate::entity::{
    ClosedSession, Group, NewEntry, NewGroup, NewPeriod, NewTask, Period, Task, TimeEntry,
};
use crate::types::{EntryId, GroupId, PeriodId, TaskId};

/// Filters for task-wise aggregation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskScope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<GroupId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_id: Option<PeriodId>,
}

/// Create/read/list/delete per entity, session persistence and aggregate
/// queries.
///
/// Reads return `Ok(None)` for unknown ids and deletes return `Ok(false)`;
/// `Err` is reserved for the store itself failing. Lists are ordered by id.
///
/// Implementations must make `delete_group` and `delete_task` atomic: the
/// owned tasks and entries go with the parent or nothing is removed.
pub trait Store {
    type Error: std::error::Error + Send + Sync + 'static;

    fn create_group(&mut self, group: &NewGroup) -> Result<Group, Self::Error>;
    fn group(&self, id: GroupId) -> Result<Option<Group>, Self::Error>;
    fn groups(&self) -> Result<Vec<Group>, Self::Error>;
    fn delete_group(&mut self, id: GroupId) -> Result<bool, Self::Error>;

    fn create_task(&mut self, task: &NewTask) -> Result<Task, Self::Error>;
    fn task(&self, id: TaskId) -> Result<Option<Task>, Self::Error>;
    /// All tasks, or only those of one group.
    fn tasks(&self, group_id: Option<GroupId>) -> Result<Vec<Task>, Self::Error>;
    fn delete_task(&mut self, id: TaskId) -> Result<bool, Self::Error>;

    fn create_period(&mut self, period: &NewPeriod) -> Result<Period, Self::Error>;
    fn period(&self, id: PeriodId) -> Result<Option<Period>, Self::Error>;
    fn periods(&self) -> Result<Vec<Period>, Self::Error>;
    fn delete_period(&mut self, id: PeriodId) -> Result<bool, Self::Error>;

    /// Persists a new open entry.
    fn start_session(&mut self, entry: &NewEntry) -> Result<TimeEntry, Self::Error>;
    /// Closes an open entry. `Ok(None)` when the entry is unknown or already
    /// closed.
    fn end_session(
        &mut self,
        id: EntryId,
        closed: &ClosedSession,
    ) -> Result<Option<TimeEntry>, Self::Error>;
    fn entry(&self, id: EntryId) -> Result<Option<TimeEntry>, Self::Error>;
    /// All entries, or only those of one task.
    fn entries(&self, task_id: Option<TaskId>) -> Result<Vec<TimeEntry>, Self::Error>;
    /// The entry without an end time, if any.
    fn open_entry(&self) -> Result<Option<TimeEntry>, Self::Error>;
    fn delete_entry(&mut self, id: EntryId) -> Result<bool, Self::Error>;

    /// Group totals over closed entries, optionally restricted to one period
    /// tag.
    fn time_by_group(&self, period_id: Option<PeriodId>) -> Result<Vec<GroupTotal>, Self::Error> {
        let groups = self.groups()?;
        let tasks = self.tasks(None)?;
        let entries = self.entries(None)?;
        Ok(sum_by_group(&groups, &tasks, &entries, period_id))
    }

    /// Task totals over closed entries within `scope`.
    fn time_by_task(&self, scope: &TaskScope) -> Result<Vec<TaskTotal>, Self::Error> {
        let tasks = self.tasks(scope.group_id)?;
        let entries = self.entries(None)?;
        Ok(sum_by_task(&tasks, &entries, scope.period_id))
    }
}
