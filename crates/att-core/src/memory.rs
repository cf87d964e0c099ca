//! In-memory [`Store`] used by tests and embedders without a database.

use std::collections::BTreeMap;
use std::convert::Infallible;

use crate::entity::{
    ClosedSession, Group, NewEntry, NewGroup, NewPeriod, NewTask, Period, Task, TimeEntry,
};
use crate::store::Store;
use crate::types::{EntryId, GroupId, PeriodId, TaskId};

/// Id allocation mirrors `AUTOINCREMENT`: ids start at 1 and are never reused.
#[derive(Debug, Default)]
pub struct MemoryStore {
    groups: BTreeMap<GroupId, Group>,
    tasks: BTreeMap<TaskId, Task>,
    periods: BTreeMap<PeriodId, Period>,
    entries: BTreeMap<EntryId, TimeEntry>,
    last_group: i64,
    last_task: i64,
    last_period: i64,
    last_entry: i64,
}

fn next(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Error = Infallible;

    fn create_group(&mut self, group: &NewGroup) -> Result<Group, Self::Error> {
        let id = GroupId(next(&mut self.last_group));
        let group = Group {
            id,
            name: group.name.clone(),
        };
        self.groups.insert(id, group.clone());
        Ok(group)
    }

    fn group(&self, id: GroupId) -> Result<Option<Group>, Self::Error> {
        Ok(self.groups.get(&id).cloned())
    }

    fn groups(&self) -> Result<Vec<Group>, Self::Error> {
        Ok(self.groups.values().cloned().collect())
    }

    fn delete_group(&mut self, id: GroupId) -> Result<bool, Self::Error> {
        if self.groups.remove(&id).is_none() {
            return Ok(false);
        }
        let owned: Vec<TaskId> = self
            .tasks
            .values()
            .filter(|t| t.group_id == id)
            .map(|t| t.id)
            .collect();
        for task_id in owned {
            self.delete_task(task_id)?;
        }
        Ok(true)
    }

    fn create_task(&mut self, task: &NewTask) -> Result<Task, Self::Error> {
        let id = TaskId(next(&mut self.last_task));
        let task = Task {
            id,
            name: task.name.clone(),
            group_id: task.group_id,
        };
        self.tasks.insert(id, task.clone());
        Ok(task)
    }

    fn task(&self, id: TaskId) -> Result<Option<Task>, Self::Error> {
        Ok(self.tasks.get(&id).cloned())
    }

    fn tasks(&self, group_id: Option<GroupId>) -> Result<Vec<Task>, Self::Error> {
        Ok(self
            .tasks
            .values()
            .filter(|t| group_id.is_none_or(|g| t.group_id == g))
            .cloned()
            .collect())
    }

    fn delete_task(&mut self, id: TaskId) -> Result<bool, Self::Error> {
        if self.tasks.remove(&id).is_none() {
            return Ok(false);
        }
        self.entries.retain(|_, e| e.task_id != id);
        Ok(true)
    }

    fn create_period(&mut self, period: &NewPeriod) -> Result<Period, Self::Error> {
        let id = PeriodId(next(&mut self.last_period));
        let period = Period {
            id,
            name: period.name.clone(),
            start_date: period.start_date,
            end_date: period.end_date,
        };
        self.periods.insert(id, period.clone());
        Ok(period)
    }

    fn period(&self, id: PeriodId) -> Result<Option<Period>, Self::Error> {
        Ok(self.periods.get(&id).cloned())
    }

    fn periods(&self) -> Result<Vec<Period>, Self::Error> {
        Ok(self.periods.values().cloned().collect())
    }

    fn delete_period(&mut self, id: PeriodId) -> Result<bool, Self::Error> {
        Ok(self.periods.remove(&id).is_some())
    }

    fn start_session(&mut self, entry: &NewEntry) -> Result<TimeEntry, Self::Error> {
        let id = EntryId(next(&mut self.last_entry));
        let entry = TimeEntry {
            id,
            task_id: entry.task_id,
            start_time: entry.start_time,
            end_time: None,
            duration: None,
            note: None,
            period_id: entry.period_id,
        };
        self.entries.insert(id, entry.clone());
        Ok(entry)
    }

    fn end_session(
        &mut self,
        id: EntryId,
        closed: &ClosedSession,
    ) -> Result<Option<TimeEntry>, Self::Error> {
        let Some(entry) = self.entries.get_mut(&id).filter(|e| e.is_open()) else {
            return Ok(None);
        };
        entry.end_time = Some(closed.end_time);
        entry.duration = Some(closed.duration);
        entry.note = Some(closed.note.clone());
        Ok(Some(entry.clone()))
    }

    fn entry(&self, id: EntryId) -> Result<Option<TimeEntry>, Self::Error> {
        Ok(self.entries.get(&id).cloned())
    }

    fn entries(&self, task_id: Option<TaskId>) -> Result<Vec<TimeEntry>, Self::Error> {
        Ok(self
            .entries
            .values()
            .filter(|e| task_id.is_none_or(|t| e.task_id == t))
            .cloned()
            .collect())
    }

    fn open_entry(&self) -> Result<Option<TimeEntry>, Self::Error> {
        Ok(self.entries.values().rev().find(|e| e.is_open()).cloned())
    }

    fn delete_entry(&mut self, id: EntryId) -> Result<bool, Self::Error> {
        Ok(self.entries.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn ids_are_not_reused_after_delete() {
        let mut store = MemoryStore::new();
        let first = store.create_group(&NewGroup::new("A").unwrap()).unwrap();
        assert!(store.delete_group(first.id).unwrap());
        let second = store.create_group(&NewGroup::new("B").unwrap()).unwrap();
        assert_eq!(first.id.get(), 1);
        assert_eq!(second.id.get(), 2);
    }

    #[test]
    fn delete_group_cascades_to_tasks_and_entries() {
        let mut store = MemoryStore::new();
        let work = store.create_group(&NewGroup::new("Work").unwrap()).unwrap();
        let home = store.create_group(&NewGroup::new("Home").unwrap()).unwrap();
        let report = store
            .create_task(&NewTask::new(work.id, "Report").unwrap())
            .unwrap();
        let dishes = store
            .create_task(&NewTask::new(home.id, "Dishes").unwrap())
            .unwrap();
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        for task_id in [report.id, dishes.id] {
            store
                .start_session(&NewEntry {
                    task_id,
                    start_time: start,
                    period_id: None,
                })
                .unwrap();
        }

        assert!(store.delete_group(work.id).unwrap());
        assert_eq!(store.tasks(None).unwrap(), vec![dishes.clone()]);
        let remaining = store.entries(None).unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].task_id, dishes.id);
        assert!(!store.delete_group(work.id).unwrap());
    }

    #[test]
    fn end_session_ignores_closed_entries() {
        let mut store = MemoryStore::new();
        let start = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
        let entry = store
            .start_session(&NewEntry {
                task_id: TaskId::new(1).unwrap(),
                start_time: start,
                period_id: None,
            })
            .unwrap();
        let closed = ClosedSession {
            end_time: start + chrono::Duration::seconds(60),
            duration: 60,
            note: "first".to_string(),
        };
        assert!(store.end_session(entry.id, &closed).unwrap().is_some());
        let again = ClosedSession {
            note: "second".to_string(),
            ..closed
        };
        assert!(store.end_session(entry.id, &again).unwrap().is_none());
        let stored = store.entry(entry.id).unwrap().unwrap();
        assert_eq!(stored.note.as_deref(), Some("first"));
        assert_eq!(stored.duration, Some(60));
    }
}
