//! Service context exposing the command/query API to presentation.
//!
//! A [`Tracker`] owns the store and the timer behind one lock, so every
//! operation observes and mutates them together. Concurrent `start` calls from
//! several threads therefore race on the lock and exactly one wins.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{Duration, NaiveDate};

use crate::aggregate::{Aggregation, AggregationEngine, GroupTotal, TaskSummary, TaskTotal};
use crate::clock::{Clock, SystemClock};
use crate::entity::{Group, NewGroup, NewPeriod, NewTask, Period, Task, TimeEntry};
use crate::error::{CollaboratorExt, Conflict, EntityKind, Error, Result};
use crate::export::{self, ExportDocument};
use crate::store::{Store, TaskScope};
use crate::timer::{ActiveSession, TimerController};
use crate::types::{EntryId, GroupId, PeriodId, TaskId};

struct State<S> {
    store: S,
    timer: TimerController,
}

impl<S: Store> State<S> {
    /// Idles the timer when a committed delete took its entry along.
    ///
    /// The delete already happened, so a failed check is logged rather than
    /// reported; a later `stop` on the vanished entry still idles the timer.
    fn settle_timer(&mut self) {
        let Self { store, timer } = self;
        if let Err(err) = timer.reconcile(store) {
            tracing::warn!(error = %err, "could not check the running session after a delete");
        }
    }
}

/// What [`Tracker::toggle`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Toggled {
    Started(EntryId),
    Stopped(TimeEntry),
}

pub struct Tracker<S> {
    state: Mutex<State<S>>,
    clock: Arc<dyn Clock>,
}

impl<S: Store> Tracker<S> {
    /// Wraps a store, adopting any session it left running.
    pub fn new(store: S, clock: Arc<dyn Clock>) -> Result<Self> {
        let timer = TimerController::recover(&store)?;
        Ok(Self {
            state: Mutex::new(State { store, timer }),
            clock,
        })
    }

    pub fn with_system_clock(store: S) -> Result<Self> {
        Self::new(store, Arc::new(SystemClock))
    }

    fn lock(&self) -> MutexGuard<'_, State<S>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Read access to the underlying store.
    pub fn with_store<R>(&self, f: impl FnOnce(&S) -> R) -> R {
        f(&self.lock().store)
    }

    pub fn into_store(self) -> S {
        self.state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
            .store
    }

    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    // ========== Groups ==========

    pub fn create_group(&self, name: &str) -> Result<Group> {
        let new = NewGroup::new(name)?;
        let group = self.lock().store.create_group(&new).collab()?;
        tracing::debug!(id = %group.id, name = %group.name, "group created");
        Ok(group)
    }

    pub fn groups(&self) -> Result<Vec<Group>> {
        self.lock().store.groups().collab()
    }

    pub fn group(&self, id: GroupId) -> Result<Group> {
        self.lock()
            .store
            .group(id)
            .collab()?
            .ok_or_else(|| Error::not_found(EntityKind::Group, id))
    }

    /// Deletes a group together with its tasks and their entries.
    pub fn delete_group(&self, id: GroupId) -> Result<()> {
        let mut state = self.lock();
        if !state.store.delete_group(id).collab()? {
            return Err(Error::not_found(EntityKind::Group, id));
        }
        state.settle_timer();
        tracing::debug!(%id, "group deleted");
        Ok(())
    }

    // ========== Tasks ==========

    pub fn create_task(&self, group_id: GroupId, name: &str) -> Result<Task> {
        let new = NewTask::new(group_id, name)?;
        let mut state = self.lock();
        if state.store.group(group_id).collab()?.is_none() {
            return Err(Error::not_found(EntityKind::Group, group_id));
        }
        let task = state.store.create_task(&new).collab()?;
        tracing::debug!(id = %task.id, group = %group_id, "task created");
        Ok(task)
    }

    /// Tasks of one group.
    pub fn tasks(&self, group_id: GroupId) -> Result<Vec<Task>> {
        let state = self.lock();
        if state.store.group(group_id).collab()?.is_none() {
            return Err(Error::not_found(EntityKind::Group, group_id));
        }
        state.store.tasks(Some(group_id)).collab()
    }

    pub fn all_tasks(&self) -> Result<Vec<Task>> {
        self.lock().store.tasks(None).collab()
    }

    pub fn task(&self, id: TaskId) -> Result<Task> {
        self.lock()
            .store
            .task(id)
            .collab()?
            .ok_or_else(|| Error::not_found(EntityKind::Task, id))
    }

    /// Deletes a task together with its entries.
    pub fn delete_task(&self, id: TaskId) -> Result<()> {
        let mut state = self.lock();
        if !state.store.delete_task(id).collab()? {
            return Err(Error::not_found(EntityKind::Task, id));
        }
        state.settle_timer();
        tracing::debug!(%id, "task deleted");
        Ok(())
    }

    // ========== Periods ==========

    pub fn create_period(&self, name: &str, start: NaiveDate, end: NaiveDate) -> Result<Period> {
        let new = NewPeriod::new(name, start, end)?;
        self.insert_period(&new)
    }

    /// Creates a period from `YYYY-MM-DD` strings.
    pub fn create_period_from_strings(&self, name: &str, start: &str, end: &str) -> Result<Period> {
        let new = NewPeriod::parse(name, start, end)?;
        self.insert_period(&new)
    }

    fn insert_period(&self, new: &NewPeriod) -> Result<Period> {
        let period = self.lock().store.create_period(new).collab()?;
        tracing::debug!(id = %period.id, name = %period.name, "period created");
        Ok(period)
    }

    pub fn periods(&self) -> Result<Vec<Period>> {
        self.lock().store.periods().collab()
    }

    pub fn period(&self, id: PeriodId) -> Result<Period> {
        crate::period::resolve(&self.lock().store, Some(id))?
            .ok_or_else(|| Error::not_found(EntityKind::Period, id))
    }

    /// Deletes only the period; entries keep their tag.
    pub fn delete_period(&self, id: PeriodId) -> Result<()> {
        if !self.lock().store.delete_period(id).collab()? {
            return Err(Error::not_found(EntityKind::Period, id));
        }
        tracing::debug!(%id, "period deleted");
        Ok(())
    }

    // ========== Time entries ==========

    /// Entries of one task, open ones included.
    pub fn entries(&self, task_id: TaskId) -> Result<Vec<TimeEntry>> {
        let state = self.lock();
        if state.store.task(task_id).collab()?.is_none() {
            return Err(Error::not_found(EntityKind::Task, task_id));
        }
        state.store.entries(Some(task_id)).collab()
    }

    pub fn delete_entry(&self, id: EntryId) -> Result<()> {
        let mut state = self.lock();
        if !state.store.delete_entry(id).collab()? {
            return Err(Error::not_found(EntityKind::Entry, id));
        }
        state.settle_timer();
        tracing::debug!(%id, "time entry deleted");
        Ok(())
    }

    // ========== Timer ==========

    pub fn start(&self, task_id: TaskId) -> Result<EntryId> {
        let mut state = self.lock();
        let State { store, timer } = &mut *state;
        timer.start(store, self.clock.as_ref(), task_id)
    }

    pub fn stop(&self, entry_id: EntryId, note: Option<&str>) -> Result<TimeEntry> {
        let mut state = self.lock();
        let State { store, timer } = &mut *state;
        timer.stop(store, self.clock.as_ref(), entry_id, note)
    }

    /// Stops whatever session is running.
    pub fn stop_active(&self, note: Option<&str>) -> Result<TimeEntry> {
        let mut state = self.lock();
        let State { store, timer } = &mut *state;
        let entry_id = timer
            .active()
            .map(|s| s.entry_id)
            .ok_or(Error::Conflict(Conflict::NotRunning))?;
        timer.stop(store, self.clock.as_ref(), entry_id, note)
    }

    /// Stops the running session, or starts one on `task_id` when idle.
    pub fn toggle(&self, task_id: TaskId, note: Option<&str>) -> Result<Toggled> {
        let mut state = self.lock();
        let State { store, timer } = &mut *state;
        match timer.active().map(|s| s.entry_id) {
            Some(entry_id) => timer
                .stop(store, self.clock.as_ref(), entry_id, note)
                .map(Toggled::Stopped),
            None => timer
                .start(store, self.clock.as_ref(), task_id)
                .map(Toggled::Started),
        }
    }

    pub fn active(&self) -> Option<ActiveSession> {
        self.lock().timer.active().copied()
    }

    /// Time on the running session; `None` while idle.
    pub fn elapsed(&self) -> Option<Duration> {
        self.lock().timer.elapsed(self.clock.as_ref())
    }

    // ========== Aggregation ==========

    pub fn time_by_group(&self, period_id: Option<PeriodId>) -> Result<Aggregation<GroupTotal>> {
        let state = self.lock();
        AggregationEngine::new(&state.store, self.clock.today()).by_group(period_id)
    }

    pub fn time_by_task(&self, scope: TaskScope) -> Result<Aggregation<TaskTotal>> {
        let state = self.lock();
        AggregationEngine::new(&state.store, self.clock.today()).by_task(scope)
    }

    pub fn task_summaries(&self, group_id: GroupId) -> Result<Vec<TaskSummary>> {
        let state = self.lock();
        AggregationEngine::new(&state.store, self.clock.today()).task_summaries(group_id)
    }

    // ========== Export ==========

    pub fn export(&self) -> Result<ExportDocument> {
        let state = self.lock();
        let groups = state.store.groups().collab()?;
        let tasks = state.store.tasks(None).collab()?;
        let entries = state.store.entries(None).collab()?;
        let periods = state.store.periods().collab()?;
        Ok(export::build(&groups, &tasks, &entries, &periods))
    }
}
