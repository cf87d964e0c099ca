//! The single active timing session.
//!
//! The controller is either idle or running exactly one session. `start`
//! enters the running state and persists an open entry; `stop` closes that
//! entry and returns to idle. Nothing else changes the state, apart from the
//! session's entry disappearing underneath it (see
//! [`TimerController::reconcile`]).

use chrono::{DateTime, Duration, SubsecRound, Utc};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::entity::{ClosedSession, NewEntry, TimeEntry, clamped_duration};
use crate::error::{CollaboratorExt, Conflict, EntityKind, Error, Result};
use crate::period;
use crate::store::Store;
use crate::types::{EntryId, TaskId};

/// Stores keep instants to the millisecond. Durations are computed from the
/// same truncated instants so that `duration == end_time - start_time` holds
/// after a round trip.
fn stored_now(clock: &dyn Clock) -> DateTime<Utc> {
    clock.now().trunc_subsecs(3)
}

/// The running session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveSession {
    pub entry_id: EntryId,
    pub task_id: TaskId,
    pub start_time: DateTime<Utc>,
}

impl From<&TimeEntry> for ActiveSession {
    fn from(entry: &TimeEntry) -> Self {
        Self {
            entry_id: entry.id,
            task_id: entry.task_id,
            start_time: entry.start_time,
        }
    }
}

#[derive(Debug, Default)]
pub struct TimerController {
    active: Option<ActiveSession>,
}

impl TimerController {
    /// An idle controller.
    pub const fn new() -> Self {
        Self { active: None }
    }

    /// A controller that adopts the store's open entry, if there is one.
    pub fn recover<S: Store>(store: &S) -> Result<Self> {
        let active = store.open_entry().collab()?.as_ref().map(ActiveSession::from);
        if let Some(session) = &active {
            tracing::info!(
                entry = %session.entry_id,
                task = %session.task_id,
                started = %session.start_time,
                "recovered running session"
            );
        }
        Ok(Self { active })
    }

    pub const fn active(&self) -> Option<&ActiveSession> {
        self.active.as_ref()
    }

    pub const fn is_running(&self) -> bool {
        self.active.is_some()
    }

    /// Opens a session on `task_id`, tagged with the period containing today.
    pub fn start<S: Store>(
        &mut self,
        store: &mut S,
        clock: &dyn Clock,
        task_id: TaskId,
    ) -> Result<EntryId> {
        if let Some(active) = &self.active {
            return Err(Error::Conflict(Conflict::AlreadyRunning {
                entry_id: active.entry_id.get(),
            }));
        }
        if store.task(task_id).collab()?.is_none() {
            return Err(Error::not_found(EntityKind::Task, task_id));
        }

        let periods = store.periods().collab()?;
        let period_id = period::containing(&periods, clock.today()).map(|p| p.id);
        let entry = store
            .start_session(&NewEntry {
                task_id,
                start_time: stored_now(clock),
                period_id,
            })
            .collab()?;

        tracing::info!(entry = %entry.id, task = %task_id, "timer started");
        self.active = Some(ActiveSession::from(&entry));
        Ok(entry.id)
    }

    /// Closes the running session, which must be `entry_id`.
    pub fn stop<S: Store>(
        &mut self,
        store: &mut S,
        clock: &dyn Clock,
        entry_id: EntryId,
        note: Option<&str>,
    ) -> Result<TimeEntry> {
        let Some(active) = self.active else {
            return Err(Error::Conflict(Conflict::NotRunning));
        };
        if active.entry_id != entry_id {
            return Err(Error::Conflict(Conflict::EntryMismatch {
                requested: entry_id.get(),
                active: active.entry_id.get(),
            }));
        }

        let end_time = stored_now(clock);
        let closed = ClosedSession {
            end_time,
            duration: clamped_duration(active.start_time, end_time),
            note: note.unwrap_or_default().to_string(),
        };
        let entry = store.end_session(entry_id, &closed).collab()?;
        self.active = None;

        let Some(entry) = entry else {
            tracing::warn!(entry = %entry_id, "running session vanished from the store");
            return Err(Error::not_found(EntityKind::Entry, entry_id));
        };
        tracing::info!(entry = %entry.id, duration = closed.duration, "timer stopped");
        Ok(entry)
    }

    /// Time since the running session started; `None` while idle.
    pub fn elapsed(&self, clock: &dyn Clock) -> Option<Duration> {
        self.active
            .map(|session| (clock.now() - session.start_time).max(Duration::zero()))
    }

    /// Drops the active session if its entry is no longer open in the store.
    pub fn reconcile<S: Store>(&mut self, store: &S) -> Result<()> {
        let Some(active) = self.active else {
            return Ok(());
        };
        let still_open = store
            .entry(active.entry_id)
            .collab()?
            .is_some_and(|e| e.is_open());
        if !still_open {
            tracing::info!(entry = %active.entry_id, "running session deleted, timer idle");
            self.active = None;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::entity::{NewGroup, NewPeriod, NewTask};
    use crate::memory::MemoryStore;
    use chrono::{NaiveDate, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap()
    }

    fn setup() -> (MemoryStore, TaskId, TaskId) {
        let mut store = MemoryStore::new();
        let work = store.create_group(&NewGroup::new("Work").unwrap()).unwrap();
        let report = store
            .create_task(&NewTask::new(work.id, "Report").unwrap())
            .unwrap();
        let review = store
            .create_task(&NewTask::new(work.id, "Review").unwrap())
            .unwrap();
        (store, report.id, review.id)
    }

    #[test]
    fn start_then_stop_records_duration_and_note() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();

        let entry_id = timer.start(&mut store, &clock, report).unwrap();
        assert!(timer.is_running());
        clock.advance(Duration::seconds(3661));
        let entry = timer
            .stop(&mut store, &clock, entry_id, Some("drafted outline"))
            .unwrap();

        assert!(!timer.is_running());
        assert_eq!(entry.duration, Some(3661));
        assert_eq!(entry.end_time, Some(t0() + Duration::seconds(3661)));
        assert_eq!(entry.note.as_deref(), Some("drafted outline"));
    }

    #[test]
    fn instants_are_kept_to_the_millisecond() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0() + Duration::nanoseconds(499_999_999));
        let mut timer = TimerController::new();
        let id = timer.start(&mut store, &clock, report).unwrap();

        clock.set(t0() + Duration::nanoseconds(10_499_500_000));
        let entry = timer.stop(&mut store, &clock, id, None).unwrap();

        assert_eq!(entry.start_time, t0() + Duration::milliseconds(499));
        assert_eq!(entry.end_time, Some(t0() + Duration::milliseconds(10_499)));
        assert_eq!(entry.duration, Some(10));
    }

    #[test]
    fn missing_note_is_stored_empty() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let id = timer.start(&mut store, &clock, report).unwrap();
        let entry = timer.stop(&mut store, &clock, id, None).unwrap();
        assert_eq!(entry.note.as_deref(), Some(""));
    }

    #[test]
    fn second_start_conflicts_without_opening_another_entry() {
        let (mut store, report, review) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let first = timer.start(&mut store, &clock, report).unwrap();

        for task in [report, review] {
            let err = timer.start(&mut store, &clock, task).unwrap_err();
            assert!(matches!(
                err,
                Error::Conflict(Conflict::AlreadyRunning { entry_id }) if entry_id == first.get()
            ));
        }
        let open: Vec<_> = store
            .entries(None)
            .unwrap()
            .into_iter()
            .filter(TimeEntry::is_open)
            .collect();
        assert_eq!(open.len(), 1);
    }

    #[test]
    fn conflict_is_checked_before_task_lookup() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        timer.start(&mut store, &clock, report).unwrap();
        let err = timer
            .start(&mut store, &clock, TaskId::new(404).unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(_)));
    }

    #[test]
    fn start_unknown_task_is_not_found() {
        let (mut store, _, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let err = timer
            .start(&mut store, &clock, TaskId::new(404).unwrap())
            .unwrap_err();
        assert!(matches!(
            err,
            Error::NotFound {
                kind: EntityKind::Task,
                id: 404
            }
        ));
        assert!(!timer.is_running());
    }

    #[test]
    fn stop_while_idle_conflicts() {
        let (mut store, _, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let err = timer
            .stop(&mut store, &clock, EntryId::new(1).unwrap(), None)
            .unwrap_err();
        assert!(matches!(err, Error::Conflict(Conflict::NotRunning)));
    }

    #[test]
    fn stop_with_wrong_id_keeps_session() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let id = timer.start(&mut store, &clock, report).unwrap();
        let before = *timer.active().unwrap();

        let wrong = EntryId::new(id.get() + 1).unwrap();
        let err = timer.stop(&mut store, &clock, wrong, None).unwrap_err();
        assert!(matches!(
            err,
            Error::Conflict(Conflict::EntryMismatch { .. })
        ));
        assert_eq!(timer.active(), Some(&before));
        assert!(store.entry(id).unwrap().unwrap().is_open());
    }

    #[test]
    fn clock_regression_clamps_duration_to_zero() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let id = timer.start(&mut store, &clock, report).unwrap();
        clock.set(t0() - Duration::seconds(90));

        assert_eq!(timer.elapsed(&clock), Some(Duration::zero()));
        let entry = timer.stop(&mut store, &clock, id, None).unwrap();
        assert_eq!(entry.duration, Some(0));
    }

    #[test]
    fn elapsed_is_none_when_idle() {
        let clock = ManualClock::new(t0());
        let timer = TimerController::new();
        assert_eq!(timer.elapsed(&clock), None);
    }

    #[test]
    fn elapsed_tracks_clock() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        timer.start(&mut store, &clock, report).unwrap();
        clock.advance(Duration::seconds(75));
        assert_eq!(timer.elapsed(&clock), Some(Duration::seconds(75)));
    }

    #[test]
    fn start_tags_entry_with_current_period() {
        let (mut store, report, _) = setup();
        let fall = store
            .create_period(
                &NewPeriod::new(
                    "Fall",
                    NaiveDate::from_ymd_opt(2025, 9, 1).unwrap(),
                    NaiveDate::from_ymd_opt(2025, 12, 20).unwrap(),
                )
                .unwrap(),
            )
            .unwrap();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let id = timer.start(&mut store, &clock, report).unwrap();
        assert_eq!(store.entry(id).unwrap().unwrap().period_id, Some(fall.id));
    }

    #[test]
    fn start_outside_any_period_is_untagged() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let id = timer.start(&mut store, &clock, report).unwrap();
        assert_eq!(store.entry(id).unwrap().unwrap().period_id, None);
    }

    #[test]
    fn recover_adopts_open_entry() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let id = TimerController::new()
            .start(&mut store, &clock, report)
            .unwrap();

        let mut timer = TimerController::recover(&store).unwrap();
        assert_eq!(timer.active().map(|s| s.entry_id), Some(id));
        clock.advance(Duration::seconds(120));
        let entry = timer.stop(&mut store, &clock, id, None).unwrap();
        assert_eq!(entry.duration, Some(120));
    }

    #[test]
    fn reconcile_clears_deleted_session() {
        let (mut store, report, _) = setup();
        let clock = ManualClock::new(t0());
        let mut timer = TimerController::new();
        let id = timer.start(&mut store, &clock, report).unwrap();

        timer.reconcile(&store).unwrap();
        assert!(timer.is_running());

        store.delete_entry(id).unwrap();
        timer.reconcile(&store).unwrap();
        assert!(!timer.is_running());
    }
}
