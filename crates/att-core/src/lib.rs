//! Core domain logic for the academic time tracker.
//!
//! This crate contains the fundamental types and logic for:
//! - Entities: groups own tasks, tasks own time entries, periods tag entries
//! - Timer: the single running session and its start/stop transitions
//! - Aggregation: group-wise and task-wise totals, optionally per period
//! - Export: the four-section tabular dump of everything stored
//!
//! Persistence sits behind the [`Store`] trait; [`Tracker`] ties a store, the
//! timer and a [`Clock`] together for presentation layers.

pub mod aggregate;
mod clock;
mod entity;
mod error;
pub mod export;
pub mod format;
mod memory;
pub mod period;
mod store;
mod timer;
mod tracker;
mod types;

pub use aggregate::{Aggregation, GroupTotal, TaskSummary, TaskTotal, TimeTotal};
pub use clock::{Clock, ManualClock, SystemClock};
pub use entity::{
    ClosedSession, Group, NewEntry, NewGroup, NewPeriod, NewTask, Period, Task, TimeEntry,
    clamped_duration,
};
pub use error::{Conflict, EntityKind, Error, Result};
pub use export::{ExportDocument, Section};
pub use format::{format_clock, format_duration, format_share};
pub use memory::MemoryStore;
pub use period::PeriodStatus;
pub use store::{Store, TaskScope};
pub use timer::{ActiveSession, TimerController};
pub use tracker::{Toggled, Tracker};
pub use types::{EntryId, GroupId, Name, PeriodId, TaskId, ValidationError, parse_date};
