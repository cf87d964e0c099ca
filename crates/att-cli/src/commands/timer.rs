//! Timer commands: start, stop, toggle and status.

use std::io::Write;

use anyhow::Result;
use att_core::{EntryId, Store, TaskId, TimeEntry, Toggled, Tracker, format_clock, format_duration};

fn write_started<W: Write, S: Store>(
    writer: &mut W,
    tracker: &Tracker<S>,
    task_id: TaskId,
    entry_id: EntryId,
) -> Result<()> {
    let task = tracker.task(task_id)?;
    writeln!(writer, "Started {} (entry {entry_id})", task.name)?;
    Ok(())
}

fn write_stopped<W: Write>(writer: &mut W, entry: &TimeEntry) -> Result<()> {
    writeln!(
        writer,
        "Stopped entry {} after {}",
        entry.id,
        format_duration(entry.duration.unwrap_or(0))
    )?;
    Ok(())
}

pub fn start<W: Write, S: Store>(writer: &mut W, tracker: &Tracker<S>, task_id: TaskId) -> Result<()> {
    let entry_id = tracker.start(task_id)?;
    write_started(writer, tracker, task_id, entry_id)
}

pub fn stop<W: Write, S: Store>(writer: &mut W, tracker: &Tracker<S>, note: Option<&str>) -> Result<()> {
    let entry = tracker.stop_active(note)?;
    write_stopped(writer, &entry)
}

pub fn toggle<W: Write, S: Store>(
    writer: &mut W,
    tracker: &Tracker<S>,
    task_id: TaskId,
    note: Option<&str>,
) -> Result<()> {
    match tracker.toggle(task_id, note)? {
        Toggled::Started(entry_id) => write_started(writer, tracker, task_id, entry_id),
        Toggled::Stopped(entry) => write_stopped(writer, &entry),
    }
}

pub fn status<W: Write, S: Store>(writer: &mut W, tracker: &Tracker<S>) -> Result<()> {
    let (Some(session), Some(elapsed)) = (tracker.active(), tracker.elapsed()) else {
        writeln!(writer, "No timer running.")?;
        return Ok(());
    };
    let task = tracker.task(session.task_id)?;
    writeln!(
        writer,
        "Running: {} (entry {}) {}",
        task.name,
        session.entry_id,
        format_clock(elapsed)
    )?;
    Ok(())
}
