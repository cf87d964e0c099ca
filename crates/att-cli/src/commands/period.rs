//! Academic period commands.

use std::io::Write;

use anyhow::Result;
use att_core::period::{self, PeriodStatus};
use att_core::{Period, Store, Tracker};
use chrono::NaiveDate;

use super::util::{write_json, write_table};
use crate::cli::PeriodAction;

fn status_label(period: &Period, today: NaiveDate) -> &'static str {
    match period::classify(period, today) {
        PeriodStatus::Future => "future",
        PeriodStatus::Active if period.contains(today) => "current",
        PeriodStatus::Active => "past",
    }
}

pub fn run<W: Write, S: Store>(
    writer: &mut W,
    tracker: &Tracker<S>,
    action: &PeriodAction,
) -> Result<()> {
    match action {
        PeriodAction::Add { name, start, end } => {
            let period = tracker.create_period_from_strings(name, start, end)?;
            writeln!(
                writer,
                "Created period {}: {} ({} to {})",
                period.id, period.name, period.start_date, period.end_date
            )?;
        }
        PeriodAction::List { json } => {
            let periods = tracker.periods()?;
            if *json {
                return write_json(writer, &periods);
            }
            if periods.is_empty() {
                writeln!(writer, "No periods.")?;
                return Ok(());
            }
            let today = tracker.today();
            let rows: Vec<Vec<String>> = periods
                .iter()
                .map(|p| {
                    vec![
                        p.id.to_string(),
                        p.name.to_string(),
                        p.start_date.to_string(),
                        p.end_date.to_string(),
                        status_label(p, today).to_string(),
                    ]
                })
                .collect();
            write_table(writer, &["ID", "Name", "Start", "End", "Status"], &rows)?;
        }
        PeriodAction::Delete { id } => {
            tracker.delete_period(*id)?;
            writeln!(writer, "Deleted period {id}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use att_core::{ManualClock, MemoryStore};
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;

    fn tracker() -> Tracker<MemoryStore> {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap(),
        ));
        Tracker::new(MemoryStore::new(), clock).unwrap()
    }

    fn render(tracker: &Tracker<MemoryStore>, action: &PeriodAction) -> String {
        let mut output = Vec::new();
        run(&mut output, tracker, action).unwrap();
        String::from_utf8(output).unwrap()
    }

    fn add(name: &str, start: &str, end: &str) -> PeriodAction {
        PeriodAction::Add {
            name: name.into(),
            start: start.into(),
            end: end.into(),
        }
    }

    #[test]
    fn list_labels_each_period() {
        let tracker = tracker();
        let created = render(&tracker, &add("Spring 2025", "2025-02-01", "2025-06-01"));
        assert_snapshot!(created, @"Created period 1: Spring 2025 (2025-02-01 to 2025-06-01)");
        render(&tracker, &add("Fall 2025", "2025-09-01", "2025-12-20"));
        render(&tracker, &add("Spring 2026", "2026-02-01", "2026-06-01"));

        let listed = render(&tracker, &PeriodAction::List { json: false });
        assert_snapshot!(listed, @r"
        ID  Name         Start       End         Status
        1   Spring 2025  2025-02-01  2025-06-01  past
        2   Fall 2025    2025-09-01  2025-12-20  current
        3   Spring 2026  2026-02-01  2026-06-01  future
        ");
    }

    #[test]
    fn list_json_uses_calendar_dates() {
        let tracker = tracker();
        render(&tracker, &add("Fall 2025", "2025-09-01", "2025-12-20"));
        let output = render(&tracker, &PeriodAction::List { json: true });
        assert_snapshot!(output, @r#"
        [
          {
            "id": 1,
            "name": "Fall 2025",
            "start_date": "2025-09-01",
            "end_date": "2025-12-20"
          }
        ]
        "#);
    }

    #[test]
    fn add_rejects_bad_dates() {
        let tracker = tracker();
        let mut output = Vec::new();

        let err = run(&mut output, &tracker, &add("Fall", "2025-12-20", "2025-09-01")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "start date 2025-12-20 is after end date 2025-09-01"
        );

        let err = run(&mut output, &tracker, &add("Fall", "09/01/2025", "2025-12-20")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "invalid start date '09/01/2025': use YYYY-MM-DD"
        );

        let err = run(&mut output, &tracker, &add("Fall", "", "2025-12-20")).unwrap_err();
        assert_eq!(err.to_string(), "start date is required");
    }
}
