//! Group management commands.

use std::io::Write;

use anyhow::Result;
use att_core::{Store, Tracker};

use super::util::{write_json, write_table};
use crate::cli::GroupAction;

pub fn run<W: Write, S: Store>(
    writer: &mut W,
    tracker: &Tracker<S>,
    action: &GroupAction,
) -> Result<()> {
    match action {
        GroupAction::Add { name } => {
            let group = tracker.create_group(name)?;
            writeln!(writer, "Created group {}: {}", group.id, group.name)?;
        }
        GroupAction::List { json } => {
            let groups = tracker.groups()?;
            if *json {
                return write_json(writer, &groups);
            }
            if groups.is_empty() {
                writeln!(writer, "No groups.")?;
                return Ok(());
            }
            let rows: Vec<Vec<String>> = groups
                .iter()
                .map(|g| vec![g.id.to_string(), g.name.to_string()])
                .collect();
            write_table(writer, &["ID", "Name"], &rows)?;
        }
        GroupAction::Delete { id } => {
            tracker.delete_group(*id)?;
            writeln!(writer, "Deleted group {id}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::Arc;

    use att_core::{GroupId, ManualClock, MemoryStore};
    use chrono::{TimeZone, Utc};
    use insta::assert_snapshot;

    fn tracker() -> Tracker<MemoryStore> {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2025, 10, 1, 9, 0, 0).unwrap(),
        ));
        Tracker::new(MemoryStore::new(), clock).unwrap()
    }

    fn render(tracker: &Tracker<MemoryStore>, action: &GroupAction) -> String {
        let mut output = Vec::new();
        run(&mut output, tracker, action).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn add_then_list() {
        let tracker = tracker();
        let created = render(
            &tracker,
            &GroupAction::Add {
                name: "Work".into(),
            },
        );
        render(
            &tracker,
            &GroupAction::Add {
                name: "Study".into(),
            },
        );
        assert_snapshot!(created, @"Created group 1: Work");

        let listed = render(&tracker, &GroupAction::List { json: false });
        assert_snapshot!(listed, @r"
        ID  Name
        1   Work
        2   Study
        ");
    }

    #[test]
    fn list_json() {
        let tracker = tracker();
        tracker.create_group("Work").unwrap();
        let output = render(&tracker, &GroupAction::List { json: true });
        assert_snapshot!(output, @r#"
        [
          {
            "id": 1,
            "name": "Work"
          }
        ]
        "#);
    }

    #[test]
    fn list_empty() {
        let output = render(&tracker(), &GroupAction::List { json: false });
        assert_snapshot!(output, @"No groups.");
    }

    #[test]
    fn delete_unknown_group_fails() {
        let tracker = tracker();
        let mut output = Vec::new();
        let err = run(
            &mut output,
            &tracker,
            &GroupAction::Delete {
                id: GroupId::new(3).unwrap(),
            },
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "group 3 not found");
    }

    #[test]
    fn blank_name_is_rejected() {
        let tracker = tracker();
        let mut output = Vec::new();
        let err = run(&mut output, &tracker, &GroupAction::Add { name: "  ".into() }).unwrap_err();
        assert_eq!(err.to_string(), "group name cannot be empty");
    }
}
