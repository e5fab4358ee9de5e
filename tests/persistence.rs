//! Persistence tests for the iCalendar file store.
//!
//! These tests verify that saved events survive a store reopen cycle and
//! that the written file is valid iCalendar.

use chrono::{Duration, Local, TimeZone};

use scribecal::calendar::{CalendarStore, IcsFileStore, save_event};
use scribecal::candidate::ReconciledEvent;

fn event(title: &str, hour: u32) -> ReconciledEvent {
    let start = Local.with_ymd_and_hms(2025, 11, 10, hour, 0, 0).unwrap();
    ReconciledEvent {
        title: title.into(),
        notes: Some("recognized flyer text".into()),
        venue: Some("Main Hall".into()),
        start,
        end: start + Duration::hours(1),
    }
}

#[test]
fn saved_events_survive_reopen() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("events.ics");

    let mut store = IcsFileStore::new(&path);
    save_event(&mut store, &event("Board Meeting", 14)).unwrap();
    drop(store);

    let mut reopened = IcsFileStore::new(&path);
    save_event(&mut reopened, &event("Retrospective", 16)).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("BEGIN:VEVENT").count(), 2);
    assert!(contents.contains("SUMMARY:Board Meeting"));
    assert!(contents.contains("SUMMARY:Retrospective"));
}

#[test]
fn written_file_is_parseable_icalendar() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("events.ics");

    let mut store = IcsFileStore::new(&path);
    save_event(&mut store, &event("Town Hall", 10)).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let parsed: icalendar::Calendar = contents.parse().unwrap();
    assert_eq!(parsed.components.len(), 1);
}

#[test]
fn corrupt_file_does_not_break_the_store() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("events.ics");
    std::fs::write(&path, "not an icalendar file").unwrap();

    let mut store = IcsFileStore::new(&path);
    let id = store
        .save(&path.display().to_string(), &event("Fresh Start", 9))
        .unwrap();
    assert!(!id.is_empty());

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.matches("BEGIN:VEVENT").count(), 1);
}
