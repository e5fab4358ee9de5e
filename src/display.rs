//! Presentation projection of extracted and reconciled events.

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::candidate::{EventCandidate, ReconciledEvent};

/// What the presentation layer renders: all date/time fields optional, with
/// a derived interval that only exists once the event is fully resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisplayEvent {
    pub id: String,
    pub title: String,
    pub day: Option<NaiveDate>,
    pub start: Option<DateTime<Local>>,
    pub end: Option<DateTime<Local>>,
    pub venue: Option<String>,
    pub notes: Option<String>,
}

impl DisplayEvent {
    /// Projection of a still-partial candidate.
    pub fn from_candidate(id: impl Into<String>, candidate: &EventCandidate) -> Self {
        Self {
            id: id.into(),
            title: candidate.title.clone(),
            day: candidate.date_only,
            start: candidate.start_time,
            end: candidate.end_time,
            venue: candidate.venue.clone(),
            notes: Some(candidate.notes.clone()).filter(|n| !n.is_empty()),
        }
    }

    /// Projection of a reconciled event; the day derives from the start.
    pub fn from_reconciled(id: impl Into<String>, event: &ReconciledEvent) -> Self {
        Self {
            id: id.into(),
            title: event.title.clone(),
            day: Some(event.start.date_naive()),
            start: Some(event.start),
            end: Some(event.end),
            venue: event.venue.clone(),
            notes: event.notes.clone(),
        }
    }

    /// The event's interval, valid only when a calendar day and both
    /// instants are present.
    pub fn interval(&self) -> Option<(DateTime<Local>, DateTime<Local>)> {
        match (self.day, self.start, self.end) {
            (Some(_), Some(start), Some(end)) => Some((start, end)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    #[test]
    fn interval_requires_day_and_both_instants() {
        let start = Local.with_ymd_and_hms(2025, 6, 1, 9, 0, 0).unwrap();
        let event = ReconciledEvent {
            title: "T".into(),
            notes: None,
            venue: None,
            start,
            end: start + Duration::hours(1),
        };
        let display = DisplayEvent::from_reconciled("1", &event);
        assert!(display.interval().is_some());

        let partial = DisplayEvent::from_candidate("2", &EventCandidate::bare("x"));
        assert!(partial.interval().is_none());
    }
}
