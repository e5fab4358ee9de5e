//! Event data model: the canonical extraction candidate and the final
//! reconciled event.
//!
//! An [`EventCandidate`] is the single output of one pipeline run. Its
//! date/time fields are deliberately partial: `date_only` carries a calendar
//! day with no time-of-day (enforced by its `NaiveDate` type), while
//! `start_time`/`end_time` carry full instants that may sit on an unrelated
//! day. The reconciler combines them into a [`ReconciledEvent`].

use chrono::{DateTime, Local, NaiveDate};
use serde::{Deserialize, Serialize};

/// Title used when no usable title could be extracted.
pub const DEFAULT_TITLE: &str = "New Event";

/// Canonical intermediate produced by an extraction stage.
///
/// Exactly one stage's output becomes the canonical candidate for a given
/// input text; stage outputs are never merged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventCandidate {
    /// Event title; never empty (defaults to [`DEFAULT_TITLE`]).
    pub title: String,
    /// Calendar day with no time-of-day component. Never used alone to
    /// imply a time.
    pub date_only: Option<NaiveDate>,
    /// Full start instant. May carry a day-of-month unrelated to
    /// `date_only`; reconciliation resolves the conflict.
    pub start_time: Option<DateTime<Local>>,
    /// Full end instant.
    pub end_time: Option<DateTime<Local>>,
    /// Venue or address text.
    pub venue: Option<String>,
    /// The full original recognized text, retained verbatim for audit.
    pub notes: String,
}

impl EventCandidate {
    /// A minimal candidate: default title, no date/time/venue fields, and
    /// the given text as notes.
    pub fn bare(notes: impl Into<String>) -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            date_only: None,
            start_time: None,
            end_time: None,
            venue: None,
            notes: notes.into(),
        }
    }
}

/// Final event handed to the calendar store collaborator.
///
/// Both instants are concrete. No `end >= start` invariant is enforced,
/// but the reconciler's default policies never produce `end < start`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconciledEvent {
    pub title: String,
    pub notes: Option<String>,
    pub venue: Option<String>,
    pub start: DateTime<Local>,
    pub end: DateTime<Local>,
}
