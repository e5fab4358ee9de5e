//! Date/time reconciliation: partial candidate fragments into concrete
//! start/end instants.
//!
//! A candidate may carry a calendar day, a start instant on an unrelated
//! day, an end instant, any subset, or none. Reconciliation resolves them
//! under explicit default policies: the calendar day wins for the date, the
//! start instant wins for the time-of-day, a date alone lands at noon, and
//! a missing end defaults to one hour after the start.

use chrono::{DateTime, Duration, Local, NaiveDate};
use miette::Diagnostic;
use thiserror::Error;

use crate::candidate::{EventCandidate, ReconciledEvent};
use crate::normalize::resolve_local;

/// Errors from reconciliation.
#[derive(Debug, Error, Diagnostic)]
pub enum ReconcileError {
    #[error("could not determine start and end for the event")]
    #[diagnostic(
        code(scribecal::reconcile::no_start),
        help(
            "The candidate carries neither a calendar day nor a start time. \
             Re-run extraction on text that mentions a date or a time."
        )
    )]
    NoDeterminableStart,
}

/// Result type for reconciliation.
pub type ReconcileResult<T> = std::result::Result<T, ReconcileError>;

/// Combine a calendar day with the time-of-day of an instant, in the local
/// calendar. `None` when the resulting wall-clock time does not exist
/// (DST gap).
pub fn combine(day: NaiveDate, time: &DateTime<Local>) -> Option<DateTime<Local>> {
    resolve_local(day.and_time(time.time()))
}

/// Resolve a candidate's fragments into a concrete event.
pub fn reconcile(candidate: &EventCandidate) -> ReconcileResult<ReconciledEvent> {
    let start = resolve_start(candidate).ok_or(ReconcileError::NoDeterminableStart)?;
    let end = resolve_end(candidate, start);

    Ok(ReconciledEvent {
        title: candidate.title.clone(),
        notes: Some(candidate.notes.clone()).filter(|n| !n.is_empty()),
        venue: candidate.venue.clone(),
        start,
        end,
    })
}

/// Start resolution, in priority order: day+time combined, the start
/// instant as-is, the day alone at local noon.
fn resolve_start(candidate: &EventCandidate) -> Option<DateTime<Local>> {
    match (candidate.date_only, &candidate.start_time) {
        (Some(day), Some(start)) => combine(day, start).or(Some(*start)),
        (None, Some(start)) => Some(*start),
        (Some(day), None) => resolve_local(day.and_hms_opt(12, 0, 0)?),
        (None, None) => None,
    }
}

/// End resolution: an end instant realigned onto the start's calendar day
/// when a day is known and the raw end disagrees with the start; the raw
/// end otherwise; start + 1 hour when no end was extracted.
fn resolve_end(candidate: &EventCandidate, start: DateTime<Local>) -> DateTime<Local> {
    if let Some(end) = candidate.end_time {
        if let Some(day) = candidate.date_only {
            if start != end {
                return combine(day, &end).unwrap_or(end);
            }
        }
        return end;
    }
    start + Duration::hours(1)
}
