//! Calendar store boundary: access states, target selection, and store
//! backends.
//!
//! The core hands a [`ReconciledEvent`] to a [`CalendarStore`]; everything
//! else about calendar management belongs to the platform. Target selection
//! prefers the default writable calendar, then the first calendar that
//! permits modification, and fails otherwise.

use std::path::PathBuf;

use chrono::Utc;
use icalendar::{Component, EventLike};
use miette::Diagnostic;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::candidate::ReconciledEvent;

/// Calendar access state reported by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CalendarAccess {
    NotDetermined,
    Authorized,
    Denied,
    Restricted,
}

/// Errors from the calendar store boundary.
#[derive(Debug, Error, Diagnostic)]
pub enum CalendarError {
    #[error("calendar access has not been requested yet")]
    #[diagnostic(
        code(scribecal::calendar::access_not_determined),
        help("Request calendar access before saving events.")
    )]
    AccessNotDetermined,

    #[error("calendar access was denied")]
    #[diagnostic(
        code(scribecal::calendar::access_denied),
        help("Grant calendar access in the system privacy settings, then retry.")
    )]
    AccessDenied,

    #[error("calendar access is restricted on this device")]
    #[diagnostic(
        code(scribecal::calendar::access_restricted),
        help("A device policy prevents calendar access; saving is not possible.")
    )]
    AccessRestricted,

    #[error("no writable calendar is available")]
    #[diagnostic(
        code(scribecal::calendar::no_writable),
        help("Add a calendar that permits modification, or mark one as default.")
    )]
    NoWritableCalendar,

    #[error("calendar store rejected the save: {message}")]
    #[diagnostic(
        code(scribecal::calendar::store),
        help("The underlying store reported an error; see the message for details.")
    )]
    Store { message: String },
}

/// A calendar known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub id: String,
    pub title: String,
    pub allows_modifications: bool,
    pub is_default: bool,
}

/// Where reconciled events end up.
pub trait CalendarStore {
    /// Current access state.
    fn access(&self) -> CalendarAccess;

    /// Calendars known to the store.
    fn calendars(&self) -> Vec<Calendar>;

    /// Save the event into the named calendar, returning the stored
    /// event's identifier.
    fn save(&mut self, calendar_id: &str, event: &ReconciledEvent) -> Result<String, CalendarError>;
}

/// Target selection policy: the default writable calendar, else the first
/// writable one.
pub fn select_target_calendar(calendars: &[Calendar]) -> Result<&Calendar, CalendarError> {
    calendars
        .iter()
        .find(|c| c.is_default && c.allows_modifications)
        .or_else(|| calendars.iter().find(|c| c.allows_modifications))
        .ok_or(CalendarError::NoWritableCalendar)
}

/// Save an event through the store: check access, pick the target calendar,
/// save. Each non-authorized access state surfaces as its own error.
pub fn save_event(
    store: &mut dyn CalendarStore,
    event: &ReconciledEvent,
) -> Result<String, CalendarError> {
    match store.access() {
        CalendarAccess::Authorized => {}
        CalendarAccess::NotDetermined => return Err(CalendarError::AccessNotDetermined),
        CalendarAccess::Denied => return Err(CalendarError::AccessDenied),
        CalendarAccess::Restricted => return Err(CalendarError::AccessRestricted),
    }

    let calendars = store.calendars();
    let target_id = select_target_calendar(&calendars)?.id.clone();
    let event_id = store.save(&target_id, event)?;
    tracing::debug!(calendar = %target_id, event = %event_id, "event saved");
    Ok(event_id)
}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// In-memory store for tests and dry runs.
#[derive(Debug, Clone)]
pub struct MemoryCalendarStore {
    access: CalendarAccess,
    calendars: Vec<Calendar>,
    saved: Vec<(String, ReconciledEvent)>,
}

impl MemoryCalendarStore {
    /// Store with a single default writable calendar.
    pub fn new(access: CalendarAccess) -> Self {
        Self::with_calendars(
            access,
            vec![Calendar {
                id: "personal".into(),
                title: "Personal".into(),
                allows_modifications: true,
                is_default: true,
            }],
        )
    }

    pub fn with_calendars(access: CalendarAccess, calendars: Vec<Calendar>) -> Self {
        Self {
            access,
            calendars,
            saved: Vec::new(),
        }
    }

    /// Saved `(calendar_id, event)` pairs, in save order.
    pub fn saved(&self) -> &[(String, ReconciledEvent)] {
        &self.saved
    }
}

impl CalendarStore for MemoryCalendarStore {
    fn access(&self) -> CalendarAccess {
        self.access
    }

    fn calendars(&self) -> Vec<Calendar> {
        self.calendars.clone()
    }

    fn save(&mut self, calendar_id: &str, event: &ReconciledEvent) -> Result<String, CalendarError> {
        if !self.calendars.iter().any(|c| c.id == calendar_id) {
            return Err(CalendarError::Store {
                message: format!("unknown calendar: {calendar_id}"),
            });
        }
        self.saved.push((calendar_id.to_string(), event.clone()));
        Ok(format!("evt-{}", self.saved.len()))
    }
}

// ---------------------------------------------------------------------------
// .ics file store
// ---------------------------------------------------------------------------

/// Store appending events to an iCalendar file.
///
/// An existing file is re-read on construction so repeated runs accumulate
/// events instead of clobbering them.
#[derive(Debug)]
pub struct IcsFileStore {
    path: PathBuf,
    calendar: icalendar::Calendar,
}

impl IcsFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let calendar = match std::fs::read_to_string(&path) {
            Ok(contents) => contents.parse::<icalendar::Calendar>().unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "existing file is not valid iCalendar, starting fresh");
                icalendar::Calendar::new()
            }),
            Err(_) => icalendar::Calendar::new(),
        };
        Self { path, calendar }
    }
}

impl CalendarStore for IcsFileStore {
    fn access(&self) -> CalendarAccess {
        CalendarAccess::Authorized
    }

    fn calendars(&self) -> Vec<Calendar> {
        vec![Calendar {
            id: self.path.display().to_string(),
            title: self
                .path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "events".into()),
            allows_modifications: true,
            is_default: true,
        }]
    }

    fn save(&mut self, _calendar_id: &str, event: &ReconciledEvent) -> Result<String, CalendarError> {
        let uid = format!(
            "{}-{}@scribecal",
            event.start.timestamp(),
            self.calendar.components.len() + 1
        );

        let mut ics_event = icalendar::Event::new();
        ics_event
            .uid(&uid)
            .summary(&event.title)
            .starts(event.start.with_timezone(&Utc))
            .ends(event.end.with_timezone(&Utc));
        if let Some(venue) = &event.venue {
            ics_event.location(venue);
        }
        if let Some(notes) = &event.notes {
            ics_event.description(notes);
        }
        self.calendar.push(ics_event.done());

        std::fs::write(&self.path, self.calendar.to_string()).map_err(|e| {
            CalendarError::Store {
                message: format!("write {}: {e}", self.path.display()),
            }
        })?;
        Ok(uid)
    }
}
