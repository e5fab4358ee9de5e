//! Deterministic fallback extraction.
//!
//! Pattern-based extraction that works without a generative model. This
//! stage is total: arbitrary OCR noise still yields a usable candidate with
//! a non-empty title and the original text as notes.

use std::sync::LazyLock;

use chrono::{DateTime, Duration, Local};
use regex::Regex;

use crate::candidate::EventCandidate;
use crate::detect::DateTimeDetector;

/// Keywords that introduce a venue phrase, and disqualify a line from
/// serving as the title.
const VENUE_KEYWORDS: &[&str] = &["venue", "at", "location", "place", "address"];

/// Venue phrase: keyword, optional colon, everything up to the next
/// newline or period.
static VENUE_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:venue|at|location|place|address)\b\s*:?\s*([^\n.]+)").unwrap()
});

/// The regex/pattern fallback extractor.
pub struct HeuristicStage {
    reference: Option<DateTime<Local>>,
}

impl HeuristicStage {
    /// Stage resolving relative dates against the wall clock at call time.
    pub fn new() -> Self {
        Self { reference: None }
    }

    /// Stage resolving relative dates against a fixed reference instant.
    pub fn with_reference(reference: DateTime<Local>) -> Self {
        Self {
            reference: Some(reference),
        }
    }

    /// Extract an event candidate from `text`. Never fails.
    pub fn extract(&self, text: &str) -> EventCandidate {
        let detector = match self.reference {
            Some(r) => DateTimeDetector::new(r),
            None => DateTimeDetector::now(),
        };

        let mut candidate = EventCandidate::bare(text);

        if let Some(found) = detector.detect(text) {
            candidate.start_time = Some(found.instant);
            if found.duration > Duration::zero() {
                candidate.end_time = Some(found.instant + found.duration);
            }
            // The detected instant's day, with the time-of-day zeroed out.
            candidate.date_only = Some(found.instant.date_naive());
        }

        candidate.venue = find_venue(text, &detector);
        if let Some(title) = find_title(text, &detector) {
            candidate.title = title;
        }

        candidate
    }
}

impl Default for HeuristicStage {
    fn default() -> Self {
        Self::new()
    }
}

/// First venue-keyword capture that is non-empty and not itself a date/time
/// span ("at 9:00 AM" introduces a time, not a venue).
fn find_venue(text: &str, detector: &DateTimeDetector) -> Option<String> {
    VENUE_PATTERN
        .captures_iter(text)
        .filter_map(|caps| {
            let phrase = caps.get(1)?.as_str().trim();
            if phrase.is_empty() || detector.detect(phrase).is_some() {
                return None;
            }
            Some(phrase.to_string())
        })
        .next()
}

/// First non-empty line that carries no venue keyword and is not itself a
/// date/time span.
fn find_title(text: &str, detector: &DateTimeDetector) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .find(|line| {
            let lower = line.to_lowercase();
            !VENUE_KEYWORDS.iter().any(|kw| lower.contains(kw))
                && detector.detect(line).is_none()
        })
        .map(str::to_string)
}
