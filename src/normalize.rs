//! Date/time normalization: heterogeneous strings into local instants.
//!
//! Input strings come from the generative model and are not trusted to be in
//! any single format. [`normalize`] runs an ordered table of parse attempts:
//! explicit-offset forms first (sub-second, then whole-second), then
//! local-wall-clock forms for strings that carry no zone marker. The first
//! success wins; total failure yields `None`, never an error.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, TimeZone};

type ParseAttempt = fn(&str) -> Option<DateTime<Local>>;

/// Parse attempts in priority order.
const ATTEMPTS: &[ParseAttempt] = &[
    parse_offset_subseconds,
    parse_offset_whole_seconds,
    parse_local_with_seconds,
    parse_local_without_seconds,
];

/// Parse a date/time string into a local instant.
///
/// Offset-bearing strings (`2025-11-03T18:30:00Z`, `...+02:00`) are
/// authoritative and converted to the local zone. Zone-less strings
/// (`2025-11-03T18:30:00`, with or without seconds, `T`- or
/// space-separated) are interpreted as local wall-clock time.
pub fn normalize(text: &str) -> Option<DateTime<Local>> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    ATTEMPTS.iter().find_map(|attempt| attempt(trimmed))
}

/// Parse a bare calendar date (`2025-11-03` or `2025/11/03`).
///
/// Never attaches a time-of-day.
pub fn normalize_date_only(text: &str) -> Option<NaiveDate> {
    let trimmed = text.trim();
    ["%Y-%m-%d", "%Y/%m/%d"]
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(trimmed, fmt).ok())
}

/// Resolve a naive local datetime, picking the earlier instant when DST
/// makes the wall-clock time ambiguous.
pub(crate) fn resolve_local(naive: NaiveDateTime) -> Option<DateTime<Local>> {
    let mapped = Local.from_local_datetime(&naive);
    mapped.single().or_else(|| mapped.earliest())
}

fn parse_offset_subseconds(s: &str) -> Option<DateTime<Local>> {
    if !s.contains('.') {
        return None;
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}

fn parse_offset_whole_seconds(s: &str) -> Option<DateTime<Local>> {
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Local))
}

/// Whether the string carries an explicit zone: a trailing `Z`, or a
/// `+`/`-` offset after the date/time separator. Hyphens inside the date
/// part do not count.
fn has_zone_marker(s: &str) -> bool {
    if s.ends_with('Z') || s.ends_with('z') {
        return true;
    }
    match s.find('T').or_else(|| s.find(' ')) {
        Some(i) => {
            let time_part = &s[i + 1..];
            time_part.contains('+') || time_part.contains('-')
        }
        None => false,
    }
}

fn parse_local_with_seconds(s: &str) -> Option<DateTime<Local>> {
    if has_zone_marker(s) {
        return None;
    }
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(resolve_local)
}

fn parse_local_without_seconds(s: &str) -> Option<DateTime<Local>> {
    if has_zone_marker(s) {
        return None;
    }
    ["%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .and_then(resolve_local)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};

    #[test]
    fn offset_string_converts_to_local() {
        let parsed = normalize("2025-11-03T18:30:00Z").unwrap();
        let expected = DateTime::parse_from_rfc3339("2025-11-03T18:30:00Z")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(parsed, expected);
        assert_eq!(parsed.with_timezone(&Utc).hour(), 18);
    }

    #[test]
    fn subsecond_offset_string_parses() {
        let parsed = normalize("2025-11-03T18:30:00.250+02:00").unwrap();
        let expected = DateTime::parse_from_rfc3339("2025-11-03T18:30:00.250+02:00")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn zoneless_string_is_local_wall_clock() {
        let parsed = normalize("2025-11-03T18:30:00").unwrap();
        assert_eq!(parsed.naive_local().to_string(), "2025-11-03 18:30:00");
    }

    #[test]
    fn zoneless_without_seconds_parses() {
        let parsed = normalize("2025-11-03 18:30").unwrap();
        assert_eq!(parsed.naive_local().to_string(), "2025-11-03 18:30:00");
    }

    #[test]
    fn normalization_is_deterministic() {
        let a = normalize("2025-11-03T18:30:00Z");
        let b = normalize("2025-11-03T18:30:00Z");
        assert_eq!(a, b);
        assert!(a.is_some());
    }

    #[test]
    fn malformed_string_yields_none() {
        assert!(normalize("2025-13-40Txx").is_none());
        assert!(normalize("next blursday").is_none());
        assert!(normalize("").is_none());
        assert!(normalize("   ").is_none());
    }

    #[test]
    fn negative_offset_is_not_mistaken_for_date_hyphen() {
        let parsed = normalize("2025-11-03T18:30:00-05:00").unwrap();
        let expected = DateTime::parse_from_rfc3339("2025-11-03T18:30:00-05:00")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(parsed, expected);
    }

    #[test]
    fn date_only_recognizes_bare_dates() {
        assert_eq!(
            normalize_date_only("2025-11-03"),
            NaiveDate::from_ymd_opt(2025, 11, 3)
        );
        assert_eq!(
            normalize_date_only("2025/11/03"),
            NaiveDate::from_ymd_opt(2025, 11, 3)
        );
    }

    #[test]
    fn date_only_rejects_datetimes_and_garbage() {
        assert!(normalize_date_only("2025-11-03T18:30:00Z").is_none());
        assert!(normalize_date_only("2025-13-40").is_none());
        assert!(normalize_date_only("soon").is_none());
    }
}
