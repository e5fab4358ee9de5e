//! Free-text date/time span detection.
//!
//! Scans recognized text for the first date/time expression and an optional
//! attached duration. Patterns cover ISO dates, month-name dates, weekday
//! names, today/tomorrow, and clock times with am/pm; the match with the
//! smallest start offset wins, ties broken by pattern specificity. Only the
//! first recognizable span is used — later date mentions are ignored.
//!
//! Resolution is relative to an injected reference instant, so behavior is
//! deterministic under test.

use std::sync::LazyLock;

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, Local, NaiveDate, NaiveTime, TimeZone,
};
use regex::Regex;

use crate::normalize::resolve_local;

/// A detected date/time span.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Resolved instant of the first date/time expression in the text.
    pub instant: DateTime<Local>,
    /// Attached duration (zero when the text gives only a point in time).
    pub duration: Duration,
}

/// Pattern table, compiled once.
struct SpanPatterns {
    iso_date: Regex,
    month_day: Regex,
    relative_day: Regex,
    weekday: Regex,
    clock_hm: Regex,
    clock_bare: Regex,
    time_prefix: Regex,
    lead_clock_hm: Regex,
    lead_clock_bare: Regex,
    attached_day: Regex,
    range_sep: Regex,
    for_duration: Regex,
}

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?\
                      |aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";
const WEEKDAYS: &str = "mon(?:day)?|tue(?:s(?:day)?)?|wed(?:nesday)?|thu(?:rs(?:day)?)?\
                        |fri(?:day)?|sat(?:urday)?|sun(?:day)?";

static PATTERNS: LazyLock<SpanPatterns> = LazyLock::new(|| SpanPatterns {
    iso_date: Regex::new(
        r"\b(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{1,2}):(\d{2})(?::(\d{2}))?\s*(Z|[+-]\d{2}:?\d{2})?)?",
    )
    .unwrap(),
    month_day: Regex::new(&format!(
        r"(?i)\b({MONTHS})\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(\d{{4}}))?\b"
    ))
    .unwrap(),
    relative_day: Regex::new(r"(?i)\b(today|tomorrow)\b").unwrap(),
    weekday: Regex::new(&format!(r"(?i)\b(next\s+)?({WEEKDAYS})\b")).unwrap(),
    clock_hm: Regex::new(r"(?i)\b(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([ap])\.?m\.?)?\b").unwrap(),
    clock_bare: Regex::new(r"(?i)\b(\d{1,2})\s*([ap])\.?m\.?\b").unwrap(),
    time_prefix: Regex::new(r"(?i)^[,\s]*(?:(?:at|from)\s+|@\s*)?").unwrap(),
    lead_clock_hm: Regex::new(r"(?i)^(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s*([ap])\.?m\.?)?\b")
        .unwrap(),
    lead_clock_bare: Regex::new(r"(?i)^(\d{1,2})\s*([ap])\.?m\.?\b").unwrap(),
    attached_day: Regex::new(&format!(
        r"(?i)^[,\s]*(?:on\s+)?(next\s+)?(today|tomorrow|{WEEKDAYS})\b"
    ))
    .unwrap(),
    range_sep: Regex::new(r"(?i)^\s*(?:-|–|—|to|until|till)\s*").unwrap(),
    for_duration: Regex::new(r"(?i)^\s*for\s+(\d+)\s*(hours?|hrs?|minutes?|mins?)\b").unwrap(),
});

// Anchor kinds, in tie-break priority order (more specific first).
const K_ISO: u8 = 0;
const K_MONTH_DAY: u8 = 1;
const K_RELATIVE: u8 = 2;
const K_WEEKDAY: u8 = 3;
const K_CLOCK_HM: u8 = 4;
const K_CLOCK_BARE: u8 = 5;

/// Detects the first date/time span in free text, resolving relative
/// expressions against a fixed reference instant.
#[derive(Debug, Clone)]
pub struct DateTimeDetector {
    reference: DateTime<Local>,
}

impl DateTimeDetector {
    /// Detector resolving against the given reference instant.
    pub fn new(reference: DateTime<Local>) -> Self {
        Self { reference }
    }

    /// Detector resolving against the current wall-clock time.
    pub fn now() -> Self {
        Self::new(Local::now())
    }

    /// Scan `text` for the first recognizable date/time span.
    pub fn detect(&self, text: &str) -> Option<Detection> {
        let p = &*PATTERNS;
        let mut anchors: Vec<(usize, u8)> = Vec::new();
        for m in p.iso_date.find_iter(text) {
            anchors.push((m.start(), K_ISO));
        }
        for m in p.month_day.find_iter(text) {
            anchors.push((m.start(), K_MONTH_DAY));
        }
        for m in p.relative_day.find_iter(text) {
            anchors.push((m.start(), K_RELATIVE));
        }
        for m in p.weekday.find_iter(text) {
            anchors.push((m.start(), K_WEEKDAY));
        }
        for m in p.clock_hm.find_iter(text) {
            anchors.push((m.start(), K_CLOCK_HM));
        }
        for m in p.clock_bare.find_iter(text) {
            anchors.push((m.start(), K_CLOCK_BARE));
        }
        anchors.sort_unstable();

        anchors
            .into_iter()
            .find_map(|(start, kind)| self.resolve_anchor(text, start, kind))
    }

    fn resolve_anchor(&self, text: &str, start: usize, kind: u8) -> Option<Detection> {
        match kind {
            K_ISO => self.resolve_iso(text, start),
            K_MONTH_DAY => self.resolve_month_day(text, start),
            K_RELATIVE | K_WEEKDAY => self.resolve_day_word(text, start, kind),
            K_CLOCK_HM | K_CLOCK_BARE => self.resolve_clock(text, start, kind),
            _ => None,
        }
    }

    fn resolve_iso(&self, text: &str, start: usize) -> Option<Detection> {
        let p = &*PATTERNS;
        let caps = p.iso_date.captures_at(text, start)?;
        if caps.get(0)?.start() != start {
            return None;
        }
        let year: i32 = caps[1].parse().ok()?;
        let month: u32 = caps[2].parse().ok()?;
        let day_num: u32 = caps[3].parse().ok()?;
        let day = NaiveDate::from_ymd_opt(year, month, day_num)?;
        let mut end = caps.get(0)?.end();

        if caps.get(4).is_some() {
            let time = parse_time(
                caps[4].parse().ok()?,
                caps[5].parse().ok()?,
                caps.get(6).and_then(|s| s.as_str().parse().ok()).unwrap_or(0),
                None,
            )?;
            let instant = match caps.get(7) {
                Some(off) => resolve_with_offset(day, time, off.as_str())?,
                None => resolve_local(day.and_time(time))?,
            };
            let duration = trailing_duration(&text[end..], time);
            return Some(Detection { instant, duration });
        }

        let (time, explicit) = match attached_time(&text[end..]) {
            Some((t, consumed)) => {
                end += consumed;
                (t, true)
            }
            None => (noon(), false),
        };
        let instant = resolve_local(day.and_time(time))?;
        let duration = if explicit {
            trailing_duration(&text[end..], time)
        } else {
            Duration::zero()
        };
        Some(Detection { instant, duration })
    }

    fn resolve_month_day(&self, text: &str, start: usize) -> Option<Detection> {
        let p = &*PATTERNS;
        let caps = p.month_day.captures_at(text, start)?;
        if caps.get(0)?.start() != start {
            return None;
        }
        let month = month_number(&caps[1])?;
        let day_num: u32 = caps[2].parse().ok()?;
        let day = match caps.get(3) {
            Some(y) => NaiveDate::from_ymd_opt(y.as_str().parse().ok()?, month, day_num)?,
            None => {
                // Year omitted: the next occurrence on or after the reference day.
                let ref_day = self.reference.date_naive();
                let this_year = NaiveDate::from_ymd_opt(ref_day.year(), month, day_num)?;
                if this_year < ref_day {
                    NaiveDate::from_ymd_opt(ref_day.year() + 1, month, day_num)?
                } else {
                    this_year
                }
            }
        };
        self.finish_day_anchor(text, caps.get(0)?.end(), day)
    }

    fn resolve_day_word(&self, text: &str, start: usize, kind: u8) -> Option<Detection> {
        let p = &*PATTERNS;
        let (caps, day) = if kind == K_RELATIVE {
            let caps = p.relative_day.captures_at(text, start)?;
            if caps.get(0)?.start() != start {
                return None;
            }
            let day = self.relative_date(&caps[1])?;
            (caps, day)
        } else {
            let caps = p.weekday.captures_at(text, start)?;
            if caps.get(0)?.start() != start {
                return None;
            }
            let day = self.weekday_date(&caps[2], caps.get(1).is_some())?;
            (caps, day)
        };
        self.finish_day_anchor(text, caps.get(0)?.end(), day)
    }

    fn resolve_clock(&self, text: &str, start: usize, kind: u8) -> Option<Detection> {
        let p = &*PATTERNS;
        let (time, mut end) = if kind == K_CLOCK_HM {
            let caps = p.clock_hm.captures_at(text, start)?;
            if caps.get(0)?.start() != start {
                return None;
            }
            let time = parse_time(
                caps[1].parse().ok()?,
                caps[2].parse().ok()?,
                caps.get(3).and_then(|s| s.as_str().parse().ok()).unwrap_or(0),
                caps.get(4).map(|m| m.as_str().to_ascii_lowercase()),
            )?;
            (time, caps.get(0)?.end())
        } else {
            let caps = p.clock_bare.captures_at(text, start)?;
            if caps.get(0)?.start() != start {
                return None;
            }
            let time = parse_time(
                caps[1].parse().ok()?,
                0,
                0,
                Some(caps[2].to_ascii_lowercase()),
            )?;
            (time, caps.get(0)?.end())
        };

        // A day word directly after the time ("9am tomorrow", "7 PM on Friday")
        // moves the date off the reference day.
        let mut day = self.reference.date_naive();
        if let Some(caps) = p.attached_day.captures(&text[end..]) {
            let word = caps[2].to_ascii_lowercase();
            let resolved = match word.as_str() {
                "today" | "tomorrow" => self.relative_date(&word),
                w => self.weekday_date(w, caps.get(1).is_some()),
            };
            if let Some(d) = resolved {
                day = d;
                end += caps.get(0).map(|m| m.end()).unwrap_or(0);
            }
        }

        let instant = resolve_local(day.and_time(time))?;
        let duration = trailing_duration(&text[end..], time);
        Some(Detection { instant, duration })
    }

    /// Shared tail for date-first anchors: attach a following time (noon when
    /// absent) and a trailing duration.
    fn finish_day_anchor(&self, text: &str, mut end: usize, day: NaiveDate) -> Option<Detection> {
        let (time, explicit) = match attached_time(&text[end..]) {
            Some((t, consumed)) => {
                end += consumed;
                (t, true)
            }
            None => (noon(), false),
        };
        let instant = resolve_local(day.and_time(time))?;
        let duration = if explicit {
            trailing_duration(&text[end..], time)
        } else {
            Duration::zero()
        };
        Some(Detection { instant, duration })
    }

    fn relative_date(&self, word: &str) -> Option<NaiveDate> {
        let ref_day = self.reference.date_naive();
        match word.to_ascii_lowercase().as_str() {
            "today" => Some(ref_day),
            "tomorrow" => ref_day.succ_opt(),
            _ => None,
        }
    }

    /// Next occurrence of the named weekday on or after the reference day;
    /// "next" pushes a same-day hit one week out.
    fn weekday_date(&self, name: &str, next: bool) -> Option<NaiveDate> {
        let target = weekday_number(name)?;
        let current = self.reference.weekday().num_days_from_monday() as i64;
        let mut ahead = (target - current).rem_euclid(7);
        if next && ahead == 0 {
            ahead = 7;
        }
        Some(self.reference.date_naive() + Duration::days(ahead))
    }
}

fn noon() -> NaiveTime {
    NaiveTime::from_hms_opt(12, 0, 0).unwrap()
}

fn month_number(name: &str) -> Option<u32> {
    let key: String = name.to_ascii_lowercase().chars().take(3).collect();
    let n = match key.as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(n)
}

fn weekday_number(name: &str) -> Option<i64> {
    let key: String = name.to_ascii_lowercase().chars().take(3).collect();
    let n = match key.as_str() {
        "mon" => 0,
        "tue" => 1,
        "wed" => 2,
        "thu" => 3,
        "fri" => 4,
        "sat" => 5,
        "sun" => 6,
        _ => return None,
    };
    Some(n)
}

/// Build a time-of-day from clock captures. Returns `None` for out-of-range
/// components (hour 13 with am/pm, minute 61, ...), which makes the whole
/// anchor unrecognizable rather than silently wrong.
fn parse_time(hour: u32, minute: u32, second: u32, meridiem: Option<String>) -> Option<NaiveTime> {
    let hour24 = match meridiem.as_deref() {
        Some(m) => {
            if !(1..=12).contains(&hour) {
                return None;
            }
            match (m, hour) {
                ("a", 12) => 0,
                ("a", h) => h,
                ("p", 12) => 12,
                ("p", h) => h + 12,
                _ => return None,
            }
        }
        None => {
            if hour >= 24 {
                return None;
            }
            hour
        }
    };
    NaiveTime::from_hms_opt(hour24, minute, second)
}

/// Parse an optional ", at 6:30 PM" style time directly following a date
/// anchor. Returns the time and the number of bytes consumed.
fn attached_time(rest: &str) -> Option<(NaiveTime, usize)> {
    let p = &*PATTERNS;
    let prefix = p.time_prefix.find(rest)?;
    let (time, len) = leading_clock(&rest[prefix.end()..])?;
    Some((time, prefix.end() + len))
}

/// Parse a clock time anchored at the start of `rest`.
fn leading_clock(rest: &str) -> Option<(NaiveTime, usize)> {
    let p = &*PATTERNS;
    if let Some(caps) = p.lead_clock_hm.captures(rest) {
        let time = parse_time(
            caps[1].parse().ok()?,
            caps[2].parse().ok()?,
            caps.get(3).and_then(|s| s.as_str().parse().ok()).unwrap_or(0),
            caps.get(4).map(|m| m.as_str().to_ascii_lowercase()),
        )?;
        return Some((time, caps.get(0)?.end()));
    }
    if let Some(caps) = p.lead_clock_bare.captures(rest) {
        let time = parse_time(caps[1].parse().ok()?, 0, 0, Some(caps[2].to_ascii_lowercase()))?;
        return Some((time, caps.get(0)?.end()));
    }
    None
}

/// Duration attached after a time span: a range end ("- 10:30 AM",
/// "to 9 PM") or an explicit length ("for 2 hours"). Zero when absent.
fn trailing_duration(rest: &str, start_time: NaiveTime) -> Duration {
    let p = &*PATTERNS;
    if let Some(sep) = p.range_sep.find(rest) {
        if let Some((end_time, _)) = leading_clock(&rest[sep.end()..]) {
            let mut delta = end_time.signed_duration_since(start_time);
            if delta <= Duration::zero() {
                // "11 PM to 1 AM" crosses midnight.
                delta = delta + Duration::hours(24);
            }
            return delta;
        }
    }
    if let Some(caps) = p.for_duration.captures(rest) {
        if let Ok(n) = caps[1].parse::<i64>() {
            let unit = caps[2].to_ascii_lowercase();
            return if unit.starts_with('h') {
                Duration::hours(n)
            } else {
                Duration::minutes(n)
            };
        }
    }
    Duration::zero()
}

fn resolve_with_offset(day: NaiveDate, time: NaiveTime, offset: &str) -> Option<DateTime<Local>> {
    let seconds = if offset == "Z" {
        0
    } else {
        let sign: i32 = if offset.starts_with('-') { -1 } else { 1 };
        let digits: Vec<u8> = offset.bytes().filter(|b| b.is_ascii_digit()).collect();
        if digits.len() != 4 {
            return None;
        }
        let hours = i32::from(digits[0] - b'0') * 10 + i32::from(digits[1] - b'0');
        let minutes = i32::from(digits[2] - b'0') * 10 + i32::from(digits[3] - b'0');
        sign * (hours * 3600 + minutes * 60)
    };
    let zone = FixedOffset::east_opt(seconds)?;
    zone.from_local_datetime(&day.and_time(time))
        .single()
        .map(|dt| dt.with_timezone(&Local))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    /// Wednesday, 2025-03-05 10:00 local.
    fn detector() -> DateTimeDetector {
        let reference = resolve_local(
            NaiveDate::from_ymd_opt(2025, 3, 5)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        )
        .unwrap();
        DateTimeDetector::new(reference)
    }

    fn day_of(d: &Detection) -> NaiveDate {
        d.instant.date_naive()
    }

    #[test]
    fn iso_date_with_time() {
        let det = detector().detect("Ends 2025-11-03 18:30 sharp").unwrap();
        assert_eq!(day_of(&det), NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());
        assert_eq!(det.instant.time(), NaiveTime::from_hms_opt(18, 30, 0).unwrap());
        assert_eq!(det.duration, Duration::zero());
    }

    #[test]
    fn iso_date_alone_resolves_to_noon() {
        let det = detector().detect("Deadline: 2025-11-03").unwrap();
        assert_eq!(day_of(&det), NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());
        assert_eq!(det.instant.hour(), 12);
    }

    #[test]
    fn weekday_with_time() {
        let det = detector().detect("Monday at 9:00 AM").unwrap();
        assert_eq!(day_of(&det), NaiveDate::from_ymd_opt(2025, 3, 10).unwrap());
        assert_eq!(det.instant.time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn same_day_weekday_is_today_unless_next() {
        let d = detector();
        let plain = d.detect("Wednesday").unwrap();
        assert_eq!(day_of(&plain), NaiveDate::from_ymd_opt(2025, 3, 5).unwrap());
        let next = d.detect("next Wednesday").unwrap();
        assert_eq!(day_of(&next), NaiveDate::from_ymd_opt(2025, 3, 12).unwrap());
    }

    #[test]
    fn tomorrow_at_time() {
        let det = detector().detect("tomorrow at 3pm").unwrap();
        assert_eq!(day_of(&det), NaiveDate::from_ymd_opt(2025, 3, 6).unwrap());
        assert_eq!(det.instant.hour(), 15);
    }

    #[test]
    fn month_name_date_infers_forward_year() {
        let d = detector();
        let nov = d.detect("November 3 at 6:30 PM").unwrap();
        assert_eq!(day_of(&nov), NaiveDate::from_ymd_opt(2025, 11, 3).unwrap());
        assert_eq!(nov.instant.time(), NaiveTime::from_hms_opt(18, 30, 0).unwrap());

        // January has already passed relative to March — next year.
        let jan = d.detect("Jan 15").unwrap();
        assert_eq!(day_of(&jan), NaiveDate::from_ymd_opt(2026, 1, 15).unwrap());
    }

    #[test]
    fn time_range_yields_duration() {
        let det = detector().detect("9:00 AM - 10:30 AM").unwrap();
        assert_eq!(det.instant.time(), NaiveTime::from_hms_opt(9, 0, 0).unwrap());
        assert_eq!(det.duration, Duration::minutes(90));
    }

    #[test]
    fn range_crossing_midnight() {
        let det = detector().detect("11 PM to 1 AM").unwrap();
        assert_eq!(det.duration, Duration::hours(2));
    }

    #[test]
    fn explicit_length_duration() {
        let det = detector().detect("Friday at 7 PM for 2 hours").unwrap();
        assert_eq!(day_of(&det), NaiveDate::from_ymd_opt(2025, 3, 7).unwrap());
        assert_eq!(det.duration, Duration::hours(2));
    }

    #[test]
    fn time_followed_by_day_word() {
        let det = detector().detect("Doors open 8 PM tomorrow").unwrap();
        assert_eq!(day_of(&det), NaiveDate::from_ymd_opt(2025, 3, 6).unwrap());
        assert_eq!(det.instant.hour(), 20);
    }

    #[test]
    fn first_span_wins() {
        let det = detector()
            .detect("2025-06-01 rehearsal, performance 2025-06-02")
            .unwrap();
        assert_eq!(day_of(&det), NaiveDate::from_ymd_opt(2025, 6, 1).unwrap());
    }

    #[test]
    fn twelve_hour_edges() {
        let d = detector();
        assert_eq!(d.detect("12am").unwrap().instant.hour(), 0);
        assert_eq!(d.detect("12pm").unwrap().instant.hour(), 12);
    }

    #[test]
    fn offset_bearing_iso_converts_to_local() {
        let det = detector().detect("starts 2025-11-03T18:30:00Z").unwrap();
        let expected = DateTime::parse_from_rfc3339("2025-11-03T18:30:00Z")
            .unwrap()
            .with_timezone(&Local);
        assert_eq!(det.instant, expected);
    }

    #[test]
    fn plain_text_detects_nothing() {
        let d = detector();
        assert!(d.detect("Team Standup").is_none());
        assert!(d.detect("Room 204").is_none());
        assert!(d.detect("").is_none());
    }

    #[test]
    fn invalid_components_are_not_recognized() {
        let d = detector();
        assert!(d.detect("2025-13-40").is_none());
        assert!(d.detect("25:99").is_none());
    }
}
