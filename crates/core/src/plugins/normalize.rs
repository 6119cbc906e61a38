//! Normalization rules shared by source adapters
//!
//! Sources use free-form vocabularies for priority and status, and a mix of
//! timestamp shapes. These helpers map them onto the standard item model.

use chrono::{
    DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, TimeZone, Utc,
};
use workdash_domain::constants::DEFAULT_EVENT_DURATION_MINUTES;
use workdash_domain::{TaskPriority, TaskStatus};

const NAIVE_DATETIME_FORMATS: &[&str] =
    &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S"];

const TIME_FORMATS: &[&str] = &["%H:%M:%S", "%H:%M", "%I:%M %p", "%I:%M%p"];

/// Map a source priority onto [`TaskPriority`].
///
/// `high` matches case-insensitively, `urgent` only in lowercase as
/// written, so `"URGENT"` stays medium.
pub fn normalize_priority(raw: &str) -> TaskPriority {
    let lower = raw.to_lowercase();
    if lower.contains("high") || raw.contains("urgent") {
        TaskPriority::High
    } else if lower.contains("low") {
        TaskPriority::Low
    } else {
        TaskPriority::Medium
    }
}

/// Map a source status onto [`TaskStatus`]. Anything unrecognized is pending.
pub fn normalize_status(raw: &str) -> TaskStatus {
    let lower = raw.to_lowercase();
    if lower.contains("complete") || lower.contains("done") {
        TaskStatus::Completed
    } else if lower.contains("progress") || lower.contains("working") {
        TaskStatus::InProgress
    } else {
        TaskStatus::Pending
    }
}

/// Parse an RFC-3339 timestamp, a naive datetime (taken as UTC) or a bare
/// date (midnight UTC).
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Some(naive) =
        NAIVE_DATETIME_FORMATS.iter().find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&naive));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().map(start_of_day)
}

/// Combine a date and a wall-clock time into a UTC timestamp.
///
/// `time` may be `HH:MM`, `HH:MM:SS`, `h:MM AM`, or a full timestamp, in
/// which case the date part is ignored.
pub fn combine_date_time(date: &str, time: &str) -> Option<DateTime<Utc>> {
    let day = parse_date(date)?;
    let time = time.trim();
    if let Some(clock) = TIME_FORMATS.iter().find_map(|fmt| NaiveTime::parse_from_str(time, fmt).ok())
    {
        return Some(Utc.from_utc_datetime(&day.and_time(clock)));
    }
    parse_timestamp(time).filter(|_| time.contains('T'))
}

/// End time for a record that only carries a start.
pub fn default_end(start: DateTime<Utc>) -> DateTime<Utc> {
    start + Duration::minutes(DEFAULT_EVENT_DURATION_MINUTES)
}

/// Trimmed value, or `None` when blank.
pub fn non_empty(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// `YYYY-MM-DD` of an instant, as sent in source date filters.
pub fn date_only(instant: DateTime<Utc>) -> String {
    instant.format("%Y-%m-%d").to_string()
}

/// RFC-3339 with a `Z` suffix and whole seconds.
pub fn to_utc_string(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Calendar day of a date or timestamp string.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    parse_timestamp(raw).map(|instant| instant.date_naive())
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN))
}
