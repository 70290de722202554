//! Timestamp parsing and the derived `month` / `hour` columns.

use chrono::{Datelike, NaiveDate, NaiveDateTime, Timelike};

/// Date layouts accepted for `transaction_date`, tried in order.
const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%m/%d/%Y", "%d/%m/%Y"];

/// Date-time layouts accepted for `transaction_datetime`, tried in order.
/// `%.f` also matches an absent fractional part.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
];

/// Parse a calendar date.
///
/// A full date-time is accepted as well and truncated to its date, since
/// exports sometimes write `2023-01-01 00:00:00` into date columns.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
        .or_else(|| parse_datetime(s).map(|dt| dt.date()))
}

/// Parse a date-time. A bare date parses as midnight.
pub fn parse_datetime(s: &str) -> Option<NaiveDateTime> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Month bucket for a date, formatted `"YYYY-MM"`.
///
/// Zero padding keeps lexicographic order identical to chronological order.
pub fn month_key(date: NaiveDate) -> String {
    format!("{:04}-{:02}", date.year(), date.month())
}

/// Hour-of-day component (0–23).
pub fn hour_of(dt: NaiveDateTime) -> u32 {
    dt.hour()
}
