// Date and timestamp parsing for tool arguments, plus pt-BR rendering.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y"];

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%d/%m/%Y %H:%M",
];

/// Parse a calendar date. Accepts ISO (`2026-10-16`), pt-BR (`16/10/2026`)
/// and full timestamps, from which the date part is taken.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        .or_else(|| parse_datetime(text).map(|dt| dt.date()))
}

/// Parse a timestamp. RFC 3339 values are converted to naive UTC; naive
/// values are taken as already being UTC. A bare date means midnight.
pub fn parse_datetime(text: &str) -> Option<NaiveDateTime> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// First day of the month containing `day`.
pub fn month_start(day: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(day.year(), day.month(), 1).unwrap_or(day)
}

/// Render a date as `dd/mm/yyyy`.
pub fn format_br(day: NaiveDate) -> String {
    day.format("%d/%m/%Y").to_string()
}
