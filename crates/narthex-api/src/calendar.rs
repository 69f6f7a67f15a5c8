//! Google Calendar event mapping.
//!
//! The calendar endpoint proxies the Google Calendar API and maps raw
//! event JSON into the date items the directory displays. Only the field
//! mapping is interesting; the fetch is a plain authenticated GET.

use chrono::{DateTime, Datelike, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Program semester an event falls into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Semester {
    Fall,
    Winter,
    Spring,
}

/// One mapped calendar entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DateItem {
    pub id: String,
    /// Display date, e.g. "August 13".
    pub date: String,
    pub title: String,
    pub description: String,
    pub semester: Semester,
    pub year: i32,
    pub is_deadline: bool,
    pub is_training: bool,
    pub is_expo: bool,
}

/// Map one raw Google Calendar event into a DateItem.
///
/// Returns `None` when the event has no id or no parseable start date.
pub fn map_event(event: &Value) -> Option<DateItem> {
    let id = event.get("id").and_then(Value::as_str)?.to_string();
    let start = event.get("start")?;
    let start_raw = start
        .get("dateTime")
        .or_else(|| start.get("date"))
        .and_then(Value::as_str)?;
    let start_date = parse_event_date(start_raw)?;

    let title = event
        .get("summary")
        .and_then(Value::as_str)
        .unwrap_or("Untitled Event")
        .to_string();
    let title_lower = title.to_lowercase();

    let description = event_description(event, start);

    Some(DateItem {
        id,
        date: format!("{} {}", month_name(start_date.month()), start_date.day()),
        title,
        description,
        semester: semester_for_month(start_date.month()),
        year: start_date.year(),
        is_deadline: title_lower.contains("deadline"),
        is_training: title_lower.contains("training"),
        is_expo: title_lower.contains("expo"),
    })
}

/// Semester bucketing by month: Aug-Dec fall, Jan-Mar winter, Apr-Jul spring.
fn semester_for_month(month: u32) -> Semester {
    match month {
        8..=12 => Semester::Fall,
        1..=3 => Semester::Winter,
        _ => Semester::Spring,
    }
}

/// Description: the event time range for timed events, otherwise the
/// first 100 characters of the event's own description.
fn event_description(event: &Value, start: &Value) -> String {
    if let Some(start_dt) = start.get("dateTime").and_then(Value::as_str) {
        if let Some(start_parsed) = parse_datetime(start_dt) {
            let start_fmt = format_time(&start_parsed);
            let end_fmt = event
                .get("end")
                .and_then(|e| e.get("dateTime"))
                .and_then(Value::as_str)
                .and_then(parse_datetime)
                .map(|dt| format_time(&dt));
            return match end_fmt {
                Some(end) => format!("{} - {}", start_fmt, end),
                None => start_fmt,
            };
        }
    }

    event
        .get("description")
        .and_then(Value::as_str)
        .map(|d| d.chars().take(100).collect())
        .unwrap_or_default()
}

/// Parse either an RFC 3339 dateTime or a bare YYYY-MM-DD date.
fn parse_event_date(raw: &str) -> Option<chrono::NaiveDate> {
    if let Some(dt) = parse_datetime(raw) {
        return Some(dt.date_naive());
    }
    chrono::NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc3339(raw).ok()
}

/// 12-hour clock, e.g. "6:30 PM" or "9 AM".
fn format_time(dt: &DateTime<FixedOffset>) -> String {
    let formatted = dt.format("%-I:%M %p").to_string();
    formatted.replace(":00 ", " ")
}

fn month_name(month: u32) -> &'static str {
    match month {
        1 => "January",
        2 => "February",
        3 => "March",
        4 => "April",
        5 => "May",
        6 => "June",
        7 => "July",
        8 => "August",
        9 => "September",
        10 => "October",
        11 => "November",
        _ => "December",
    }
}
