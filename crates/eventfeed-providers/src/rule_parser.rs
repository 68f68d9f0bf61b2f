//! Recurrence rule parsing.
//!
//! Upstream recurrence objects look like
//! `{ pattern: { type, interval, daysOfWeek, dayOfMonth, month, index },
//! range: { type, startDate, endDate, numberOfOccurrences } }`, with the
//! short names `weekdays`, `start`, `end` and `count` accepted too. Parsing
//! is lenient: malformed fields fall back to defaults and never fail the
//! record.

use chrono::{DateTime, NaiveDate, Utc, Weekday};
use eventfeed_core::{RecurrencePattern, RecurrenceRule, WeekIndex};
use serde_json::Value;
use tracing::trace;

use crate::datetime::{self, Parsed};

/// Graph's placeholder for "no end date".
const NO_END_SENTINEL: &str = "0001-01-01";

/// Parses an upstream recurrence object.
///
/// Returns `None` when there is no `pattern`. `event_start` supplies the
/// time of day for date-only range starts and the fallback rule start.
pub fn parse_recurrence(value: &Value, event_start: DateTime<Utc>) -> Option<RecurrenceRule> {
    let pattern = value.get("pattern").filter(|p| !p.is_null())?;
    let range = value.get("range").unwrap_or(&Value::Null);

    let kind = string_field(pattern, &["type"])
        .map(RecurrencePattern::parse)
        .unwrap_or_default();
    let interval = number_field(pattern, &["interval"])
        .filter(|n| *n > 0)
        .map_or(1, |n| u32::try_from(n).unwrap_or(u32::MAX));

    let start = string_field(range, &["startDate", "start"])
        .and_then(|s| range_start(s, event_start))
        .unwrap_or(event_start);

    let mut rule = RecurrenceRule::new(kind, start)
        .with_interval(interval)
        .with_weekdays(weekdays(pattern));

    if let Some(day) = number_field(pattern, &["dayOfMonth"]).filter(|d| (1..=31).contains(d)) {
        rule = rule.with_day_of_month(day as u32);
    }
    if let Some(month) = number_field(pattern, &["month"]).filter(|m| (1..=12).contains(m)) {
        rule = rule.with_month(month as u32);
    }
    if let Some(index) = string_field(pattern, &["index"]).and_then(WeekIndex::parse) {
        rule = rule.with_index(index);
    }

    let open_ended = string_field(range, &["type"]).is_some_and(|t| t.eq_ignore_ascii_case("noEnd"));
    if !open_ended {
        if let Some(end) = string_field(range, &["endDate", "end"]).and_then(range_end) {
            rule = rule.with_end(end);
        }
    }
    if let Some(count) = number_field(range, &["numberOfOccurrences", "count"]).filter(|c| *c > 0) {
        rule = rule.with_max_occurrences(u32::try_from(count).unwrap_or(u32::MAX));
    }

    trace!(pattern = ?rule.pattern, interval = rule.interval, "parsed recurrence");
    Some(rule)
}

fn string_field<'a>(value: &'a Value, names: &[&str]) -> Option<&'a str> {
    names
        .iter()
        .find_map(|name| value.get(*name).and_then(Value::as_str))
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// Reads an integer given either as a JSON number or a numeric string.
fn number_field(value: &Value, names: &[&str]) -> Option<i64> {
    names.iter().find_map(|name| match value.get(*name)? {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    })
}

fn weekdays(pattern: &Value) -> Vec<Weekday> {
    let names = pattern
        .get("daysOfWeek")
        .or_else(|| pattern.get("weekdays"))
        .and_then(Value::as_array);
    let mut days: Vec<Weekday> = names
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .filter_map(|name| name.trim().parse().ok())
        .collect();
    days.dedup();
    days
}

fn is_sentinel(date: NaiveDate) -> bool {
    NaiveDate::parse_from_str(NO_END_SENTINEL, "%Y-%m-%d").is_ok_and(|sentinel| date == sentinel)
}

fn range_start(value: &str, event_start: DateTime<Utc>) -> Option<DateTime<Utc>> {
    match datetime::parse(value)? {
        Parsed::Instant(dt) => Some(dt),
        Parsed::Date(date) if is_sentinel(date) => None,
        Parsed::Date(date) => Some(date.and_time(event_start.time()).and_utc()),
    }
}

fn range_end(value: &str) -> Option<DateTime<Utc>> {
    match datetime::parse(value)? {
        Parsed::Instant(dt) => Some(dt),
        Parsed::Date(date) if is_sentinel(date) => None,
        Parsed::Date(date) => date.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc()),
    }
}
