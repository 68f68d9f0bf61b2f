//! Lenient parsing of upstream date and date-time strings.
//!
//! Both upstreams are asked for UTC, so values without an offset are read
//! as UTC. Anything unparseable is `None`; callers decide what that means.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};

const NAIVE_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// A parsed upstream value, remembering whether it carried a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parsed {
    Instant(DateTime<Utc>),
    Date(NaiveDate),
}

impl Parsed {
    /// Returns the instant, reading a bare date as midnight UTC.
    pub fn at_midnight(self) -> DateTime<Utc> {
        match self {
            Self::Instant(dt) => dt,
            Self::Date(date) => date.and_time(NaiveTime::MIN).and_utc(),
        }
    }
}

/// Parses RFC 3339, naive date-times and bare dates.
pub fn parse(value: &str) -> Option<Parsed> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(Parsed::Instant(dt.with_timezone(&Utc)));
    }
    for format in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(value, format) {
            return Some(Parsed::Instant(naive.and_utc()));
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .map(Parsed::Date)
}

/// Parses a value into an instant; bare dates become midnight UTC.
pub fn parse_instant(value: &str) -> Option<DateTime<Utc>> {
    parse(value).map(Parsed::at_midnight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn reads_rfc3339_with_offset() {
        let dt = parse_instant("2024-01-01T10:00:00+01:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
    }

    #[test]
    fn reads_graph_naive_value_as_utc() {
        let dt = parse_instant("2024-01-01T09:00:00.0000000").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
        let dt = parse_instant("2024-01-01T09:30:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 1, 1, 9, 30, 0).unwrap());
    }

    #[test]
    fn keeps_bare_dates_distinct() {
        let parsed = parse("2024-01-31").unwrap();
        assert_eq!(parsed, Parsed::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap()));
        assert_eq!(
            parsed.at_midnight(),
            Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn rejects_garbage() {
        assert!(parse("").is_none());
        assert!(parse("   ").is_none());
        assert!(parse("next tuesday").is_none());
        assert!(parse("2024-13-01").is_none());
    }
}
