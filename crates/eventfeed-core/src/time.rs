//! Visible date windows.
//!
//! [`TimeWindow`] is the closed interval `[start, end]` a view asks the
//! pipeline to fill. Fetchers use it to scope upstream queries and the
//! expander uses it to pick occurrences.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// A closed UTC interval `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Start of the window (inclusive).
    pub start: DateTime<Utc>,
    /// End of the window (inclusive).
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Creates a new time window.
    ///
    /// # Panics
    ///
    /// Panics if `start` is after `end`. Use [`TimeWindow::try_new`] for
    /// unchecked input.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        assert!(start <= end, "TimeWindow start must be <= end");
        Self { start, end }
    }

    /// Creates a new time window, or `None` if `start` is after `end`.
    pub fn try_new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start <= end).then_some(Self { start, end })
    }

    /// Creates the window `[start, start + length]`.
    ///
    /// Returns `None` if `length` is negative or the end is not
    /// representable.
    pub fn starting_at(start: DateTime<Utc>, length: Duration) -> Option<Self> {
        let end = start.checked_add_signed(length)?;
        Self::try_new(start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn try_new_rejects_inverted_window() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let b = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        assert!(TimeWindow::try_new(a, b).is_some());
        assert!(TimeWindow::try_new(b, a).is_none());
        assert!(TimeWindow::try_new(a, a).is_some());
    }

    #[test]
    #[should_panic(expected = "TimeWindow start must be <= end")]
    fn new_panics_on_inverted_window() {
        let a = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let _ = TimeWindow::new(a + Duration::hours(1), a);
    }

    #[test]
    fn starting_at_window() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let window = TimeWindow::starting_at(start, Duration::days(30)).unwrap();
        assert_eq!(window.start, start);
        assert_eq!(window.end, Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap());

        assert!(TimeWindow::starting_at(start, Duration::days(-1)).is_none());
        assert!(TimeWindow::starting_at(DateTime::<Utc>::MAX_UTC, Duration::days(30)).is_none());
    }
}
