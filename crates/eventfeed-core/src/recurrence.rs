//! Recurrence rules and their human-readable description.
//!
//! A [`RecurrenceRule`] is the canonical form of a provider's recurrence
//! description. Only `pattern`, `interval`, `start`, `end` and
//! `max_occurrences` drive expansion; the weekday, day-of-month, month and
//! week-index fields refine the text produced by [`describe_recurrence`].

use chrono::{DateTime, Duration, Month, Months, Utc, Weekday};
use serde::{Deserialize, Serialize};

/// How a rule repeats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RecurrencePattern {
    #[default]
    Daily,
    Weekly,
    MonthlyAbsolute,
    MonthlyRelative,
    YearlyAbsolute,
    YearlyRelative,
}

impl RecurrencePattern {
    /// Parses a provider pattern name. Both Graph names (`absoluteMonthly`)
    /// and kebab-case names (`monthly-absolute`) are accepted; anything
    /// unknown is treated as daily.
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "weekly" => Self::Weekly,
            "absolutemonthly" | "monthly-absolute" | "monthly" => Self::MonthlyAbsolute,
            "relativemonthly" | "monthly-relative" => Self::MonthlyRelative,
            "absoluteyearly" | "yearly-absolute" | "yearly" => Self::YearlyAbsolute,
            "relativeyearly" | "yearly-relative" => Self::YearlyRelative,
            _ => Self::Daily,
        }
    }

    fn is_relative(self) -> bool {
        matches!(self, Self::MonthlyRelative | Self::YearlyRelative)
    }
}

/// Which week of the month a relative pattern refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeekIndex {
    First,
    Second,
    Third,
    Fourth,
    Last,
}

impl WeekIndex {
    /// Parses a provider week index name.
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_lowercase().as_str() {
            "first" => Some(Self::First),
            "second" => Some(Self::Second),
            "third" => Some(Self::Third),
            "fourth" => Some(Self::Fourth),
            "last" => Some(Self::Last),
            _ => None,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::First => "first",
            Self::Second => "second",
            Self::Third => "third",
            Self::Fourth => "fourth",
            Self::Last => "last",
        }
    }
}

/// A canonical recurrence rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecurrenceRule {
    pub pattern: RecurrencePattern,
    /// Number of pattern units between occurrences. Values below 1 are read
    /// as 1.
    pub interval: u32,
    #[serde(default)]
    pub weekdays: Vec<Weekday>,
    pub day_of_month: Option<u32>,
    pub month: Option<u32>,
    pub index: Option<WeekIndex>,
    /// Start of the first occurrence.
    pub start: DateTime<Utc>,
    /// No occurrence starts after this instant.
    pub end: Option<DateTime<Utc>>,
    pub max_occurrences: Option<u32>,
}

impl RecurrenceRule {
    /// Creates a rule with the given pattern starting at `start`.
    pub fn new(pattern: RecurrencePattern, start: DateTime<Utc>) -> Self {
        Self {
            pattern,
            interval: 1,
            weekdays: Vec::new(),
            day_of_month: None,
            month: None,
            index: None,
            start,
            end: None,
            max_occurrences: None,
        }
    }

    /// Builder method to set the interval.
    pub fn with_interval(mut self, interval: u32) -> Self {
        self.interval = interval;
        self
    }

    /// Builder method to set the weekdays.
    pub fn with_weekdays(mut self, weekdays: Vec<Weekday>) -> Self {
        self.weekdays = weekdays;
        self
    }

    /// Builder method to set the rule end.
    pub fn with_end(mut self, end: DateTime<Utc>) -> Self {
        self.end = Some(end);
        self
    }

    /// Builder method to set the occurrence limit.
    pub fn with_max_occurrences(mut self, count: u32) -> Self {
        self.max_occurrences = Some(count);
        self
    }

    /// Builder method to set the day of month.
    pub fn with_day_of_month(mut self, day: u32) -> Self {
        self.day_of_month = Some(day);
        self
    }

    /// Builder method to set the month (1-12).
    pub fn with_month(mut self, month: u32) -> Self {
        self.month = Some(month);
        self
    }

    /// Builder method to set the relative week index.
    pub fn with_index(mut self, index: WeekIndex) -> Self {
        self.index = Some(index);
        self
    }

    /// Returns the interval, never less than 1.
    pub fn effective_interval(&self) -> u32 {
        self.interval.max(1)
    }

    /// Returns the start of the `n`-th step (0-based) from the rule start.
    ///
    /// Each step is computed from `start` directly so month-end clamping in
    /// one step does not carry into the next. Returns `None` when the step
    /// falls outside chrono's representable range.
    pub fn nth_start(&self, n: u32) -> Option<DateTime<Utc>> {
        let steps = n.checked_mul(self.effective_interval())?;
        match self.pattern {
            RecurrencePattern::Daily => self
                .start
                .checked_add_signed(Duration::try_days(i64::from(steps))?),
            RecurrencePattern::Weekly => self
                .start
                .checked_add_signed(Duration::try_weeks(i64::from(steps))?),
            RecurrencePattern::MonthlyAbsolute | RecurrencePattern::MonthlyRelative => {
                self.start.checked_add_months(Months::new(steps))
            }
            RecurrencePattern::YearlyAbsolute | RecurrencePattern::YearlyRelative => self
                .start
                .checked_add_months(Months::new(steps.checked_mul(12)?)),
        }
    }
}

/// Describes a rule in plain English, e.g. `Every 2 weeks on Monday, Friday`.
pub fn describe_recurrence(rule: &RecurrenceRule) -> String {
    let interval = rule.effective_interval();
    let mut text = match rule.pattern {
        RecurrencePattern::Daily => {
            if interval == 1 {
                "Daily".to_string()
            } else {
                format!("Every {interval} days")
            }
        }
        RecurrencePattern::Weekly => {
            let head = if interval == 1 {
                "Weekly".to_string()
            } else {
                format!("Every {interval} weeks")
            };
            if rule.weekdays.is_empty() {
                head
            } else {
                format!("{head} on {}", weekday_list(&rule.weekdays))
            }
        }
        RecurrencePattern::MonthlyAbsolute | RecurrencePattern::MonthlyRelative => {
            let head = if interval == 1 {
                "Monthly".to_string()
            } else {
                format!("Every {interval} months")
            };
            match day_phrase(rule) {
                Some(day) => format!("{head} on {day}"),
                None => head,
            }
        }
        RecurrencePattern::YearlyAbsolute | RecurrencePattern::YearlyRelative => {
            let head = if interval == 1 {
                "Yearly".to_string()
            } else {
                format!("Every {interval} years")
            };
            let month = rule.month.and_then(month_name);
            match (rule.pattern.is_relative(), day_phrase(rule), month) {
                (true, Some(day), Some(month)) => format!("{head} on {day} of {month}"),
                (false, _, Some(month)) => match rule.day_of_month {
                    Some(day) => format!("{head} on {month} {day}"),
                    None => format!("{head} in {month}"),
                },
                (_, Some(day), None) => format!("{head} on {day}"),
                _ => head,
            }
        }
    };

    if let Some(count) = rule.max_occurrences {
        text.push_str(&format!(", {count} times"));
    } else if let Some(end) = rule.end {
        text.push_str(&format!(", until {}", end.format("%b %-d, %Y")));
    }
    text
}

fn day_phrase(rule: &RecurrenceRule) -> Option<String> {
    if rule.pattern.is_relative() {
        let index = rule.index.unwrap_or(WeekIndex::First);
        if rule.weekdays.is_empty() {
            return None;
        }
        Some(format!(
            "the {} {}",
            index.as_str(),
            weekday_list(&rule.weekdays)
        ))
    } else {
        rule.day_of_month.map(|day| format!("day {day}"))
    }
}

fn weekday_list(days: &[Weekday]) -> String {
    days.iter()
        .map(|d| weekday_name(*d))
        .collect::<Vec<_>>()
        .join(", ")
}

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn month_name(month: u32) -> Option<&'static str> {
    u8::try_from(month)
        .ok()
        .and_then(|m| Month::try_from(m).ok())
        .map(|m| m.name())
}
