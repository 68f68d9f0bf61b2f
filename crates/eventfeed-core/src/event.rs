//! Canonical event types.
//!
//! This module provides the source-agnostic event representation used
//! throughout aggregation:
//! - [`CanonicalEvent`]: one event (or one expanded occurrence of a series)
//! - [`Attendee`]: an invited person with their response
//! - [`Organizer`]: the person who owns the event
//! - [`ResponseStatus`]: an attendee's reply to the invitation

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::recurrence::RecurrenceRule;

/// Title used when the upstream record has none.
pub const UNTITLED: &str = "(No title)";

/// The response status for an event attendee.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponseStatus {
    /// No response has been recorded.
    #[default]
    None,
    /// The attendee organizes the event.
    Organizer,
    /// The attendee has accepted the invitation.
    Accepted,
    /// The attendee has tentatively accepted.
    TentativelyAccepted,
    /// The attendee has declined the invitation.
    Declined,
    /// The attendee has not responded yet.
    NotResponded,
}

impl ResponseStatus {
    /// Parses a provider response string such as `"accepted"` or
    /// `"tentativelyAccepted"`. Unknown values map to [`ResponseStatus::None`].
    pub fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "organizer" => Self::Organizer,
            "accepted" => Self::Accepted,
            "tentativelyaccepted" | "tentative" => Self::TentativelyAccepted,
            "declined" => Self::Declined,
            "notresponded" | "needsaction" => Self::NotResponded,
            _ => Self::None,
        }
    }
}

/// The organizer of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organizer {
    pub name: String,
    pub email: Option<String>,
}

/// An attendee of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    /// Display name, empty when the provider has none.
    pub name: String,
    /// Email address, empty when the provider has none.
    pub email: String,
    /// The attendee's reply.
    pub response: ResponseStatus,
}

impl Attendee {
    /// Creates a new attendee.
    pub fn new(name: impl Into<String>, email: impl Into<String>, response: ResponseStatus) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
            response,
        }
    }
}

/// A normalized, source-agnostic calendar event.
///
/// Events are built fresh on every fetch cycle and never mutated in place by
/// the pipeline: expansion and color overlays produce new values.
///
/// The `id` has the form `<sourceId>:<nativeId>`. Expanded occurrences append
/// `:occ:<ordinal>` and point back to their series through
/// `series_master_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub is_all_day: bool,
    pub location: Option<String>,
    pub category: Option<String>,
    pub category_color: Option<String>,
    pub organizer: Option<Organizer>,
    #[serde(default)]
    pub attendees: Vec<Attendee>,
    pub recurrence: Option<RecurrenceRule>,
    pub is_recurring: bool,
    /// Set only on occurrences produced by the expander (or on
    /// provider-expanded instances).
    pub series_master_id: Option<String>,
    pub join_url: Option<String>,
    pub web_link: Option<String>,
    /// The source this event was fetched from. A back-reference only.
    pub source_id: String,
    pub source_color: String,
    pub image_url: Option<String>,
    pub registration_enabled: bool,
    pub rsvp_enabled: bool,
}

impl CanonicalEvent {
    /// Creates an event with the required fields and everything else empty.
    ///
    /// If `end` is before `start` it is clamped to `start`.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        source_id: impl Into<String>,
        source_color: impl Into<String>,
    ) -> Self {
        let title = title.into();
        Self {
            id: id.into(),
            title: if title.trim().is_empty() {
                UNTITLED.to_string()
            } else {
                title
            },
            description: String::new(),
            start,
            end: end.max(start),
            is_all_day: false,
            location: None,
            category: None,
            category_color: None,
            organizer: None,
            attendees: Vec::new(),
            recurrence: None,
            is_recurring: false,
            series_master_id: None,
            join_url: None,
            web_link: None,
            source_id: source_id.into(),
            source_color: source_color.into(),
            image_url: None,
            registration_enabled: false,
            rsvp_enabled: false,
        }
    }

    /// Builds the canonical id for a native record id.
    pub fn compose_id(source_id: &str, native_id: &str) -> String {
        format!("{source_id}:{native_id}")
    }

    /// Returns the event duration.
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Returns true if `[start, end]` intersects `[from, to]` (both inclusive).
    pub fn overlaps(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> bool {
        self.start <= to && self.end >= from
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder method to mark the event as all-day.
    pub fn with_all_day(mut self, is_all_day: bool) -> Self {
        self.is_all_day = is_all_day;
        self
    }

    /// Builder method to set the location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Builder method to set the category and its color.
    pub fn with_category(mut self, category: impl Into<String>, color: Option<String>) -> Self {
        self.category = Some(category.into());
        self.category_color = color;
        self
    }

    /// Builder method to set the organizer.
    pub fn with_organizer(mut self, organizer: Organizer) -> Self {
        self.organizer = Some(organizer);
        self
    }

    /// Builder method to add an attendee.
    pub fn with_attendee(mut self, attendee: Attendee) -> Self {
        self.attendees.push(attendee);
        self
    }

    /// Builder method to attach a recurrence rule. Keeps `is_recurring` in
    /// step with the rule.
    pub fn with_recurrence(mut self, rule: Option<RecurrenceRule>) -> Self {
        self.is_recurring = rule.is_some();
        self.recurrence = rule;
        self
    }

    /// Builder method to set the join url.
    pub fn with_join_url(mut self, url: impl Into<String>) -> Self {
        self.join_url = Some(url.into());
        self
    }

    /// Builder method to set the web link.
    pub fn with_web_link(mut self, url: impl Into<String>) -> Self {
        self.web_link = Some(url.into());
        self
    }

    /// Builder method to set the image url.
    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, h, 0, 0).unwrap()
    }

    #[test]
    fn new_event_defaults() {
        let event = CanonicalEvent::new("src:1", "Standup", at(9), at(10), "src", "#fff");

        assert_eq!(event.id, "src:1");
        assert_eq!(event.title, "Standup");
        assert_eq!(event.duration(), Duration::hours(1));
        assert!(!event.is_recurring);
        assert!(event.series_master_id.is_none());
        assert!(event.attendees.is_empty());
    }

    #[test]
    fn blank_title_falls_back() {
        let event = CanonicalEvent::new("src:1", "   ", at(9), at(10), "src", "#fff");
        assert_eq!(event.title, UNTITLED);
    }

    #[test]
    fn end_before_start_is_clamped() {
        let event = CanonicalEvent::new("src:1", "x", at(10), at(9), "src", "#fff");
        assert_eq!(event.end, event.start);
        assert_eq!(event.duration(), Duration::zero());
    }

    #[test]
    fn overlap_is_inclusive() {
        let event = CanonicalEvent::new("src:1", "x", at(9), at(10), "src", "#fff");
        assert!(event.overlaps(at(10), at(12)));
        assert!(event.overlaps(at(0), at(9)));
        assert!(!event.overlaps(at(11), at(12)));
    }

    #[test]
    fn response_status_parsing() {
        assert_eq!(ResponseStatus::parse("accepted"), ResponseStatus::Accepted);
        assert_eq!(
            ResponseStatus::parse("tentativelyAccepted"),
            ResponseStatus::TentativelyAccepted
        );
        assert_eq!(ResponseStatus::parse("notResponded"), ResponseStatus::NotResponded);
        assert_eq!(ResponseStatus::parse("bogus"), ResponseStatus::None);
    }

    #[test]
    fn serializes_camel_case() {
        let event = CanonicalEvent::new("src:1", "x", at(9), at(10), "src", "#fff");
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["sourceId"], "src");
        assert_eq!(json["isAllDay"], false);
        assert!(json["seriesMasterId"].is_null());
    }
}
