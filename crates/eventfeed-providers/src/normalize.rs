//! RawRecord to CanonicalEvent conversion.
//!
//! Each [`RawRecord`] yields at most one [`CanonicalEvent`]. A record whose
//! start or end cannot be read, or that the upstream marks as cancelled, is
//! dropped; its siblings are unaffected.
//!
//! The two profiles map fields as follows:
//! - list items: flat columns, HTML description, `Author` as organizer,
//!   `fRecurrence` as a bare flag (no rule, so nothing to expand);
//! - calendar events: nested `{dateTime, timeZone}` values, attendees with
//!   response status, a parsed [`RecurrenceRule`](eventfeed_core::RecurrenceRule)
//!   and the online meeting join url.

use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use eventfeed_core::{Attendee, CanonicalEvent, Organizer, ResponseStatus};
use regex::Regex;
use tracing::{debug, trace};

use crate::datetime;
use crate::raw_record::{ApiDateTime, CalendarApiRecord, LinkField, ListRecord, RawRecord};
use crate::rule_parser::parse_recurrence;

static HTML_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<[^>]*>").expect("Invalid HTML tag regex"));
static WHITESPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("Invalid whitespace regex"));

/// Converts one record, or returns `None` if it must be dropped.
pub fn normalize_record(
    record: &RawRecord,
    source_id: &str,
    source_color: &str,
) -> Option<CanonicalEvent> {
    let event = match record {
        RawRecord::List(item) => normalize_list_item(item, source_id, source_color),
        RawRecord::CalendarApi(item) => normalize_calendar_event(item, source_id, source_color),
    };
    if event.is_none() {
        debug!(source = source_id, id = %record.native_id(), "dropping record");
    }
    event
}

/// Converts a batch, dropping records that do not normalize.
pub fn normalize_records(
    records: &[RawRecord],
    source_id: &str,
    source_color: &str,
) -> Vec<CanonicalEvent> {
    let events: Vec<_> = records
        .iter()
        .filter_map(|record| normalize_record(record, source_id, source_color))
        .collect();
    trace!(
        source = source_id,
        records = records.len(),
        events = events.len(),
        "normalized records"
    );
    events
}

fn normalize_list_item(
    item: &ListRecord,
    source_id: &str,
    source_color: &str,
) -> Option<CanonicalEvent> {
    let start = item.event_date.as_deref().and_then(datetime::parse_instant)?;
    let end = item.end_date.as_deref().and_then(datetime::parse_instant)?;
    let id = CanonicalEvent::compose_id(source_id, &item.id.to_string());

    let mut event = CanonicalEvent::new(
        id,
        item.title.clone().unwrap_or_default(),
        start,
        end,
        source_id,
        source_color,
    )
    .with_all_day(item.all_day.unwrap_or(false));

    if let Some(description) = item.description.as_deref() {
        event = event.with_description(strip_html(description));
    }
    if let Some(location) = non_blank(item.location.as_deref()) {
        event = event.with_location(location);
    }
    if let Some(category) = non_blank(item.category.as_deref()) {
        event = event.with_category(
            category,
            non_blank(item.category_color.as_deref()).map(str::to_string),
        );
    }
    if let Some(author) = item.author.as_ref() {
        if let Some(name) = non_blank(author.title.as_deref()) {
            event = event.with_organizer(Organizer {
                name: name.to_string(),
                email: non_blank(author.email.as_deref()).map(str::to_string),
            });
        }
    }
    if let Some(url) = item.banner_url.as_ref().and_then(LinkField::url) {
        event = event.with_image_url(url);
    }

    event.is_recurring = item.recurrence.unwrap_or(false);
    event.registration_enabled = item.enable_registration.unwrap_or(false);
    event.rsvp_enabled = item.enable_rsvp.unwrap_or(false);
    Some(event)
}

fn normalize_calendar_event(
    item: &CalendarApiRecord,
    source_id: &str,
    source_color: &str,
) -> Option<CanonicalEvent> {
    if item.is_cancelled {
        return None;
    }
    let start = api_instant(item.start.as_ref())?;
    let end = api_instant(item.end.as_ref())?;
    let id = CanonicalEvent::compose_id(source_id, &item.id);

    let mut event = CanonicalEvent::new(
        id,
        item.subject.clone().unwrap_or_default(),
        start,
        end,
        source_id,
        source_color,
    )
    .with_all_day(item.is_all_day)
    .with_description(item.body_preview.clone().unwrap_or_default())
    .with_recurrence(
        item.recurrence
            .as_ref()
            .and_then(|value| parse_recurrence(value, start)),
    );

    if let Some(location) = item
        .location
        .as_ref()
        .and_then(|l| non_blank(l.display_name.as_deref()))
    {
        event = event.with_location(location);
    }
    if let Some(category) = item.categories.iter().find_map(|c| non_blank(Some(c.as_str()))) {
        event = event.with_category(category, None);
    }
    if let Some(organizer) = item.organizer.as_ref() {
        let address = &organizer.email_address;
        let email = non_blank(address.address.as_deref());
        if let Some(name) = non_blank(address.name.as_deref()).or(email) {
            event = event.with_organizer(Organizer {
                name: name.to_string(),
                email: email.map(str::to_string),
            });
        }
    }
    for attendee in &item.attendees {
        let address = &attendee.email_address;
        let email = address.address.clone().unwrap_or_default();
        let name = non_blank(address.name.as_deref()).unwrap_or(email.as_str()).to_string();
        let response = attendee
            .status
            .as_ref()
            .and_then(|s| s.response.as_deref())
            .map(ResponseStatus::parse)
            .unwrap_or_default();
        event = event.with_attendee(Attendee::new(name, email, response));
    }
    if let Some(url) = item
        .online_meeting
        .as_ref()
        .and_then(|m| non_blank(m.join_url.as_deref()))
    {
        event = event.with_join_url(url);
    }
    if let Some(link) = non_blank(item.web_link.as_deref()) {
        event = event.with_web_link(link);
    }
    if let Some(master) = non_blank(item.series_master_id.as_deref()) {
        event.series_master_id = Some(CanonicalEvent::compose_id(source_id, master));
    }
    event.rsvp_enabled = item.response_requested.unwrap_or(false);
    Some(event)
}

fn api_instant(value: Option<&ApiDateTime>) -> Option<DateTime<Utc>> {
    datetime::parse_instant(&value?.date_time)
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|s| !s.is_empty())
}

/// Removes markup from a rich text column and collapses whitespace.
pub fn strip_html(html: &str) -> String {
    let text = HTML_TAG.replace_all(html, " ");
    let text = text
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw_record::{
        ApiAttendee, ApiEmailAddress, ApiLocation, ApiOnlineMeeting, ApiRecipient,
        ApiResponseStatus, NativeId,
    };
    use chrono::TimeZone;
    use eventfeed_core::{RecurrencePattern, UNTITLED};
    use serde_json::json;

    const SOURCE: &str = "events";
    const COLOR: &str = "#ff0000";

    fn list_item() -> ListRecord {
        ListRecord::new(1, "2024-02-01T10:00:00Z", "2024-02-01T11:00:00Z").with_title("Town hall")
    }

    fn api_event() -> CalendarApiRecord {
        CalendarApiRecord::new("AAMk", "2024-01-01T09:00:00.0000000", "2024-01-01T10:00:00.0000000")
            .with_subject("Standup")
    }

    mod list_profile {
        use super::*;

        #[test]
        fn maps_basic_fields() {
            let mut item = list_item()
                .with_description("<div><p>Quarterly&nbsp;update</p>\n<p>All   hands</p></div>")
                .with_author("Ada Lovelace", "ada@contoso.com");
            item.location = Some("Main hall".into());
            item.category = Some("Company".into());
            item.category_color = Some("#00ff00".into());
            item.all_day = Some(false);

            let event = normalize_record(&item.into(), SOURCE, COLOR).unwrap();

            assert_eq!(event.id, "events:1");
            assert_eq!(event.title, "Town hall");
            assert_eq!(event.description, "Quarterly update All hands");
            assert_eq!(event.start, Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap());
            assert_eq!(event.location.as_deref(), Some("Main hall"));
            assert_eq!(event.category.as_deref(), Some("Company"));
            assert_eq!(event.category_color.as_deref(), Some("#00ff00"));
            assert_eq!(event.organizer.as_ref().unwrap().name, "Ada Lovelace");
            assert_eq!(event.source_id, SOURCE);
            assert_eq!(event.source_color, COLOR);
            assert!(!event.is_recurring);
        }

        #[test]
        fn recurrence_flag_is_kept_without_rule() {
            let mut item = list_item();
            item.recurrence = Some(true);
            let event = normalize_record(&item.into(), SOURCE, COLOR).unwrap();
            assert!(event.is_recurring);
            assert!(event.recurrence.is_none());
        }

        #[test]
        fn capability_flags_and_banner() {
            let mut item = list_item();
            item.enable_registration = Some(true);
            item.enable_rsvp = Some(true);
            item.banner_url = Some(LinkField::Plain("https://contoso/banner.png".into()));
            let event = normalize_record(&item.into(), SOURCE, COLOR).unwrap();
            assert!(event.registration_enabled);
            assert!(event.rsvp_enabled);
            assert_eq!(event.image_url.as_deref(), Some("https://contoso/banner.png"));
        }

        #[test]
        fn blank_title_falls_back() {
            let mut item = list_item();
            item.title = Some("  ".into());
            let event = normalize_record(&item.into(), SOURCE, COLOR).unwrap();
            assert_eq!(event.title, UNTITLED);
        }

        #[test]
        fn text_ids_are_composed_too() {
            let mut item = list_item();
            item.id = NativeId::Text("abc".into());
            let event = normalize_record(&item.into(), SOURCE, COLOR).unwrap();
            assert_eq!(event.id, "events:abc");
        }
    }

    mod calendar_profile {
        use super::*;

        #[test]
        fn maps_nested_fields() {
            let mut record = api_event();
            record.body_preview = Some("daily sync".into());
            record.location = Some(ApiLocation {
                display_name: Some("Room 1".into()),
            });
            record.organizer = Some(ApiRecipient {
                email_address: ApiEmailAddress {
                    name: Some("Bob".into()),
                    address: Some("bob@contoso.com".into()),
                },
            });
            record.attendees = vec![
                ApiAttendee {
                    email_address: ApiEmailAddress {
                        name: Some("Eve".into()),
                        address: Some("eve@contoso.com".into()),
                    },
                    status: Some(ApiResponseStatus {
                        response: Some("tentativelyAccepted".into()),
                    }),
                },
                ApiAttendee {
                    email_address: ApiEmailAddress {
                        name: None,
                        address: Some("mallory@contoso.com".into()),
                    },
                    status: None,
                },
            ];
            record.online_meeting = Some(ApiOnlineMeeting {
                join_url: Some("https://teams/join".into()),
            });
            record.web_link = Some("https://outlook/item".into());
            record.categories = vec!["Blue category".into()];
            record.response_requested = Some(true);

            let event = normalize_record(&record.into(), SOURCE, COLOR).unwrap();

            assert_eq!(event.id, "events:AAMk");
            assert_eq!(event.title, "Standup");
            assert_eq!(event.description, "daily sync");
            assert_eq!(event.start, Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap());
            assert_eq!(event.end, Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap());
            assert_eq!(event.location.as_deref(), Some("Room 1"));
            let organizer = event.organizer.as_ref().unwrap();
            assert_eq!(organizer.name, "Bob");
            assert_eq!(organizer.email.as_deref(), Some("bob@contoso.com"));
            assert_eq!(event.attendees.len(), 2);
            assert_eq!(event.attendees[0].response, ResponseStatus::TentativelyAccepted);
            assert_eq!(event.attendees[1].name, "mallory@contoso.com");
            assert_eq!(event.attendees[1].response, ResponseStatus::None);
            assert_eq!(event.join_url.as_deref(), Some("https://teams/join"));
            assert_eq!(event.web_link.as_deref(), Some("https://outlook/item"));
            assert_eq!(event.category.as_deref(), Some("Blue category"));
            assert!(event.rsvp_enabled);
        }

        #[test]
        fn parses_recurrence_rule() {
            let record = api_event().with_recurrence(json!({
                "pattern": { "type": "weekly", "interval": 1, "daysOfWeek": ["monday"] },
                "range": { "type": "endDate", "startDate": "2024-01-01", "endDate": "2024-01-31" }
            }));
            let event = normalize_record(&record.into(), SOURCE, COLOR).unwrap();

            let rule = event.recurrence.as_ref().unwrap();
            assert!(event.is_recurring);
            assert_eq!(rule.pattern, RecurrencePattern::Weekly);
            assert_eq!(rule.start, event.start);
        }

        #[test]
        fn maps_series_master_to_canonical_id() {
            let mut record = api_event();
            record.series_master_id = Some("MASTER".into());
            let event = normalize_record(&record.into(), SOURCE, COLOR).unwrap();
            assert_eq!(event.series_master_id.as_deref(), Some("events:MASTER"));
        }

        #[test]
        fn all_day_bare_dates() {
            let mut record = CalendarApiRecord::new("d", "2024-03-04", "2024-03-05");
            record.is_all_day = true;
            let event = normalize_record(&record.into(), SOURCE, COLOR).unwrap();
            assert!(event.is_all_day);
            assert_eq!(event.duration(), chrono::Duration::days(1));
        }

        #[test]
        fn end_before_start_is_clamped() {
            let record = CalendarApiRecord::new("x", "2024-01-01T10:00:00", "2024-01-01T09:00:00");
            let event = normalize_record(&record.into(), SOURCE, COLOR).unwrap();
            assert_eq!(event.start, event.end);
        }
    }

    mod dropped_records {
        use super::*;

        #[test]
        fn unparseable_dates_are_dropped() {
            let record = CalendarApiRecord::new("x", "garbage", "2024-01-01T09:00:00");
            assert!(normalize_record(&record.into(), SOURCE, COLOR).is_none());

            let mut item = list_item();
            item.end_date = None;
            assert!(normalize_record(&item.into(), SOURCE, COLOR).is_none());
        }

        #[test]
        fn cancelled_events_are_dropped() {
            let mut record = api_event();
            record.is_cancelled = true;
            assert!(normalize_record(&record.into(), SOURCE, COLOR).is_none());
        }

        #[test]
        fn bad_record_does_not_affect_siblings() {
            let records = vec![
                RawRecord::from(list_item()),
                RawRecord::from(ListRecord::new(2, "nope", "nope")),
                RawRecord::from(api_event()),
            ];
            let events = normalize_records(&records, SOURCE, COLOR);
            let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
            assert_eq!(ids, vec!["events:1", "events:AAMk"]);
        }
    }

    #[test]
    fn strip_html_handles_entities_and_nesting() {
        assert_eq!(
            strip_html("<p>Fish &amp; chips</p><br/><span\nclass=\"x\">today</span>"),
            "Fish & chips today"
        );
        assert_eq!(strip_html("plain"), "plain");
        assert_eq!(strip_html(""), "");
    }
}
