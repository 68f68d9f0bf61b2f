//! Native record shapes returned by source fetchers.
//!
//! A [`RawRecord`] is exactly what an upstream handed back, kept loose:
//! dates stay strings and most fields are optional so that one odd record
//! never fails a whole page. Interpretation happens in
//! [`normalize`](crate::normalize).

use std::fmt;

use serde::{Deserialize, Serialize};

/// A record from either upstream family.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "profile", content = "record", rename_all = "camelCase")]
pub enum RawRecord {
    /// A SharePoint list item.
    List(ListRecord),
    /// A Microsoft Graph calendar event.
    CalendarApi(CalendarApiRecord),
}

impl RawRecord {
    /// Returns the upstream id as a string.
    pub fn native_id(&self) -> String {
        match self {
            Self::List(record) => record.id.to_string(),
            Self::CalendarApi(record) => record.id.clone(),
        }
    }
}

impl From<ListRecord> for RawRecord {
    fn from(record: ListRecord) -> Self {
        Self::List(record)
    }
}

impl From<CalendarApiRecord> for RawRecord {
    fn from(record: CalendarApiRecord) -> Self {
        Self::CalendarApi(record)
    }
}

/// List item ids are integers, but some list views hand them back as text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NativeId {
    Number(i64),
    Text(String),
}

impl fmt::Display for NativeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for NativeId {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

/// A hyperlink column: either a bare url or `{ Url, Description }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinkField {
    Plain(String),
    Link {
        #[serde(rename = "Url")]
        url: Option<String>,
        #[serde(rename = "Description", default)]
        description: Option<String>,
    },
}

impl LinkField {
    /// Returns the url, if any.
    pub fn url(&self) -> Option<&str> {
        let url = match self {
            Self::Plain(url) => Some(url.as_str()),
            Self::Link { url, .. } => url.as_deref(),
        };
        url.filter(|url| !url.trim().is_empty())
    }
}

/// The expanded `Author` lookup of a list item.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListAuthor {
    #[serde(rename = "Title", default)]
    pub title: Option<String>,
    #[serde(rename = "EMail", default)]
    pub email: Option<String>,
}

/// A SharePoint events list item (`odata=nometadata`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ListRecord {
    #[serde(alias = "ID")]
    pub id: NativeId,
    #[serde(default)]
    pub title: Option<String>,
    /// Rich text; may contain HTML.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub event_date: Option<String>,
    #[serde(default)]
    pub end_date: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub category_color: Option<String>,
    #[serde(rename = "fAllDayEvent", default)]
    pub all_day: Option<bool>,
    #[serde(rename = "fRecurrence", default)]
    pub recurrence: Option<bool>,
    #[serde(default)]
    pub banner_url: Option<LinkField>,
    #[serde(default)]
    pub author: Option<ListAuthor>,
    #[serde(default)]
    pub enable_registration: Option<bool>,
    #[serde(default)]
    pub enable_rsvp: Option<bool>,
}

impl ListRecord {
    /// Creates a record with only an id and dates.
    pub fn new(id: impl Into<NativeId>, event_date: impl Into<String>, end_date: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            description: None,
            event_date: Some(event_date.into()),
            end_date: Some(end_date.into()),
            location: None,
            category: None,
            category_color: None,
            all_day: None,
            recurrence: None,
            banner_url: None,
            author: None,
            enable_registration: None,
            enable_rsvp: None,
        }
    }

    /// Builder method to set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder method to set the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Builder method to set the author.
    pub fn with_author(mut self, name: impl Into<String>, email: impl Into<String>) -> Self {
        self.author = Some(ListAuthor {
            title: Some(name.into()),
            email: Some(email.into()),
        });
        self
    }
}

/// A Graph `dateTimeTimeZone` value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiDateTime {
    pub date_time: String,
    #[serde(default)]
    pub time_zone: Option<String>,
}

impl ApiDateTime {
    /// Creates a UTC date-time value.
    pub fn utc(date_time: impl Into<String>) -> Self {
        Self {
            date_time: date_time.into(),
            time_zone: Some("UTC".to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiLocation {
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiEmailAddress {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiRecipient {
    #[serde(default)]
    pub email_address: ApiEmailAddress,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponseStatus {
    #[serde(default)]
    pub response: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiAttendee {
    #[serde(default)]
    pub email_address: ApiEmailAddress,
    #[serde(default)]
    pub status: Option<ApiResponseStatus>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiOnlineMeeting {
    #[serde(default)]
    pub join_url: Option<String>,
}

/// A Microsoft Graph calendar event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarApiRecord {
    pub id: String,
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub body_preview: Option<String>,
    #[serde(default)]
    pub start: Option<ApiDateTime>,
    #[serde(default)]
    pub end: Option<ApiDateTime>,
    #[serde(default)]
    pub is_all_day: bool,
    #[serde(default)]
    pub location: Option<ApiLocation>,
    #[serde(default)]
    pub organizer: Option<ApiRecipient>,
    #[serde(default)]
    pub attendees: Vec<ApiAttendee>,
    /// Left untyped; see [`parse_recurrence`](crate::rule_parser::parse_recurrence).
    #[serde(default)]
    pub recurrence: Option<serde_json::Value>,
    #[serde(default)]
    pub series_master_id: Option<String>,
    #[serde(default)]
    pub online_meeting: Option<ApiOnlineMeeting>,
    #[serde(default)]
    pub web_link: Option<String>,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub response_requested: Option<bool>,
    #[serde(default)]
    pub is_cancelled: bool,
}

impl CalendarApiRecord {
    /// Creates a record with only an id and UTC start/end.
    pub fn new(id: impl Into<String>, start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            subject: None,
            body_preview: None,
            start: Some(ApiDateTime::utc(start)),
            end: Some(ApiDateTime::utc(end)),
            is_all_day: false,
            location: None,
            organizer: None,
            attendees: Vec::new(),
            recurrence: None,
            series_master_id: None,
            online_meeting: None,
            web_link: None,
            categories: Vec::new(),
            response_requested: None,
            is_cancelled: false,
        }
    }

    /// Builder method to set the subject.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Builder method to set the recurrence object.
    pub fn with_recurrence(mut self, recurrence: serde_json::Value) -> Self {
        self.recurrence = Some(recurrence);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn list_item_from_nometadata_json() {
        let value = json!({
            "Id": 42,
            "Title": "Town hall",
            "EventDate": "2024-03-01T15:00:00Z",
            "EndDate": "2024-03-01T16:00:00Z",
            "fAllDayEvent": false,
            "fRecurrence": true,
            "BannerUrl": { "Url": "https://contoso/banner.png", "Description": "banner" },
            "Author": { "Title": "Ada", "EMail": "ada@contoso.com" },
            "EnableRsvp": true
        });
        let record: ListRecord = serde_json::from_value(value).unwrap();

        assert_eq!(record.id.to_string(), "42");
        assert_eq!(record.recurrence, Some(true));
        assert_eq!(
            record.banner_url.as_ref().and_then(LinkField::url),
            Some("https://contoso/banner.png")
        );
        assert_eq!(record.author.unwrap().email.as_deref(), Some("ada@contoso.com"));
        assert_eq!(record.enable_rsvp, Some(true));
        assert_eq!(record.enable_registration, None);
    }

    #[test]
    fn list_item_accepts_text_id_and_plain_banner() {
        let value = json!({ "ID": "7", "BannerUrl": "https://contoso/b.png" });
        let record: ListRecord = serde_json::from_value(value).unwrap();
        assert_eq!(record.id, NativeId::Text("7".to_string()));
        assert!(record.event_date.is_none());
        assert_eq!(
            record.banner_url.as_ref().and_then(LinkField::url),
            Some("https://contoso/b.png")
        );
    }

    #[test]
    fn graph_event_from_json() {
        let value = json!({
            "id": "AAMk",
            "subject": "Standup",
            "bodyPreview": "daily sync",
            "start": { "dateTime": "2024-01-01T09:00:00.0000000", "timeZone": "UTC" },
            "end": { "dateTime": "2024-01-01T09:15:00.0000000", "timeZone": "UTC" },
            "location": { "displayName": "Room 1" },
            "organizer": { "emailAddress": { "name": "Bob", "address": "bob@contoso.com" } },
            "attendees": [
                { "emailAddress": { "name": "Eve", "address": "eve@contoso.com" },
                  "status": { "response": "accepted" } }
            ],
            "onlineMeeting": { "joinUrl": "https://teams/join" },
            "categories": ["Blue"],
            "isCancelled": false,
            "unknownField": 1
        });
        let record: CalendarApiRecord = serde_json::from_value(value).unwrap();

        assert_eq!(record.subject.as_deref(), Some("Standup"));
        assert_eq!(record.attendees.len(), 1);
        assert_eq!(
            record.online_meeting.unwrap().join_url.as_deref(),
            Some("https://teams/join")
        );
        assert!(record.recurrence.is_none());
    }

    #[test]
    fn tagged_union_round_trips_through_json() {
        let raw = RawRecord::from(CalendarApiRecord::new("x", "2024-01-01T00:00:00", "2024-01-01T01:00:00"));
        let value = serde_json::to_value(&raw).unwrap();
        assert_eq!(value["profile"], "calendarApi");
        let back: RawRecord = serde_json::from_value(value).unwrap();
        assert_eq!(back, raw);
        assert_eq!(back.native_id(), "x");
    }
}
