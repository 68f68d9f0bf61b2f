//! Core types: canonical events, sources, recurrence expansion, overlays

pub mod event;
pub mod expand;
pub mod overlay;
pub mod recurrence;
pub mod source;
pub mod time;
pub mod tracing;

pub use event::{Attendee, CanonicalEvent, Organizer, ResponseStatus, UNTITLED};
pub use expand::{MAX_OCCURRENCES, expand, occurrence_id};
pub use overlay::{apply_source_colors, filter_by_visible_sources};
pub use recurrence::{RecurrencePattern, RecurrenceRule, WeekIndex, describe_recurrence};
pub use source::{
    DEFAULT_SOURCE_COLOR, DEFAULT_SOURCE_ID, EventSource, SourceConnection, SourceKind,
    default_source, get_enabled_sources, parse_sources,
};
pub use time::TimeWindow;
pub use tracing::{TracingConfig, TracingError, TracingOutputFormat, init_tracing};
