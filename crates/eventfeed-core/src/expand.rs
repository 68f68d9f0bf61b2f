//! Recurrence expansion.
//!
//! [`expand`] turns one event carrying a [`RecurrenceRule`] into the concrete
//! occurrences that intersect a date window.
//!
//! Only whole pattern steps are generated: a weekly rule listing Monday and
//! Wednesday still advances one week at a time from its start date. The
//! extra weekdays only feed [`describe_recurrence`].
//!
//! [`RecurrenceRule`]: crate::recurrence::RecurrenceRule
//! [`describe_recurrence`]: crate::recurrence::describe_recurrence

use chrono::{DateTime, Utc};
use tracing::trace;

use crate::event::CanonicalEvent;

/// Upper bound on generated ordinals for rules without an occurrence count.
pub const MAX_OCCURRENCES: u32 = 500;

/// Builds the id of the `ordinal`-th occurrence of a series.
pub fn occurrence_id(master_id: &str, ordinal: u32) -> String {
    format!("{master_id}:occ:{ordinal}")
}

/// Expands `event` into the occurrences overlapping `[range_start, range_end]`.
///
/// The result is never empty: an event without a rule, or a rule with no
/// occurrence inside the window, comes back as the single original event.
pub fn expand(
    event: &CanonicalEvent,
    range_start: DateTime<Utc>,
    range_end: DateTime<Utc>,
) -> Vec<CanonicalEvent> {
    let Some(rule) = event.recurrence.as_ref() else {
        return vec![event.clone()];
    };

    let duration = event.duration();
    let cap = rule.max_occurrences.unwrap_or(MAX_OCCURRENCES);
    let mut occurrences = Vec::new();

    for ordinal in 0..cap {
        let Some(current) = rule.nth_start(ordinal) else {
            break;
        };
        if rule.end.is_some_and(|end| current > end) {
            break;
        }
        if current > range_end {
            break;
        }
        let Some(current_end) = current.checked_add_signed(duration) else {
            break;
        };
        let mut occurrence = event.clone();
        occurrence.start = current;
        occurrence.end = current_end;
        if occurrence.overlaps(range_start, range_end) {
            occurrence.id = occurrence_id(&event.id, ordinal);
            occurrence.series_master_id = Some(event.id.clone());
            occurrences.push(occurrence);
        }
    }

    if occurrences.is_empty() {
        trace!(id = %event.id, "no occurrence inside window, keeping series master");
        return vec![event.clone()];
    }

    trace!(id = %event.id, count = occurrences.len(), "expanded recurring event");
    occurrences
}
