//! Overlay helpers applied to already-aggregated events.
//!
//! Both helpers are pure. [`apply_source_colors`] hands back borrowed
//! entries for events it leaves alone, so consumers comparing by address can
//! skip them.

use std::borrow::{Borrow, Cow};
use std::collections::{HashMap, HashSet};

use crate::event::CanonicalEvent;
use crate::source::EventSource;

/// Recolors events with the current color of their source.
///
/// Events whose source is unknown, or whose color already matches, are
/// returned as [`Cow::Borrowed`].
pub fn apply_source_colors<'a>(
    events: &'a [CanonicalEvent],
    sources: &[EventSource],
) -> Vec<Cow<'a, CanonicalEvent>> {
    let colors: HashMap<&str, &str> = sources
        .iter()
        .map(|s| (s.id.as_str(), s.color.as_str()))
        .collect();

    events
        .iter()
        .map(|event| match colors.get(event.source_id.as_str()) {
            Some(color) if *color != event.source_color => {
                let mut recolored = event.clone();
                recolored.source_color = (*color).to_string();
                Cow::Owned(recolored)
            }
            _ => Cow::Borrowed(event),
        })
        .collect()
}

/// Keeps the events whose source is visible.
///
/// An empty `visible_ids` means every source is visible.
pub fn filter_by_visible_sources<E>(events: Vec<E>, visible_ids: &[String]) -> Vec<E>
where
    E: Borrow<CanonicalEvent>,
{
    if visible_ids.is_empty() {
        return events;
    }
    let visible: HashSet<&str> = visible_ids.iter().map(String::as_str).collect();
    events
        .into_iter()
        .filter(|e| {
            let event = <E as Borrow<CanonicalEvent>>::borrow(e);
            visible.contains(event.source_id.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn event(id: &str, source: &str, color: &str) -> CanonicalEvent {
        let start = Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap();
        CanonicalEvent::new(id, "x", start, start, source, color)
    }

    #[test]
    fn recolors_known_sources_only() {
        let events = vec![
            event("a:1", "a", "#000000"),
            event("b:1", "b", "#111111"),
            event("zz:1", "zz", "#222222"),
        ];
        let sources = vec![
            EventSource::list("a", "A", "A").with_color("#ff0000"),
            EventSource::list("b", "B", "B").with_color("#111111"),
        ];

        let colored = apply_source_colors(&events, &sources);

        assert_eq!(colored.len(), 3);
        assert!(matches!(colored[0], Cow::Owned(_)));
        assert_eq!(colored[0].source_color, "#ff0000");
        assert!(matches!(colored[1], Cow::Borrowed(_)));
        assert!(matches!(colored[2], Cow::Borrowed(_)));
        assert_eq!(colored[2].source_color, "#222222");
        // input is untouched
        assert_eq!(events[0].source_color, "#000000");
    }

    #[test]
    fn unchanged_entries_keep_their_address() {
        let events = vec![event("a:1", "a", "#000000")];
        let colored = apply_source_colors(&events, &[]);
        match &colored[0] {
            Cow::Borrowed(e) => assert!(std::ptr::eq(*e, &events[0])),
            Cow::Owned(_) => panic!("expected borrowed entry"),
        }
    }

    #[test]
    fn empty_visibility_means_all_visible() {
        let events = vec![event("a:1", "a", ""), event("b:1", "b", "")];
        let filtered = filter_by_visible_sources(events.clone(), &[]);
        assert_eq!(filtered, events);
    }

    #[test]
    fn filters_by_source_id() {
        let events = vec![event("a:1", "a", ""), event("b:1", "b", ""), event("a:2", "a", "")];
        let filtered = filter_by_visible_sources(events.iter().collect::<Vec<_>>(), &["a".to_string()]);
        let ids: Vec<_> = filtered.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a:1", "a:2"]);
    }

    #[test]
    fn composes_with_colored_output() {
        let events = vec![event("a:1", "a", ""), event("b:1", "b", "")];
        let sources = vec![EventSource::list("b", "B", "B").with_color("#00ff00")];
        let visible = filter_by_visible_sources(apply_source_colors(&events, &sources), &["b".to_string()]);
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].source_color, "#00ff00");
    }
}
