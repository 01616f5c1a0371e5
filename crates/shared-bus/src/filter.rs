//! # Event Filters
//!
//! Optional per-listener selection of the events it wants to see.

use shared_types::{EventKind, RoutingEvent, TrackId};

/// Selects which events a listener receives.
///
/// Sequence numbers count delivered events only, so a filtered listener
/// still sees a gap-free sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventFilter {
    /// Only these kinds (`None` = all kinds).
    pub kinds: Option<Vec<EventKind>>,
    /// Only this package (`None` = all packages).
    pub track: Option<TrackId>,
}

impl EventFilter {
    /// Match every event.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Match only the given kinds.
    #[must_use]
    pub fn kinds(kinds: Vec<EventKind>) -> Self {
        Self {
            kinds: Some(kinds),
            track: None,
        }
    }

    /// Match only terminal events (Delivered, Lost).
    #[must_use]
    pub fn terminal() -> Self {
        Self::kinds(vec![EventKind::Delivered, EventKind::Lost])
    }

    /// Match only events of one package.
    #[must_use]
    pub fn track(track: TrackId) -> Self {
        Self {
            kinds: None,
            track: Some(track),
        }
    }

    /// Check if an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &RoutingEvent) -> bool {
        let kind_ok = self
            .kinds
            .as_ref()
            .map_or(true, |kinds| kinds.contains(&event.kind));
        let track_ok = self.track.map_or(true, |track| track == event.track_id());
        kind_ok && track_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::{Coordinate, Receipt};

    fn event(track: u64, kind: EventKind) -> RoutingEvent {
        RoutingEvent::new(
            Receipt::new(TrackId(track), Coordinate::new(1.0, 1.0)),
            "A",
            kind,
        )
    }

    #[test]
    fn test_filter_all() {
        let filter = EventFilter::all();
        assert!(filter.matches(&event(1, EventKind::Arrived)));
        assert!(filter.matches(&event(2, EventKind::Lost)));
    }

    #[test]
    fn test_filter_terminal() {
        let filter = EventFilter::terminal();
        assert!(!filter.matches(&event(1, EventKind::Arrived)));
        assert!(!filter.matches(&event(1, EventKind::Departed)));
        assert!(filter.matches(&event(1, EventKind::Delivered)));
        assert!(filter.matches(&event(1, EventKind::Lost)));
    }

    #[test]
    fn test_filter_by_track() {
        let filter = EventFilter::track(TrackId(7));
        assert!(filter.matches(&event(7, EventKind::Arrived)));
        assert!(!filter.matches(&event(8, EventKind::Arrived)));
    }
}
