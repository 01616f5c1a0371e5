//! # Routing Events
//!
//! Lifecycle notifications produced at every hop of a package journey.
//! These are the payloads carried by `shared-bus` channels.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::entities::{Receipt, TrackId};

/// What happened to a package at one office.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventKind {
    /// The package reached an office and is being examined.
    Arrived,
    /// The package left an office toward a neighbor.
    Departed,
    /// The office was the closest point to the destination. Terminal.
    Delivered,
    /// The next hop could not be reached. Terminal.
    Lost,
}

impl EventKind {
    /// Delivered and Lost end a journey.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Lost)
    }

    /// Lowercase name, used in logs and metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Arrived => "arrived",
            Self::Departed => "departed",
            Self::Delivered => "delivered",
            Self::Lost => "lost",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One lifecycle notification for one package at one office.
///
/// Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingEvent {
    /// The package this event belongs to.
    pub receipt: Receipt,
    /// The office that produced the event.
    pub origin_office: String,
    /// What happened.
    pub kind: EventKind,
}

impl RoutingEvent {
    /// Create a new event.
    pub fn new(receipt: Receipt, origin_office: impl Into<String>, kind: EventKind) -> Self {
        Self {
            receipt,
            origin_office: origin_office.into(),
            kind,
        }
    }

    /// Tracking number of the package.
    #[must_use]
    pub fn track_id(&self) -> TrackId {
        self.receipt.track_id
    }

    /// Whether this event ends the package journey.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal()
    }
}

impl fmt::Display for RoutingEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let track = self.receipt.track_id;
        let office = &self.origin_office;
        match self.kind {
            EventKind::Arrived => write!(f, "Package number {track} arrived at {office} office"),
            EventKind::Departed => {
                write!(f, "Package number {track} departed from {office} office")
            }
            EventKind::Delivered => write!(
                f,
                "Package number {track} delivered from {office} office to {}",
                self.receipt.destination
            ),
            EventKind::Lost => write!(f, "Package number {track} lost by {office} office"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Coordinate;

    fn receipt() -> Receipt {
        Receipt::new(TrackId(1700000000123), Coordinate::new(20.0, 0.0))
    }

    #[test]
    fn test_terminal_kinds() {
        assert!(!EventKind::Arrived.is_terminal());
        assert!(!EventKind::Departed.is_terminal());
        assert!(EventKind::Delivered.is_terminal());
        assert!(EventKind::Lost.is_terminal());
    }

    #[test]
    fn test_console_rendering() {
        let arrived = RoutingEvent::new(receipt(), "B", EventKind::Arrived);
        assert_eq!(
            arrived.to_string(),
            "Package number 1700000000123 arrived at B office"
        );

        let departed = RoutingEvent::new(receipt(), "B", EventKind::Departed);
        assert_eq!(
            departed.to_string(),
            "Package number 1700000000123 departed from B office"
        );

        let delivered = RoutingEvent::new(receipt(), "C", EventKind::Delivered);
        assert_eq!(
            delivered.to_string(),
            "Package number 1700000000123 delivered from C office to (20,0)"
        );

        let lost = RoutingEvent::new(receipt(), "A", EventKind::Lost);
        assert_eq!(
            lost.to_string(),
            "Package number 1700000000123 lost by A office"
        );
    }

    #[test]
    fn test_event_serializes_with_receipt() {
        let event = RoutingEvent::new(receipt(), "A", EventKind::Arrived);
        let json = serde_json::to_string(&event).unwrap();
        let back: RoutingEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.track_id(), TrackId(1700000000123));
    }
}
