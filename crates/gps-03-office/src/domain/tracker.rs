//! Observer-side package lifecycle.
//!
//! Listeners see a package move `Injected → InTransit → Delivered | Lost`.
//! Events may arrive with gaps (a listener joined late or a lease lapsed)
//! and a terminal event may be repeated; the tracker tolerates both.
//!
//! Settled packages are kept for inspection until `prune_settled` drops
//! them; the delivered and lost totals survive pruning.

use std::collections::HashMap;
use std::time::Duration;

use shared_types::{Coordinate, EventKind, Receipt, RoutingEvent, TrackId};
use tokio::time::Instant;

/// Where a package is, as far as one observer knows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageState {
    /// Accepted by an office, no hop observed yet.
    Injected,
    /// Last seen at `office`, arriving or departing.
    InTransit { office: String, last: EventKind },
    /// Delivered by `office`. Terminal.
    Delivered { office: String },
    /// Lost by `office`, the last hop known to have it. Terminal.
    Lost { office: String },
}

impl PackageState {
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered { .. } | Self::Lost { .. })
    }
}

/// How an event changed the tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// The package moved.
    Progress,
    /// The package reached a terminal state.
    Terminal,
    /// The package was already terminal; the event was ignored.
    AfterTerminal,
    /// The sequence number was not newer than one already seen on the same
    /// stream; the event was ignored.
    Stale,
}

/// Everything known about one package.
#[derive(Debug, Clone, PartialEq)]
pub struct TrackedPackage {
    pub destination: Coordinate,
    pub state: PackageState,
    /// Offices the package was seen arriving at, in order.
    pub route: Vec<String>,
    /// When the terminal event was recorded.
    pub settled_at: Option<Instant>,
}

/// Folds routing events into per-package state.
#[derive(Debug, Default)]
pub struct PackageTracker {
    packages: HashMap<TrackId, TrackedPackage>,
    /// Highest sequence number seen per listener stream.
    cursors: HashMap<String, u64>,
    delivered: usize,
    lost: usize,
}

impl PackageTracker {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking a package before any event for it is seen.
    pub fn register(&mut self, receipt: &Receipt) {
        self.packages
            .entry(receipt.track_id)
            .or_insert_with(|| TrackedPackage {
                destination: receipt.destination,
                state: PackageState::Injected,
                route: Vec::new(),
                settled_at: None,
            });
    }

    /// Apply one event delivered on listener stream `stream` with sequence
    /// number `sequence`.
    pub fn record(&mut self, stream: &str, sequence: u64, event: &RoutingEvent) -> Observation {
        match self.cursors.get_mut(stream) {
            Some(last) if *last >= sequence => return Observation::Stale,
            Some(last) => *last = sequence,
            None => {
                self.cursors.insert(stream.to_string(), sequence);
            }
        }

        self.register(&event.receipt);
        let Some(package) = self.packages.get_mut(&event.track_id()) else {
            return Observation::Stale;
        };
        if package.state.is_terminal() {
            return Observation::AfterTerminal;
        }

        let office = event.origin_office.clone();
        package.state = match event.kind {
            EventKind::Arrived => {
                package.route.push(office.clone());
                PackageState::InTransit {
                    office,
                    last: EventKind::Arrived,
                }
            }
            EventKind::Departed => PackageState::InTransit {
                office,
                last: EventKind::Departed,
            },
            EventKind::Delivered => {
                self.delivered += 1;
                PackageState::Delivered { office }
            }
            EventKind::Lost => {
                self.lost += 1;
                PackageState::Lost { office }
            }
        };

        if package.state.is_terminal() {
            package.settled_at = Some(Instant::now());
            Observation::Terminal
        } else {
            Observation::Progress
        }
    }

    #[must_use]
    pub fn get(&self, track_id: TrackId) -> Option<&TrackedPackage> {
        self.packages.get(&track_id)
    }

    #[must_use]
    pub fn state(&self, track_id: TrackId) -> Option<&PackageState> {
        self.get(track_id).map(|package| &package.state)
    }

    /// Packages not yet in a terminal state.
    #[must_use]
    pub fn in_flight(&self) -> usize {
        self.packages
            .values()
            .filter(|package| !package.state.is_terminal())
            .count()
    }

    /// Packages delivered since the tracker was created, pruned or not.
    #[must_use]
    pub fn delivered(&self) -> usize {
        self.delivered
    }

    /// Packages lost since the tracker was created, pruned or not.
    #[must_use]
    pub fn lost(&self) -> usize {
        self.lost
    }

    /// Packages currently held, settled or not.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }

    /// Listener streams with a recorded cursor.
    #[must_use]
    pub fn stream_count(&self) -> usize {
        self.cursors.len()
    }

    /// Stop tracking a package.
    pub fn forget(&mut self, track_id: TrackId) -> Option<TrackedPackage> {
        self.packages.remove(&track_id)
    }

    /// Drop the cursor of a listener stream that will see no more events.
    pub fn forget_stream(&mut self, stream: &str) -> bool {
        self.cursors.remove(stream).is_some()
    }

    /// Drop packages that settled at least `retention` ago. Returns how many
    /// were dropped.
    pub fn prune_settled(&mut self, retention: Duration) -> usize {
        let now = Instant::now();
        let before = self.packages.len();
        self.packages.retain(|_, package| {
            package
                .settled_at
                .map_or(true, |settled| now.saturating_duration_since(settled) < retention)
        });
        before - self.packages.len()
    }
}
