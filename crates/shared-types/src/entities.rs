//! # Core Domain Entities
//!
//! ## Clusters
//!
//! - **Geometry**: `Coordinate` and the Euclidean distance metric
//! - **Identity**: `NodeIdentity`
//! - **Packages**: `TrackId`, `TrackIdGenerator`, `Receipt`

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

// =============================================================================
// CLUSTER A: GEOMETRY
// =============================================================================

/// A fixed point on the 2-D plane offices and destinations live on.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Coordinate {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Coordinate {
    /// Create a coordinate from its components.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// The origin `(0, 0)`.
    #[must_use]
    pub const fn origin() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Euclidean distance to another coordinate.
    #[must_use]
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        distance(self, other)
    }

    /// Both components are finite (no NaN or infinity).
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

impl From<(f64, f64)> for Coordinate {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Euclidean distance between two coordinates.
///
/// Symmetric, zero for identical points, never negative. Finite for any
/// pair of finite coordinates whose separation fits in an `f64`.
#[must_use]
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    (a.x - b.x).hypot(a.y - b.y)
}

// =============================================================================
// CLUSTER B: IDENTITY
// =============================================================================

/// Who an office is and where it sits.
///
/// Created at office startup and immutable for the office's lifetime. The
/// name is the unique directory key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeIdentity {
    /// Unique directory name.
    pub name: String,
    /// Fixed location of the office.
    pub location: Coordinate,
}

impl NodeIdentity {
    /// Create a new identity.
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            location,
        }
    }

    /// Distance from this office to `target`.
    #[must_use]
    pub fn distance_to(&self, target: &Coordinate) -> f64 {
        self.location.distance_to(target)
    }
}

impl fmt::Display for NodeIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.location)
    }
}

// =============================================================================
// CLUSTER C: PACKAGES
// =============================================================================

/// Tracking number of one package journey.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TrackId(pub u64);

impl TrackId {
    /// Raw numeric value.
    #[must_use]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Issues track numbers from the wall clock in milliseconds.
///
/// Two injections in the same millisecond still get distinct numbers:
/// every issued value is strictly greater than the previous one.
#[derive(Debug, Default)]
pub struct TrackIdGenerator {
    last: AtomicU64,
}

impl TrackIdGenerator {
    /// Create a generator with no history.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next track number.
    pub fn issue(&self) -> TrackId {
        let now = Self::now_millis();
        let mut last = self.last.load(Ordering::Relaxed);
        loop {
            let candidate = now.max(last.saturating_add(1));
            match self
                .last
                .compare_exchange_weak(last, candidate, Ordering::AcqRel, Ordering::Relaxed)
            {
                Ok(_) => return TrackId(candidate),
                Err(observed) => last = observed,
            }
        }
    }

    fn now_millis() -> u64 {
        u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or(0)
    }
}

/// Receipt handed out when a package enters the network.
///
/// Immutable once created and carried unchanged across every hop; it is the
/// join key correlating routing events to one package.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    /// Unique tracking number.
    pub track_id: TrackId,
    /// Where the package is going.
    pub destination: Coordinate,
}

impl Receipt {
    /// Create a receipt.
    #[must_use]
    pub const fn new(track_id: TrackId, destination: Coordinate) -> Self {
        Self {
            track_id,
            destination,
        }
    }
}
