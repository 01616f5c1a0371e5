//! Neighbor entries and the outcomes of table operations.

use shared_types::{Coordinate, NodeIdentity};

/// One known neighbor of the owning office.
///
/// Replaced rather than mutated when the peer is re-measured.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborEntry<H> {
    /// Name and location of the peer
    pub identity: NodeIdentity,
    /// How to reach the peer
    pub handle: H,
    /// Distance between the owner and the peer
    pub distance_from_owner: f64,
}

impl<H> NeighborEntry<H> {
    /// Create an entry measured against `owner`
    pub fn measured(owner: &Coordinate, identity: NodeIdentity, handle: H) -> Self {
        let distance_from_owner = owner.distance_to(&identity.location);
        Self {
            identity,
            handle,
            distance_from_owner,
        }
    }

    /// Directory name of the peer
    pub fn name(&self) -> &str {
        &self.identity.name
    }

    /// Location of the peer
    pub fn location(&self) -> Coordinate {
        self.identity.location
    }

    /// Distance from the peer to `target`
    pub fn distance_to(&self, target: &Coordinate) -> f64 {
        self.identity.distance_to(target)
    }
}

/// Result of a greedy next-hop query.
#[derive(Debug, PartialEq)]
pub enum NextHop<'a, H> {
    /// The owner itself is the closest candidate: deliver here
    Local,
    /// Forward to this neighbor
    Neighbor(&'a NeighborEntry<H>),
}

impl<H> NextHop<'_, H> {
    /// Whether the package stays at the owner
    pub fn is_local(&self) -> bool {
        matches!(self, Self::Local)
    }
}

/// Result of `on_peer_bound`.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundOutcome {
    /// The peer joined a table that had room
    Inserted,
    /// The peer was already present and was re-measured
    Replaced,
    /// The peer joined a full table and pushed out the farthest entry
    Evicted(NodeIdentity),
    /// The peer does not rank within the top K
    Rejected,
}

impl BoundOutcome {
    /// Whether the table contents changed
    pub fn changed(&self) -> bool {
        !matches!(self, Self::Rejected)
    }
}

/// Result of `on_peer_unbound`.
#[derive(Debug, Clone, PartialEq)]
pub struct UnboundOutcome<H> {
    /// The entry that was removed, if the peer was a neighbor
    pub removed: Option<NeighborEntry<H>>,
    /// The removal left the table below capacity
    pub below_capacity: bool,
}

impl<H> UnboundOutcome<H> {
    /// A backfill rebuild may be worthwhile
    pub fn needs_backfill(&self) -> bool {
        self.removed.is_some() && self.below_capacity
    }
}

/// Counters describing one `rebuild` pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RebuildSummary {
    /// Candidate names offered
    pub candidates: usize,
    /// Candidates skipped because they could not be resolved
    pub unresolved: usize,
    /// Candidates skipped as self, duplicate or with a bad location
    pub ignored: usize,
    /// Entries kept in the table afterwards
    pub kept: usize,
}
