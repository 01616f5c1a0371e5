//! Main NeighborTable implementation.

use std::collections::HashSet;

use shared_types::{Coordinate, NodeIdentity};

use crate::domain::{closest_index, insertion_index, sort_by_distance, NeighborTableError};

use super::config::NeighborTableConfig;
use super::entry::{BoundOutcome, NeighborEntry, NextHop, RebuildSummary, UnboundOutcome};

/// The K closest known offices to one owner.
///
/// # Invariants
/// - `len() <= capacity`
/// - entries sorted by ascending `distance_from_owner`
/// - no two entries share a name
/// - no entry carries the owner's name
///
/// The table is not synchronized. The owner wraps it in a single exclusive
/// lock so that mutation and next-hop selection always see one consistent
/// snapshot.
#[derive(Debug, Clone)]
pub struct NeighborTable<H> {
    /// The office this table belongs to (immutable after creation)
    owner: NodeIdentity,
    /// Sorted neighbors, closest first
    entries: Vec<NeighborEntry<H>>,
    config: NeighborTableConfig,
}

impl<H> NeighborTable<H> {
    /// Create an empty table for `owner`
    pub fn new(owner: NodeIdentity, config: NeighborTableConfig) -> Self {
        Self {
            owner,
            entries: Vec::with_capacity(config.capacity),
            config,
        }
    }

    /// The owning office
    pub fn owner(&self) -> &NodeIdentity {
        &self.owner
    }

    /// Maximum number of neighbors
    pub fn capacity(&self) -> usize {
        self.config.capacity
    }

    /// Current neighbors, closest first
    pub fn entries(&self) -> &[NeighborEntry<H>] {
        &self.entries
    }

    /// Names of current neighbors, closest first
    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(NeighborEntry::name).collect()
    }

    /// Number of neighbors
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if the table has no neighbors
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if the table is at capacity
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.config.capacity
    }

    /// Check if `name` is a current neighbor
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Look up a neighbor by name
    pub fn get(&self, name: &str) -> Option<&NeighborEntry<H>> {
        self.entries.iter().find(|entry| entry.name() == name)
    }

    /// The farthest current neighbor (first candidate for eviction)
    pub fn farthest(&self) -> Option<&NeighborEntry<H>> {
        self.entries.last()
    }

    /// Recompute the table from scratch.
    ///
    /// `resolve` maps a candidate name to its location and handle; names it
    /// cannot resolve (peer vanished mid-lookup) are skipped. The owner's own
    /// name, repeated names and non-finite locations are ignored. Of what
    /// remains, the `capacity` closest are kept; on equal distance the
    /// candidate offered first wins.
    pub fn rebuild<I, S, F>(&mut self, candidates: I, mut resolve: F) -> RebuildSummary
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
        F: FnMut(&str) -> Option<(Coordinate, H)>,
    {
        let mut summary = RebuildSummary::default();
        let mut seen: HashSet<String> = HashSet::new();
        let mut resolved: Vec<NeighborEntry<H>> = Vec::new();

        for candidate in candidates {
            let name = candidate.as_ref();
            summary.candidates += 1;

            if name == self.owner.name || !seen.insert(name.to_string()) {
                summary.ignored += 1;
                continue;
            }
            let Some((location, handle)) = resolve(name) else {
                summary.unresolved += 1;
                continue;
            };
            if !location.is_finite() {
                summary.ignored += 1;
                continue;
            }

            let identity = NodeIdentity::new(name, location);
            resolved.push(NeighborEntry::measured(
                &self.owner.location,
                identity,
                handle,
            ));
        }

        sort_by_distance(&mut resolved, |entry| entry.distance_from_owner);
        resolved.truncate(self.config.capacity);

        summary.kept = resolved.len();
        self.entries = resolved;
        summary
    }

    /// Patch the table for a newly bound peer.
    ///
    /// A peer already present is removed and re-measured. A new peer joins
    /// if there is room, or if it is strictly closer than the current
    /// farthest entry, which is then evicted. A peer at exactly the farthest
    /// distance of a full table is rejected.
    ///
    /// # Errors
    /// - `SelfEntry` if `name` is the owner's
    /// - `InvalidLocation` if `location` has a non-finite component
    pub fn on_peer_bound(
        &mut self,
        name: &str,
        handle: H,
        location: Coordinate,
    ) -> Result<BoundOutcome, NeighborTableError> {
        if name == self.owner.name {
            return Err(NeighborTableError::SelfEntry);
        }
        if !location.is_finite() {
            return Err(NeighborTableError::InvalidLocation {
                name: name.to_string(),
            });
        }
        if self.config.capacity == 0 {
            return Ok(BoundOutcome::Rejected);
        }

        let replaced = match self.position(name) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        };

        let entry = NeighborEntry::measured(
            &self.owner.location,
            NodeIdentity::new(name, location),
            handle,
        );

        if !self.is_full() {
            self.insert_sorted(entry);
            return Ok(if replaced {
                BoundOutcome::Replaced
            } else {
                BoundOutcome::Inserted
            });
        }

        let closer_than_farthest = self
            .farthest()
            .is_some_and(|farthest| entry.distance_from_owner < farthest.distance_from_owner);
        if !closer_than_farthest {
            return Ok(BoundOutcome::Rejected);
        }

        let evicted = self.entries.pop().map(|farthest| farthest.identity);
        self.insert_sorted(entry);
        Ok(match evicted {
            Some(identity) => BoundOutcome::Evicted(identity),
            None => BoundOutcome::Inserted,
        })
    }

    /// Patch the table for a peer that left the directory.
    ///
    /// Unknown names are a no-op. The caller decides whether to backfill
    /// when `below_capacity` is reported, since only it knows whether other
    /// candidates exist.
    pub fn on_peer_unbound(&mut self, name: &str) -> UnboundOutcome<H> {
        let removed = self.position(name).map(|index| self.entries.remove(index));
        UnboundOutcome {
            below_capacity: removed.is_some() && !self.is_full(),
            removed,
        }
    }

    /// Greedy next-hop selection.
    ///
    /// Returns the candidate (owner or neighbor) closest to `target`. The
    /// owner wins exact ties; among equidistant neighbors the one ranked
    /// first in the table wins.
    pub fn closest_to(&self, target: &Coordinate) -> NextHop<'_, H> {
        let local = self.owner.distance_to(target);
        match closest_index(&self.entries, |entry| entry.distance_to(target)) {
            Some((index, best)) if best < local => NextHop::Neighbor(&self.entries[index]),
            _ => NextHop::Local,
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.name() == name)
    }

    fn insert_sorted(&mut self, entry: NeighborEntry<H>) {
        let index = insertion_index(&self.entries, entry.distance_from_owner, |existing| {
            existing.distance_from_owner
        });
        self.entries.insert(index, entry);
    }
}
