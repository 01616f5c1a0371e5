//! # Neighbor Table
//!
//! Each GPS office keeps the K (default 3) offices geographically closest to
//! itself. This crate holds that table and the distance rules that order it.
//!
//! ## Zero-Dependency Core
//!
//! Only `shared-types` is used, for coordinates and identities. The table is
//! generic over the handle type `H`, so it never knows how a neighbor is
//! reached; the office crate plugs in its remote handle.
//!
//! ## Rules
//!
//! - At most `capacity` entries, sorted by ascending distance from the owner
//! - No duplicate names, never the owner itself
//! - Ties at insertion keep the existing entry
//! - Ties at routing time keep the package local
//!
//! ## Example
//!
//! ```rust
//! use gps_01_neighbor_table::{NeighborTable, NeighborTableConfig, NextHop};
//! use shared_types::{Coordinate, NodeIdentity};
//!
//! let owner = NodeIdentity::new("A", Coordinate::new(0.0, 0.0));
//! let mut table: NeighborTable<u32> = NeighborTable::new(owner, NeighborTableConfig::default());
//!
//! table.on_peer_bound("B", 2, Coordinate::new(10.0, 0.0)).unwrap();
//! table.on_peer_bound("C", 3, Coordinate::new(20.0, 0.0)).unwrap();
//! assert_eq!(table.names(), vec!["B", "C"]);
//!
//! // Destination (12,0): B is closer than A or C, so forward to B.
//! match table.closest_to(&Coordinate::new(12.0, 0.0)) {
//!     NextHop::Neighbor(entry) => assert_eq!(entry.name(), "B"),
//!     NextHop::Local => unreachable!(),
//! }
//! ```

pub mod domain;

pub use domain::*;
