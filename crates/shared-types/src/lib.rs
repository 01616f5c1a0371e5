//! # Shared Types Crate
//!
//! This crate contains the data carriers that travel between offices of the
//! Geographic Package System.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: every type that crosses an office boundary
//!   (coordinates, receipts, routing events) is defined here.
//! - **Immutable Values**: `Coordinate`, `NodeIdentity`, `Receipt` and
//!   `RoutingEvent` are never mutated after construction; a hop that needs a
//!   different value builds a new one.
//! - **Shared Remote Failure**: `RemoteError` is the single failure type for
//!   any call that crosses to another office or listener.

pub mod entities;
pub mod errors;
pub mod events;

pub use entities::*;
pub use errors::*;
pub use events::*;

/// Registry type under which every office binds itself.
pub const OFFICE_TYPE: &str = "GPSOffice";
