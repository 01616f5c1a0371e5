//! # GPS Office
//!
//! An office is an autonomous routing participant bound in the directory
//! under a unique name at a fixed coordinate. It keeps its nearest
//! neighbors current as offices come and go, and relays packages one hop at
//! a time toward their destination.
//!
//! ## Architecture
//!
//! - **Domain:** errors and the observer-side `PackageTracker`
//! - **Ports:** `OfficeApi`, the remote surface every office exposes, and
//!   `OfficeHandle`, the value stored in the directory and neighbor tables
//! - **Service:** `RoutingNode`, the office actor (greedy forwarding,
//!   directory reaction, hop dispatch pool)
//! - **Adapters:** `LocalOffice`, an in-process `OfficeApi` over a node
//!
//! ## Package journey
//!
//! ```text
//! customer ──inject──► A: Arrived ─(inspect)─► Departed ──forward──► B: Arrived ─(inspect)─► Delivered
//!                                                   │
//!                                                   └─ forward fails ─► A: Lost
//! ```
//!
//! Every event goes to the package's own channel and to the office's
//! global channel, which the headquarters monitor listens on.

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

pub use adapters::LocalOffice;
pub use config::{OfficeConfig, DEFAULT_INSPECTION_DELAY, DEFAULT_WORKER_POOL_SIZE};
pub use domain::*;
pub use ports::*;
pub use service::{HopDispatcher, OfficeContext, OfficeStats, RoutingNode};
