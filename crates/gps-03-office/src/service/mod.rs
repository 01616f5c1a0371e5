//! # Office Service
//!
//! `RoutingNode` wires the neighbor table, the event channels and the
//! directory together into one long-lived office.
//!
//! A node is invoked concurrently by remote callers (`inject`, `forward`),
//! by its own directory watcher, and by its hop dispatcher. All shared state
//! is behind locks or atomics; the neighbor table sits behind one exclusive
//! lock used for both patches and routing decisions.

// Semantic submodules
mod api;
mod core;
mod dispatcher;
mod events;
mod maintenance;

// Re-export public API
pub use self::core::{OfficeContext, OfficeStats, RoutingNode};
pub use dispatcher::HopDispatcher;
