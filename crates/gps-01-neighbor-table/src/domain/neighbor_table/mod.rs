//! Neighbor Table Implementation
//!
//! Bounded set of the K closest known offices to one owner, patched on
//! directory churn and queried for greedy next-hop selection.

// Semantic submodules
mod config;
mod entry;
mod table;

// Re-export public API
pub use config::{NeighborTableConfig, DEFAULT_CAPACITY};
pub use entry::{BoundOutcome, NeighborEntry, NextHop, RebuildSummary, UnboundOutcome};
pub use table::NeighborTable;
