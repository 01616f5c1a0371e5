//! Domain Services - Pure functions for distance ranking
//!
//! All functions in this module are pure (no I/O, no state mutation)
//! and deterministic (same inputs → same outputs).

// Semantic submodules
mod distance;
mod ranking;

// Re-export public API
pub use distance::{compare_distance, euclidean_distance};
pub use ranking::{closest_index, insertion_index, sort_by_distance};
