//! Euclidean distance calculations.

use std::cmp::Ordering;

use shared_types::Coordinate;

/// Straight-line distance between two coordinates.
///
/// # Properties
/// - Symmetric: `euclidean_distance(a, b) == euclidean_distance(b, a)`
/// - Zero to self
/// - Non-negative for finite inputs
pub fn euclidean_distance(a: &Coordinate, b: &Coordinate) -> f64 {
    shared_types::distance(a, b)
}

/// Total order over distances.
///
/// Locations are validated finite before they reach the table, so NaN never
/// shows up here; `total_cmp` keeps sorting well-defined regardless.
pub fn compare_distance(a: f64, b: f64) -> Ordering {
    a.total_cmp(&b)
}
