//! Distance ranking and selection.

use std::cmp::Ordering;

use super::distance::compare_distance;

/// Stable sort by a distance key (closest first).
///
/// Equal distances keep their input order.
pub fn sort_by_distance<T>(items: &mut [T], distance: impl Fn(&T) -> f64) {
    items.sort_by(|a, b| compare_distance(distance(a), distance(b)));
}

/// Position at which an item at `distance` joins an already sorted slice.
///
/// The new item goes after every existing item at the same distance, so
/// incumbents keep their rank on ties.
pub fn insertion_index<T>(sorted: &[T], distance: f64, key: impl Fn(&T) -> f64) -> usize {
    sorted.partition_point(|item| compare_distance(key(item), distance) != Ordering::Greater)
}

/// Index of the item with the smallest distance, first one on ties.
pub fn closest_index<T>(items: &[T], distance: impl Fn(&T) -> f64) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, item) in items.iter().enumerate() {
        let d = distance(item);
        match best {
            Some((_, current)) if compare_distance(d, current) != Ordering::Less => {}
            _ => best = Some((index, d)),
        }
    }
    best
}
