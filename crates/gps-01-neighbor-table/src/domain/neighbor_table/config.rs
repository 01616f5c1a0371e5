//! Neighbor table constants and configuration.

/// Number of neighbors each office keeps (K)
pub const DEFAULT_CAPACITY: usize = 3;

/// Neighbor table configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NeighborTableConfig {
    /// Maximum number of neighbors kept
    pub capacity: usize,
}

impl Default for NeighborTableConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
        }
    }
}

impl NeighborTableConfig {
    /// Config keeping `capacity` neighbors
    pub fn with_capacity(capacity: usize) -> Self {
        Self { capacity }
    }
}
