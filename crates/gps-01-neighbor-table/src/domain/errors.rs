//! Domain Errors for the Neighbor Table

use std::fmt;

/// Errors that can occur while patching a neighbor table
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NeighborTableError {
    /// Attempted to add the owning office as its own neighbor
    SelfEntry,
    /// Peer reported a location with a NaN or infinite component
    InvalidLocation {
        /// Name of the offending peer
        name: String,
    },
}

impl fmt::Display for NeighborTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SelfEntry => write!(f, "Cannot add the owning office as a neighbor"),
            Self::InvalidLocation { name } => {
                write!(f, "Peer {name} reported a non-finite location")
            }
        }
    }
}

impl std::error::Error for NeighborTableError {}
