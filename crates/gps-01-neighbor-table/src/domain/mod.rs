//! Domain Layer - Pure business logic with no I/O
//!
//! This module contains:
//! - Euclidean distance and distance ordering
//! - The bounded neighbor table and its insertion/eviction rules
//! - Next-hop selection for greedy forwarding

pub mod errors;
pub mod neighbor_table;
pub mod services;

pub use errors::*;
pub use neighbor_table::*;
pub use services::*;
