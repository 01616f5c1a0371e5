//! Domain Layer - office errors and package lifecycle tracking

pub mod errors;
pub mod tracker;

pub use errors::*;
pub use tracker::*;
