//! Domain Layer - registry events and errors

pub mod errors;
pub mod events;

pub use errors::*;
pub use events::*;
