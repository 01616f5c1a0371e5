//! Adapters Layer - concrete directories

mod memory;

pub use memory::{InMemoryDirectory, DEFAULT_FEED_CAPACITY};
