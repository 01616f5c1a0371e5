//! Adapters Layer - concrete `OfficeApi` implementations

pub mod local;

pub use local::LocalOffice;
