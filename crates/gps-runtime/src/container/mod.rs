//! # Office Container
//!
//! Holds the directory and every office started in this process, and owns
//! their lifecycle.
//!
//! Offices start in configuration order; each one discovers the offices
//! started before it through the directory listing and is discovered by
//! them through the directory feed.

pub mod config;
pub mod network;

pub use config::{ConfigError, OfficeEntry, RuntimeConfig, ShipmentEntry};
pub use network::OfficeNetwork;
