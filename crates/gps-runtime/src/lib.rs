//! # GPS Runtime Library
//!
//! Process-level pieces of the GPS network, exposed for the binary and for
//! tests.
//!
//! - `container/` - configuration and the in-process office network
//! - `headquarters` - network-wide event monitor
//! - `customer` - ships a package and follows it to the end

pub mod container;
pub mod customer;
pub mod headquarters;

pub use container::{ConfigError, OfficeNetwork, RuntimeConfig};
pub use customer::{Customer, CustomerError, Shipment, ShipmentOutcome};
pub use headquarters::{Headquarters, HeadquartersConfig, HeadquartersSummary};
