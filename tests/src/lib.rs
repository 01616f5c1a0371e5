//! # GPS Mesh Test Suite
//!
//! Unified test crate for behaviour that spans crates.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── scenarios.rs   # End-to-end journeys (delivery, local delivery, loss)
//!     ├── leases.rs      # Listener leases, slow and failing listeners
//!     └── churn.rs       # Offices joining, leaving and going stale
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p gps-tests
//! cargo test -p gps-tests integration::churn::
//! ```

#![allow(dead_code)]

pub mod integration;
