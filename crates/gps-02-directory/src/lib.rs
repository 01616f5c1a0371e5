//! # Directory
//!
//! The naming service through which offices find each other: `bind`,
//! `unbind`, `list`, `lookup`, and a live feed of bound/unbound
//! notifications filtered by registry type.
//!
//! ## Architecture
//!
//! - **Domain:** registry events, the event filter and directory errors
//! - **Ports:** the `Directory` trait consumed by offices
//! - **Adapters:** `InMemoryDirectory`, a single-process registry
//!
//! The directory is generic over the handle type it stores, so it never
//! depends on what an office handle looks like.

pub mod adapters;
pub mod domain;
pub mod ports;

pub use adapters::InMemoryDirectory;
pub use domain::*;
pub use ports::*;
