//! # Shared Bus - Leased Event Channels
//!
//! Broadcast primitive used by offices to notify customers and headquarters
//! about package progress.
//!
//! ## Delivery Model
//!
//! ```text
//!   publisher ── publish() ──► EventChannel ──┬──► queue ──► delivery task ──► sink A
//!                  (never blocks)             ├──► queue ──► delivery task ──► sink B
//!                                             └──► queue ──► delivery task ──► sink C
//! ```
//!
//! - Every listener has its own unbounded queue and delivery task, so a slow
//!   or dead listener never applies backpressure to the publisher or to
//!   other listeners.
//! - Every listener gets its own monotonically increasing sequence number.
//! - Listeners hold a time-bounded lease. Expired leases are purged lazily
//!   on the next publish, or eagerly by the optional sweeper.
//! - A listener whose delivery fails is dropped; the failure is never
//!   reported to the publisher and the missed event is not retried.

// Nursery lints that are too strict
#![allow(clippy::missing_const_for_fn)]
// Allow in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
#![cfg_attr(test, allow(clippy::panic))]

pub mod channel;
pub mod filter;
pub mod lease;
pub mod subscriber;

// Re-export main types
pub use channel::{ChannelConfig, ChannelStats, EventChannel, EventPublisher};
pub use filter::EventFilter;
pub use lease::{Lease, LeaseError, LeaseId};
pub use subscriber::{ChannelSink, Delivery, EventSink};

/// Lease granted when a listener does not ask for a specific duration.
pub const DEFAULT_LEASE: std::time::Duration = std::time::Duration::from_secs(60);
