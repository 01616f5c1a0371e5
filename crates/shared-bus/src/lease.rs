//! # Listener Leases
//!
//! A lease is a time-bounded grant to keep receiving events from one
//! channel. Leases expire independently of delivery activity; the holder
//! must renew before expiry to keep listening.
//!
//! ## Lifecycle
//!
//! - Granted by `EventChannel::add_listener` with a duration.
//! - Extended with `Lease::renew` (only while still active).
//! - Ended by expiry or by `Lease::cancel`.
//!
//! Expiry is observed lazily: a lapsed lease stops receiving events at the
//! next publish or sweep, never mid-delivery.

use std::fmt;
use std::sync::Weak;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use uuid::Uuid;

use crate::channel::ChannelInner;

/// Errors from lease operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LeaseError {
    /// The lease is not (or no longer) registered with the channel.
    #[error("Lease {lease} is not registered")]
    Unknown { lease: LeaseId },

    /// The lease lapsed before it was renewed.
    #[error("Lease {lease} has expired")]
    Expired { lease: LeaseId },

    /// The channel that granted the lease no longer exists.
    #[error("Event channel closed")]
    ChannelClosed,
}

/// Unique identifier of one listener registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LeaseId(Uuid);

impl LeaseId {
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for LeaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Expiry bookkeeping for one registration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LeaseTerm {
    /// `None` when the requested duration does not fit in an `Instant`.
    expires_at: Option<Instant>,
}

impl LeaseTerm {
    pub(crate) fn starting_at(now: Instant, duration: Duration) -> Self {
        Self {
            expires_at: now.checked_add(duration),
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    pub(crate) fn remaining(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// Renewable token returned to a listener.
///
/// Dropping the token does not cancel the registration; only expiry or an
/// explicit `cancel` does.
#[derive(Debug, Clone)]
pub struct Lease {
    id: LeaseId,
    channel: Weak<ChannelInner>,
}

impl Lease {
    pub(crate) fn new(id: LeaseId, channel: Weak<ChannelInner>) -> Self {
        Self { id, channel }
    }

    /// Identifier of this registration.
    #[must_use]
    pub fn id(&self) -> LeaseId {
        self.id
    }

    /// Extend the lease to `duration` from now.
    ///
    /// # Errors
    ///
    /// - `LeaseError::Expired` if the lease already lapsed (the registration
    ///   is purged as a side effect)
    /// - `LeaseError::Unknown` if it was cancelled or dropped for failure
    /// - `LeaseError::ChannelClosed` if the channel is gone
    pub fn renew(&self, duration: Duration) -> Result<(), LeaseError> {
        self.channel()?.renew(self.id, duration)
    }

    /// End the registration now.
    ///
    /// # Errors
    ///
    /// `LeaseError::Unknown` if it was already removed,
    /// `LeaseError::ChannelClosed` if the channel is gone.
    pub fn cancel(&self) -> Result<(), LeaseError> {
        self.channel()?.cancel(self.id)
    }

    /// Time left before expiry. `None` when the lease is no longer
    /// registered or never expires.
    #[must_use]
    pub fn remaining(&self) -> Option<Duration> {
        self.channel.upgrade()?.remaining(self.id)
    }

    /// Whether the channel still delivers to this lease.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.channel
            .upgrade()
            .is_some_and(|inner| inner.is_active(self.id))
    }

    fn channel(&self) -> Result<std::sync::Arc<ChannelInner>, LeaseError> {
        self.channel.upgrade().ok_or(LeaseError::ChannelClosed)
    }
}
