//! # Event Channel
//!
//! Defines the publishing side of a channel and the listener registry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::RwLock;
use shared_types::RoutingEvent;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, trace};

use crate::filter::EventFilter;
use crate::lease::{Lease, LeaseError, LeaseId, LeaseTerm};
use crate::subscriber::{spawn_delivery, Delivery, EventSink};
use crate::DEFAULT_LEASE;

/// Trait for publishing events to listeners.
pub trait EventPublisher: Send + Sync {
    /// Publish an event to every active listener.
    ///
    /// Never blocks on listeners and never reports listener failures.
    ///
    /// # Returns
    ///
    /// The number of listeners the event was queued for.
    fn publish(&self, event: RoutingEvent) -> usize;

    /// Get the total number of events published.
    fn events_published(&self) -> u64;
}

/// Channel configuration.
#[derive(Debug, Clone)]
pub struct ChannelConfig {
    /// Label used in logs.
    pub name: String,
    /// Lease granted by `add_listener_default`.
    pub default_lease: Duration,
}

impl Default for ChannelConfig {
    fn default() -> Self {
        Self {
            name: "channel".to_string(),
            default_lease: DEFAULT_LEASE,
        }
    }
}

impl ChannelConfig {
    /// Config with a log label.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Counters describing a channel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChannelStats {
    /// Listeners currently registered.
    pub listeners: usize,
    /// Events published since creation.
    pub events_published: u64,
    /// Listeners removed because their lease lapsed.
    pub expired: u64,
    /// Listeners removed because delivery failed.
    pub failed: u64,
    /// Listeners removed by explicit cancel.
    pub cancelled: u64,
}

/// One registered listener.
struct ListenerSlot {
    term: LeaseTerm,
    filter: EventFilter,
    /// Last sequence number assigned to this listener.
    cursor: u64,
    queue: mpsc::UnboundedSender<Delivery>,
}

pub(crate) struct ChannelInner {
    config: ChannelConfig,
    listeners: RwLock<HashMap<LeaseId, ListenerSlot>>,
    events_published: AtomicU64,
    expired: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
}

impl ChannelInner {
    /// Remove lapsed listeners. Dropping a slot closes its queue, which ends
    /// the delivery task once already-queued events are handed over.
    fn purge_expired(&self, listeners: &mut HashMap<LeaseId, ListenerSlot>, now: Instant) {
        let before = listeners.len();
        listeners.retain(|lease, slot| {
            let keep = !slot.term.is_expired(now);
            if !keep {
                debug!(channel = %self.config.name, %lease, "Listener lease expired");
            }
            keep
        });
        let purged = before - listeners.len();
        if purged > 0 {
            self.expired.fetch_add(purged as u64, Ordering::Relaxed);
        }
    }

    pub(crate) fn renew(&self, lease: LeaseId, duration: Duration) -> Result<(), LeaseError> {
        let now = Instant::now();
        let mut listeners = self.listeners.write();
        let Some(slot) = listeners.get_mut(&lease) else {
            return Err(LeaseError::Unknown { lease });
        };
        if slot.term.is_expired(now) {
            listeners.remove(&lease);
            self.expired.fetch_add(1, Ordering::Relaxed);
            return Err(LeaseError::Expired { lease });
        }
        slot.term = LeaseTerm::starting_at(now, duration);
        trace!(channel = %self.config.name, %lease, ?duration, "Lease renewed");
        Ok(())
    }

    pub(crate) fn cancel(&self, lease: LeaseId) -> Result<(), LeaseError> {
        if self.listeners.write().remove(&lease).is_none() {
            return Err(LeaseError::Unknown { lease });
        }
        self.cancelled.fetch_add(1, Ordering::Relaxed);
        debug!(channel = %self.config.name, %lease, "Listener cancelled");
        Ok(())
    }

    pub(crate) fn drop_failed(&self, lease: LeaseId) {
        if self.listeners.write().remove(&lease).is_some() {
            self.failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub(crate) fn remaining(&self, lease: LeaseId) -> Option<Duration> {
        let now = Instant::now();
        self.listeners
            .read()
            .get(&lease)
            .and_then(|slot| slot.term.remaining(now))
    }

    pub(crate) fn is_active(&self, lease: LeaseId) -> bool {
        let now = Instant::now();
        self.listeners
            .read()
            .get(&lease)
            .is_some_and(|slot| !slot.term.is_expired(now))
    }
}

/// Leased fan-out channel for routing events.
///
/// Cloning yields another handle to the same channel. Listener delivery
/// tasks run on the ambient tokio runtime, so registering a listener
/// must happen inside one.
#[derive(Clone)]
pub struct EventChannel {
    inner: Arc<ChannelInner>,
}

impl EventChannel {
    /// Create a channel with default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(ChannelConfig::default())
    }

    /// Create a channel labelled `name` in logs.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self::with_config(ChannelConfig::named(name))
    }

    /// Create a channel with specific configuration.
    #[must_use]
    pub fn with_config(config: ChannelConfig) -> Self {
        Self {
            inner: Arc::new(ChannelInner {
                config,
                listeners: RwLock::new(HashMap::new()),
                events_published: AtomicU64::new(0),
                expired: AtomicU64::new(0),
                failed: AtomicU64::new(0),
                cancelled: AtomicU64::new(0),
            }),
        }
    }

    /// Log label of this channel.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.inner.config.name
    }

    /// Register a listener for every event, with a lease of `lease`.
    ///
    /// The listener sees only events published after this call.
    pub fn add_listener(&self, sink: Arc<dyn EventSink>, lease: Duration) -> Lease {
        self.add_filtered_listener(sink, EventFilter::all(), lease)
    }

    /// Register a listener with the configured default lease.
    pub fn add_listener_default(&self, sink: Arc<dyn EventSink>) -> Lease {
        self.add_listener(sink, self.inner.config.default_lease)
    }

    /// Register a listener that only sees events passing `filter`.
    pub fn add_filtered_listener(
        &self,
        sink: Arc<dyn EventSink>,
        filter: EventFilter,
        lease: Duration,
    ) -> Lease {
        let id = LeaseId::generate();
        let (queue, receiver) = mpsc::unbounded_channel();
        let slot = ListenerSlot {
            term: LeaseTerm::starting_at(Instant::now(), lease),
            filter,
            cursor: 0,
            queue,
        };

        self.inner.listeners.write().insert(id, slot);
        spawn_delivery(id, sink, receiver, Arc::downgrade(&self.inner));

        debug!(channel = %self.inner.config.name, lease = %id, ?lease, "Listener registered");
        Lease::new(id, Arc::downgrade(&self.inner))
    }

    /// Number of registered listeners (including lapsed ones not yet purged).
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.inner.listeners.read().len()
    }

    /// Remove every listener whose lease has lapsed.
    pub fn purge_expired(&self) {
        let mut listeners = self.inner.listeners.write();
        self.inner.purge_expired(&mut listeners, Instant::now());
    }

    /// Periodically purge lapsed leases.
    ///
    /// The task ends on its own once every handle to the channel is dropped.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let channel: Weak<ChannelInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            loop {
                ticker.tick().await;
                let Some(inner) = channel.upgrade() else {
                    return;
                };
                let mut listeners = inner.listeners.write();
                inner.purge_expired(&mut listeners, Instant::now());
            }
        })
    }

    /// Snapshot of the channel counters.
    #[must_use]
    pub fn stats(&self) -> ChannelStats {
        ChannelStats {
            listeners: self.listener_count(),
            events_published: self.inner.events_published.load(Ordering::Relaxed),
            expired: self.inner.expired.load(Ordering::Relaxed),
            failed: self.inner.failed.load(Ordering::Relaxed),
            cancelled: self.inner.cancelled.load(Ordering::Relaxed),
        }
    }
}

impl Default for EventChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.inner.config.name)
            .field("listeners", &self.listener_count())
            .finish()
    }
}

impl EventPublisher for EventChannel {
    fn publish(&self, event: RoutingEvent) -> usize {
        self.inner.events_published.fetch_add(1, Ordering::Relaxed);

        let mut listeners = self.inner.listeners.write();
        self.inner.purge_expired(&mut listeners, Instant::now());

        let mut queued = 0;
        for slot in listeners.values_mut() {
            if !slot.filter.matches(&event) {
                continue;
            }
            slot.cursor += 1;
            let delivery = Delivery {
                sequence: slot.cursor,
                event: event.clone(),
            };
            // A closed queue means the delivery task already gave up; the
            // slot is removed by that task.
            if slot.queue.send(delivery).is_ok() {
                queued += 1;
            }
        }

        trace!(
            channel = %self.inner.config.name,
            track = %event.track_id(),
            kind = %event.kind,
            listeners = queued,
            "Event published"
        );
        queued
    }

    fn events_published(&self) -> u64 {
        self.inner.events_published.load(Ordering::Relaxed)
    }
}
