//! # Event Subscriber
//!
//! Defines the listener side of a channel: the sink trait a listener
//! implements, and the per-listener delivery task that feeds it.

use std::sync::{Arc, Weak};

use async_trait::async_trait;
use shared_types::{RemoteError, RoutingEvent};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::channel::ChannelInner;
use crate::lease::LeaseId;

/// An event paired with the sequence number assigned for one listener.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    /// Strictly increasing per listener, starting at 1.
    pub sequence: u64,
    /// The notification.
    pub event: RoutingEvent,
}

/// Receiver of channel events.
///
/// Returning an error makes the channel drop this listener.
#[async_trait]
pub trait EventSink: Send + Sync {
    /// Handle one event.
    async fn on_event(&self, sequence: u64, event: RoutingEvent) -> Result<(), RemoteError>;
}

/// Sink that forwards deliveries into an in-process queue.
///
/// Fails with `RemoteError::Closed` once the receiving half is dropped.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    sender: mpsc::UnboundedSender<Delivery>,
}

impl ChannelSink {
    /// Create a sink and the queue it feeds.
    #[must_use]
    pub fn pair() -> (Arc<Self>, mpsc::UnboundedReceiver<Delivery>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Arc::new(Self { sender }), receiver)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn on_event(&self, sequence: u64, event: RoutingEvent) -> Result<(), RemoteError> {
        self.sender
            .send(Delivery { sequence, event })
            .map_err(|_| RemoteError::Closed)
    }
}

/// Drain one listener queue into its sink until the queue closes or the
/// sink fails.
///
/// The queue closes when the channel removes the registration (expiry,
/// cancel) or the channel itself is dropped. Events already queued before
/// that point are still delivered.
pub(crate) fn spawn_delivery(
    lease: LeaseId,
    sink: Arc<dyn EventSink>,
    mut queue: mpsc::UnboundedReceiver<Delivery>,
    channel: Weak<ChannelInner>,
) {
    tokio::spawn(async move {
        while let Some(Delivery { sequence, event }) = queue.recv().await {
            if let Err(error) = sink.on_event(sequence, event).await {
                warn!(%lease, sequence, %error, "Listener delivery failed, dropping listener");
                if let Some(inner) = channel.upgrade() {
                    inner.drop_failed(lease);
                }
                return;
            }
        }
        debug!(%lease, "Listener queue closed");
    });
}
