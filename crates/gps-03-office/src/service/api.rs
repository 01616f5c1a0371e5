//! Package handling: injection, one hop of greedy forwarding, and loss
//! reporting when the next hop cannot be reached.

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use gps_01_neighbor_table::NextHop;
use gps_telemetry::{
    log_package_event, log_peer_event, metric_inc, HOPS_FORWARDED, PACKAGES_DELIVERED,
    PACKAGES_INJECTED, PACKAGES_LOST,
};
use shared_bus::{EventChannel, EventSink};
use shared_types::{Coordinate, EventKind, Receipt, RemoteError};

use super::core::RoutingNode;
use crate::ports::{Injection, ObservedInjection, OfficeHandle};

impl RoutingNode {
    /// Accept a package and start routing it from this office.
    ///
    /// Returns before the first hop runs.
    ///
    /// # Errors
    ///
    /// - `Unreachable` if the office no longer serves
    /// - `Rejected` if `destination` is not a finite coordinate
    pub fn inject(self: &Arc<Self>, destination: Coordinate) -> Result<Injection, RemoteError> {
        let (receipt, channel) = self.accept(destination)?;
        self.begin(receipt, channel.clone());
        Ok(Injection { receipt, channel })
    }

    /// Accept a package with `sink` listening on its channel from the start.
    ///
    /// # Errors
    ///
    /// As [`RoutingNode::inject`].
    pub fn inject_observed(
        self: &Arc<Self>,
        destination: Coordinate,
        sink: Arc<dyn EventSink>,
        lease: Duration,
    ) -> Result<ObservedInjection, RemoteError> {
        let (receipt, channel) = self.accept(destination)?;
        let lease = channel.add_listener(sink, lease);
        self.begin(receipt, channel.clone());
        Ok(ObservedInjection {
            receipt,
            channel,
            lease,
        })
    }

    fn accept(&self, destination: Coordinate) -> Result<(Receipt, EventChannel), RemoteError> {
        if !self.is_serving() {
            return Err(RemoteError::unreachable(self.name()));
        }
        if !destination.is_finite() {
            return Err(RemoteError::Rejected(format!(
                "destination {destination} is not a finite coordinate"
            )));
        }

        let receipt = Receipt::new(self.context.track_ids.issue(), destination);
        let channel = EventChannel::named(format!("package-{}", receipt.track_id));

        metric_inc!(PACKAGES_INJECTED);
        log_package_event!(
            info,
            self.name(),
            receipt.track_id,
            "Package accepted",
            destination = %destination
        );
        Ok((receipt, channel))
    }

    fn begin(self: &Arc<Self>, receipt: Receipt, channel: EventChannel) {
        let node = Arc::clone(self);
        self.dispatcher.spawn(async move {
            node.forward(receipt, channel).await;
        });
    }

    /// Handle one hop of `receipt` at this office.
    ///
    /// Publishes `Arrived`, inspects, then either delivers here or publishes
    /// `Departed` and hands the package to the closest neighbor on the
    /// dispatcher. Returns once that decision is made; the neighbor's
    /// handling runs on the pool.
    pub async fn forward(self: &Arc<Self>, receipt: Receipt, channel: EventChannel) {
        self.counters.handled.fetch_add(1, Ordering::Relaxed);
        self.publish(&channel, receipt, EventKind::Arrived);

        if !self.inspect().await {
            log_package_event!(debug, self.name(), receipt.track_id, "Office stopped during inspection");
            return;
        }

        let next = {
            let table = self.table.lock();
            match table.closest_to(&receipt.destination) {
                NextHop::Local => None,
                NextHop::Neighbor(entry) => Some(entry.handle.clone()),
            }
        };

        match next {
            None => {
                self.counters.delivered.fetch_add(1, Ordering::Relaxed);
                metric_inc!(PACKAGES_DELIVERED);
                self.publish(&channel, receipt, EventKind::Delivered);
                log_package_event!(info, self.name(), receipt.track_id, "Package delivered");
            }
            Some(next) => {
                self.publish(&channel, receipt, EventKind::Departed);
                self.dispatch_hop(next, receipt, channel);
            }
        }
    }

    /// Sleep for the inspection delay. Returns false if the office stopped.
    async fn inspect(&self) -> bool {
        let delay = self.config.inspection_delay;
        if !delay.is_zero() {
            tokio::select! {
                () = self.shutdown.cancelled() => return false,
                () = tokio::time::sleep(delay) => {}
            }
        }
        self.is_serving()
    }

    fn dispatch_hop(self: &Arc<Self>, next: OfficeHandle, receipt: Receipt, channel: EventChannel) {
        self.counters.forwarded.fetch_add(1, Ordering::Relaxed);
        metric_inc!(HOPS_FORWARDED);
        log_peer_event!(
            debug,
            self.name(),
            "Package handed to neighbor",
            next.name(),
            track_id = %receipt.track_id
        );

        let node = Arc::clone(self);
        self.dispatcher.spawn(async move {
            let Err(error) = next.forward(receipt, channel.clone()).await else {
                return;
            };
            if !node.is_serving() {
                return;
            }
            node.counters.lost.fetch_add(1, Ordering::Relaxed);
            metric_inc!(PACKAGES_LOST);
            log_peer_event!(
                warn,
                node.name(),
                "Next hop unreachable, package lost",
                next.name(),
                track_id = %receipt.track_id,
                %error
            );
            node.publish(&channel, receipt, EventKind::Lost);
        });
    }
}
