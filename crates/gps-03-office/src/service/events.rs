use gps_telemetry::{log_package_event, metric_inc, ROUTING_EVENTS_PUBLISHED};
use shared_bus::{EventChannel, EventPublisher};
use shared_types::{EventKind, Receipt, RoutingEvent};

use super::core::RoutingNode;

impl RoutingNode {
    /// Publish one event to the package channel, then to the global channel.
    ///
    /// Both publishes are non-blocking; a slow listener never delays routing.
    pub(super) fn publish(&self, channel: &EventChannel, receipt: Receipt, kind: EventKind) {
        let event = RoutingEvent::new(receipt, self.name(), kind);
        let package_listeners = channel.publish(event.clone());
        let global_listeners = self.global.publish(event);

        metric_inc!(ROUTING_EVENTS_PUBLISHED, &[kind.as_str()]);
        log_package_event!(
            debug,
            self.name(),
            receipt.track_id,
            "Routing event published",
            kind = %kind,
            package_listeners,
            global_listeners
        );
    }
}
