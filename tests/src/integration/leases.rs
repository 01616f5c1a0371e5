//! # Listener Leases
//!
//! Registrations are bounded in time, and a listener that is slow, failing
//! or lapsed never holds up routing.

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use async_trait::async_trait;
    use gps_runtime::ShipmentOutcome;
    use shared_bus::{ChannelSink, EventChannel, EventPublisher, EventSink};
    use shared_types::{Coordinate, EventKind, Receipt, RemoteError, RoutingEvent, TrackId};
    use tokio::sync::Notify;
    use tokio::time::{advance, timeout};

    use crate::integration::fixtures::{network, ship, wait_until};

    fn event(kind: EventKind) -> RoutingEvent {
        RoutingEvent::new(
            Receipt::new(TrackId(7), Coordinate::new(1.0, 1.0)),
            "A",
            kind,
        )
    }

    /// Holds every delivery until released.
    struct StuckSink {
        release: Arc<Notify>,
    }

    #[async_trait]
    impl EventSink for StuckSink {
        async fn on_event(&self, _sequence: u64, _event: RoutingEvent) -> Result<(), RemoteError> {
            self.release.notified().await;
            Ok(())
        }
    }

    struct RefusingSink;

    #[async_trait]
    impl EventSink for RefusingSink {
        async fn on_event(&self, _sequence: u64, _event: RoutingEvent) -> Result<(), RemoteError> {
            Err(RemoteError::unreachable("listener"))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_short_lease_sees_events_until_expiry() {
        let channel = EventChannel::named("package-7");
        let (sink, mut rx) = ChannelSink::pair();
        let lease = channel.add_listener(sink, Duration::from_secs(2));

        assert_eq!(channel.publish(event(EventKind::Arrived)), 1);
        let first = timeout(Duration::from_millis(100), rx.recv())
            .await
            .expect("timeout")
            .expect("delivery");
        assert_eq!(first.sequence, 1);
        assert_eq!(first.event.kind, EventKind::Arrived);

        advance(Duration::from_secs(3)).await;

        assert_eq!(channel.publish(event(EventKind::Delivered)), 0);
        assert!(!lease.is_active());
        assert!(matches!(
            timeout(Duration::from_millis(100), rx.recv()).await,
            Ok(None) | Err(_)
        ));
        assert_eq!(channel.stats().expired, 1);
    }

    #[tokio::test]
    async fn test_stuck_global_listener_does_not_delay_delivery() {
        let network = network(&[("A", 0.0, 0.0), ("B", 10.0, 0.0)], 3).await;
        let release = Arc::new(Notify::new());
        let a = network.office("A").expect("A");
        a.global_channel().add_listener(
            Arc::new(StuckSink {
                release: Arc::clone(&release),
            }),
            Duration::from_secs(60),
        );

        let shipment = ship(&network, "A", 10.0, 0.0).await;

        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Delivered {
                office: "B".into()
            }
        );
        release.notify_waiters();
    }

    #[tokio::test]
    async fn test_failing_global_listener_is_dropped_and_routing_continues() {
        let network = network(&[("A", 0.0, 0.0), ("B", 10.0, 0.0)], 3).await;
        let b = network.office("B").expect("B");
        let lease = b
            .global_channel()
            .add_listener(Arc::new(RefusingSink), Duration::from_secs(60));

        let first = ship(&network, "A", 10.0, 0.0).await;
        assert!(matches!(first.outcome, ShipmentOutcome::Delivered { .. }));
        wait_until(|| !lease.is_active()).await;
        assert_eq!(b.global_channel().stats().failed, 1);

        let second = ship(&network, "A", 10.0, 0.0).await;
        assert!(matches!(second.outcome, ShipmentOutcome::Delivered { .. }));
        assert_eq!(b.global_channel().listener_count(), 0);
    }

    #[tokio::test]
    async fn test_cancelled_global_listener_misses_later_packages() {
        let network = network(&[("A", 0.0, 0.0)], 3).await;
        let a = network.office("A").expect("A");
        let (sink, mut rx) = ChannelSink::pair();
        let lease = a.global_channel().add_listener(sink, Duration::from_secs(60));

        let first = ship(&network, "A", 0.0, 0.0).await;
        for expected in [EventKind::Arrived, EventKind::Delivered] {
            let delivery = timeout(Duration::from_secs(1), rx.recv())
                .await
                .expect("timeout")
                .expect("delivery");
            assert_eq!(delivery.event.kind, expected);
            assert_eq!(delivery.event.track_id(), first.receipt.track_id);
        }

        lease.cancel().expect("cancel");
        ship(&network, "A", 0.0, 0.0).await;

        assert!(matches!(
            timeout(Duration::from_millis(50), rx.recv()).await,
            Ok(None) | Err(_)
        ));
    }
}
