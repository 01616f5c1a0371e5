//! # Directory Churn
//!
//! Offices come and go while the network runs. Neighbor tables follow the
//! directory, so routes change with them: a new office closer to a
//! destination becomes a hop, a departed one is routed around, and a stale
//! one costs packages only until its entry disappears.

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use gps_02_directory::Directory;
    use gps_runtime::ShipmentOutcome;
    use shared_bus::ChannelSink;
    use shared_types::{Coordinate, EventKind};
    use tokio::time::timeout;

    use crate::integration::fixtures::{neighbors_of, network, office, ship, wait_until, LEASE};

    #[tokio::test]
    async fn test_joining_office_becomes_a_hop() {
        let network = network(&[("A", 0.0, 0.0), ("C", 19.0, 0.0)], 1).await;
        wait_until(|| neighbors_of(&network, "A") == ["C"]).await;
        assert_eq!(ship(&network, "A", 19.0, 0.0).await.route(), ["A", "C"]);

        network
            .launch(office("B", 10.0, 0.0).with_neighbor_capacity(1))
            .await
            .expect("B starts");
        assert_eq!(neighbors_of(&network, "B"), ["C"]);
        wait_until(|| neighbors_of(&network, "A") == ["B"]).await;

        assert_eq!(ship(&network, "A", 19.0, 0.0).await.route(), ["A", "B", "C"]);
    }

    #[tokio::test]
    async fn test_departed_office_is_routed_around() {
        let network = network(&[("A", 0.0, 0.0), ("C", 19.0, 0.0), ("B", 10.0, 0.0)], 1).await;
        wait_until(|| neighbors_of(&network, "A") == ["B"]).await;

        assert!(network.retire("B").await.expect("retire"));

        wait_until(|| neighbors_of(&network, "A") == ["C"]).await;
        let shipment = ship(&network, "A", 19.0, 0.0).await;
        assert_eq!(shipment.route(), ["A", "C"]);
        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Delivered {
                office: "C".into()
            }
        );
    }

    #[tokio::test]
    async fn test_stale_office_loses_packages_until_unbound() {
        let network = network(&[("A", 0.0, 0.0), ("C", 19.0, 0.0), ("B", 10.0, 0.0)], 1).await;
        wait_until(|| neighbors_of(&network, "A") == ["B"]).await;
        network.office("B").expect("B").halt();

        let lost = ship(&network, "A", 19.0, 0.0).await;
        assert_eq!(
            lost.outcome,
            ShipmentOutcome::Lost {
                office: "A".into()
            }
        );

        // The registry eventually drops the dead office's entry.
        network.registry().unbind("B").await.expect("unbind");
        wait_until(|| neighbors_of(&network, "A") == ["C"]).await;

        let delivered = ship(&network, "A", 19.0, 0.0).await;
        assert_eq!(
            delivered.outcome,
            ShipmentOutcome::Delivered {
                office: "C".into()
            }
        );
    }

    #[tokio::test]
    async fn test_last_neighbor_leaving_makes_office_deliver_locally() {
        let network = network(&[("A", 0.0, 0.0), ("B", 10.0, 0.0)], 3).await;
        wait_until(|| neighbors_of(&network, "A") == ["B"]).await;

        network.retire("B").await.expect("retire");
        wait_until(|| neighbors_of(&network, "A").is_empty()).await;

        let shipment = ship(&network, "A", 10.0, 0.0).await;
        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Delivered {
                office: "A".into()
            }
        );
    }

    #[tokio::test]
    async fn test_routing_survives_directory_outage() {
        let network = network(&[("A", 0.0, 0.0), ("B", 10.0, 0.0)], 3).await;
        wait_until(|| neighbors_of(&network, "A") == ["B"]).await;
        let a = network.office("A").expect("A");

        network.registry().set_available(false);
        let (sink, mut rx) = ChannelSink::pair();
        a.inject_observed(Coordinate::new(10.0, 0.0), sink, LEASE)
            .expect("accepted");

        let mut kinds = Vec::new();
        while kinds.last() != Some(&(String::from("B"), EventKind::Delivered)) {
            let delivery = timeout(Duration::from_secs(5), rx.recv())
                .await
                .expect("timeout")
                .expect("delivery");
            kinds.push((delivery.event.origin_office.clone(), delivery.event.kind));
        }
        assert_eq!(kinds.len(), 4);
        network.registry().set_available(true);
    }

    #[tokio::test]
    async fn test_rebinding_a_name_replaces_the_neighbor() {
        let network = network(&[("A", 0.0, 0.0), ("B", 10.0, 0.0)], 3).await;
        wait_until(|| neighbors_of(&network, "A") == ["B"]).await;

        network.retire("B").await.expect("retire");
        network
            .launch(office("B", 3.0, 4.0))
            .await
            .expect("B restarts");

        let a = network.office("A").expect("A");
        wait_until(|| {
            a.neighbors()
                .first()
                .is_some_and(|neighbor| neighbor.location == Coordinate::new(3.0, 4.0))
        })
        .await;
        assert_eq!(a.neighbors().len(), 1);
    }
}
