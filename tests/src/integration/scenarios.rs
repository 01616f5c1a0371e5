//! # End-to-End Journeys
//!
//! A package handed to an office is seen hop by hop by the Customer that
//! shipped it and by Headquarters, and ends Delivered at the office closest
//! to its destination or Lost by the office that could not hand it on.

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use futures::future::join_all;
    use gps_01_neighbor_table::euclidean_distance;
    use gps_runtime::{Headquarters, HeadquartersConfig, ShipmentOutcome};
    use shared_types::{Coordinate, EventKind};

    use crate::integration::fixtures::{customer, hops, neighbors_of, network, ship, wait_until};

    // =============================================================================
    // Scenario A: three offices in a line, one neighbor each
    // =============================================================================

    #[tokio::test]
    async fn test_line_of_three_delivers_at_far_end() {
        // C first, then B, then A: A keeps B, B keeps C, C keeps B.
        let network = network(&[("C", 20.0, 0.0), ("B", 10.0, 0.0), ("A", 0.0, 0.0)], 1).await;
        wait_until(|| neighbors_of(&network, "C") == ["B"]).await;
        assert_eq!(neighbors_of(&network, "A"), ["B"]);
        assert_eq!(neighbors_of(&network, "B"), ["C"]);

        let shipment = ship(&network, "A", 20.0, 0.0).await;

        assert_eq!(
            hops(&shipment),
            [
                ("A", EventKind::Arrived),
                ("A", EventKind::Departed),
                ("B", EventKind::Arrived),
                ("B", EventKind::Departed),
                ("C", EventKind::Arrived),
                ("C", EventKind::Delivered),
            ]
        );
        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Delivered {
                office: "C".into()
            }
        );
    }

    // =============================================================================
    // Scenario B: a lone office delivers locally
    // =============================================================================

    #[tokio::test]
    async fn test_lone_office_delivers_without_departing() {
        let network = network(&[("A", 5.0, 5.0)], 3).await;

        let shipment = ship(&network, "A", 5.0, 5.0).await;

        assert_eq!(
            hops(&shipment),
            [("A", EventKind::Arrived), ("A", EventKind::Delivered)]
        );
    }

    #[tokio::test]
    async fn test_destination_off_grid_delivers_at_closest_office() {
        let network = network(&[("A", 0.0, 0.0), ("B", 10.0, 0.0)], 3).await;

        let shipment = ship(&network, "A", 12.0, 7.0).await;

        assert_eq!(shipment.route(), ["A", "B"]);
        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Delivered {
                office: "B".into()
            }
        );
    }

    // =============================================================================
    // Scenario C: the only neighbor is gone but still bound
    // =============================================================================

    #[tokio::test]
    async fn test_stale_neighbor_loses_package_at_sender() {
        let network = network(&[("A", 0.0, 0.0), ("B", 10.0, 0.0)], 3).await;
        wait_until(|| neighbors_of(&network, "A") == ["B"]).await;
        network.office("B").expect("B").halt();

        let shipment = ship(&network, "A", 10.0, 0.0).await;

        assert_eq!(
            hops(&shipment),
            [
                ("A", EventKind::Arrived),
                ("A", EventKind::Departed),
                ("A", EventKind::Lost),
            ]
        );
        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Lost {
                office: "A".into()
            }
        );
    }

    // =============================================================================
    // Observers and concurrency
    // =============================================================================

    #[tokio::test]
    async fn test_headquarters_sees_the_customer_journey() {
        let network = network(&[("C", 20.0, 0.0), ("B", 10.0, 0.0), ("A", 0.0, 0.0)], 1).await;
        wait_until(|| neighbors_of(&network, "C") == ["B"]).await;
        let headquarters = Headquarters::start(network.directory(), HeadquartersConfig::default())
            .await
            .expect("headquarters");

        let shipment = ship(&network, "A", 20.0, 0.0).await;
        let track_id = shipment.receipt.track_id;

        wait_until(|| {
            headquarters
                .package(track_id)
                .is_some_and(|package| package.state.is_terminal())
        })
        .await;
        let package = headquarters.package(track_id).expect("tracked");
        let mut route = package.route.clone();
        route.sort();
        assert_eq!(route, ["A", "B", "C"]);
        assert_eq!(headquarters.summary().delivered, 1);
        headquarters.shutdown();
    }

    #[tokio::test]
    async fn test_concurrent_shipments_reach_their_offices() {
        let offices = [
            ("O0", 0.0, 0.0),
            ("O1", 10.0, 0.0),
            ("O2", 20.0, 0.0),
            ("O3", 30.0, 0.0),
            ("O4", 40.0, 0.0),
            ("O5", 50.0, 0.0),
        ];
        let network = network(&offices, 3).await;
        // Nearest three, existing entries winning ties.
        let settled = [
            ("O0", ["O1", "O2", "O3"]),
            ("O1", ["O0", "O2", "O3"]),
            ("O2", ["O1", "O3", "O0"]),
            ("O3", ["O2", "O4", "O1"]),
            ("O4", ["O3", "O5", "O2"]),
            ("O5", ["O4", "O3", "O2"]),
        ];
        wait_until(|| {
            settled
                .iter()
                .all(|(name, expected)| neighbors_of(&network, name) == expected)
        })
        .await;

        let customer = customer(&network);
        let trips: Vec<(&str, &str)> = vec![
            ("O0", "O5"),
            ("O5", "O0"),
            ("O2", "O4"),
            ("O3", "O1"),
            ("O1", "O1"),
        ];
        let location = |name: &str| {
            offices
                .iter()
                .find(|(office, _, _)| *office == name)
                .map(|&(_, x, y)| Coordinate::new(x, y))
                .expect("known office")
        };
        let shipments = join_all(
            trips
                .iter()
                .map(|(origin, target)| customer.ship(origin, location(target))),
        )
        .await;

        let mut track_ids = HashSet::new();
        for ((_, target), shipment) in trips.iter().zip(shipments) {
            let shipment = shipment.expect("shipment should finish");
            assert!(track_ids.insert(shipment.receipt.track_id));
            assert_eq!(
                shipment.outcome,
                ShipmentOutcome::Delivered {
                    office: target.to_string()
                }
            );

            // Every hop strictly closes on the destination.
            let distances: Vec<f64> = shipment
                .route()
                .into_iter()
                .map(|office| euclidean_distance(&location(office), &shipment.receipt.destination))
                .collect();
            assert!(distances.windows(2).all(|pair| pair[1] < pair[0]));
        }
    }
}
