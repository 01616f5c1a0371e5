//! # Integration Scenarios
//!
//! Offices, directory, event channels, Headquarters and Customer wired
//! together in one process, the way the runtime binary wires them.

pub mod churn;
pub mod leases;
pub mod scenarios;

#[cfg(test)]
pub(crate) mod fixtures {
    use std::time::Duration;

    use gps_03_office::OfficeConfig;
    use gps_runtime::{Customer, OfficeNetwork, Shipment};
    use shared_types::{Coordinate, EventKind};
    use tokio::time::timeout;

    pub(crate) const LEASE: Duration = Duration::from_secs(60);

    /// Office with no inspection pause so scenarios run in real time.
    pub(crate) fn office(name: &str, x: f64, y: f64) -> OfficeConfig {
        OfficeConfig::new(name, Coordinate::new(x, y)).with_inspection_delay(Duration::ZERO)
    }

    /// Start offices in the order given, each keeping `capacity` neighbors.
    pub(crate) async fn network(offices: &[(&str, f64, f64)], capacity: usize) -> OfficeNetwork {
        let network = OfficeNetwork::new();
        for &(name, x, y) in offices {
            network
                .launch(office(name, x, y).with_neighbor_capacity(capacity))
                .await
                .expect("office should start");
        }
        network
    }

    pub(crate) fn customer(network: &OfficeNetwork) -> Customer {
        Customer::new(network.directory(), LEASE, Duration::from_secs(5))
    }

    pub(crate) async fn ship(network: &OfficeNetwork, origin: &str, x: f64, y: f64) -> Shipment {
        customer(network)
            .ship(origin, Coordinate::new(x, y))
            .await
            .expect("shipment should finish")
    }

    pub(crate) fn hops(shipment: &Shipment) -> Vec<(&str, EventKind)> {
        shipment
            .events
            .iter()
            .map(|event| (event.origin_office.as_str(), event.kind))
            .collect()
    }

    pub(crate) async fn wait_until(mut condition: impl FnMut() -> bool) {
        timeout(Duration::from_secs(5), async {
            while !condition() {
                tokio::time::sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("condition not reached");
    }

    pub(crate) fn neighbors_of(network: &OfficeNetwork, office: &str) -> Vec<String> {
        network
            .office(office)
            .map(|node| node.neighbor_names())
            .unwrap_or_default()
    }
}
