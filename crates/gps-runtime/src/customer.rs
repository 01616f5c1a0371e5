//! # Customer
//!
//! Hands a package to a named office and follows it to a terminal event.

use std::sync::Arc;
use std::time::Duration;

use gps_02_directory::DirectoryError;
use gps_03_office::OfficeDirectory;
use shared_bus::ChannelSink;
use shared_types::{Coordinate, EventKind, Receipt, RemoteError, RoutingEvent, TrackId};
use thiserror::Error;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Errors from a shipment.
#[derive(Debug, Error)]
pub enum CustomerError {
    #[error("Office lookup failed: {0}")]
    Directory(#[from] DirectoryError),

    #[error("Office refused the package: {0}")]
    Remote(#[from] RemoteError),

    #[error("No news of package {track_id} for {patience:?}")]
    TimedOut { track_id: TrackId, patience: Duration },

    #[error("Listener for package {track_id} was dropped before a final event")]
    ListenerDropped { track_id: TrackId },
}

/// How a journey ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShipmentOutcome {
    Delivered { office: String },
    /// `office` is the last office known to hold the package.
    Lost { office: String },
}

/// A finished journey.
#[derive(Debug, Clone)]
pub struct Shipment {
    pub receipt: Receipt,
    pub outcome: ShipmentOutcome,
    /// Every event seen, in delivery order.
    pub events: Vec<RoutingEvent>,
}

impl Shipment {
    /// Offices the package arrived at, in order.
    pub fn route(&self) -> Vec<&str> {
        self.events
            .iter()
            .filter(|event| event.kind == EventKind::Arrived)
            .map(|event| event.origin_office.as_str())
            .collect()
    }
}

/// Client that ships packages through the network.
pub struct Customer {
    directory: Arc<OfficeDirectory>,
    lease: Duration,
    patience: Duration,
}

impl Customer {
    /// `lease` is requested on each package channel; `patience` bounds the
    /// wait for each next event.
    pub fn new(directory: Arc<OfficeDirectory>, lease: Duration, patience: Duration) -> Self {
        Self {
            directory,
            lease,
            patience,
        }
    }

    /// Hand a package bound for `destination` to office `origin` and wait
    /// for it to be delivered or lost.
    ///
    /// The listener is registered before the first hop runs, so no event is
    /// missed.
    ///
    /// # Errors
    ///
    /// - `Directory` if `origin` is not bound
    /// - `Remote` if the office is unreachable or rejects the destination
    /// - `TimedOut` if no event arrives within the patience window
    /// - `ListenerDropped` if the channel removed the listener
    pub async fn ship(&self, origin: &str, destination: Coordinate) -> Result<Shipment, CustomerError> {
        let office = self.directory.lookup(origin).await?;
        let (sink, mut deliveries) = ChannelSink::pair();
        let injection = office.inject_observed(destination, sink, self.lease).await?;
        let receipt = injection.receipt;
        let track_id = receipt.track_id;
        info!(office = origin, %track_id, %destination, "Package shipped");

        let mut events = Vec::new();
        loop {
            let delivery = match timeout(self.patience, deliveries.recv()).await {
                Ok(Some(delivery)) => delivery,
                Ok(None) => return Err(CustomerError::ListenerDropped { track_id }),
                Err(_) => {
                    let _ = injection.lease.cancel();
                    warn!(%track_id, "Gave up waiting for package");
                    return Err(CustomerError::TimedOut {
                        track_id,
                        patience: self.patience,
                    });
                }
            };

            let event = delivery.event;
            info!(%track_id, sequence = delivery.sequence, "{event}");
            if let Err(error) = injection.lease.renew(self.lease) {
                debug!(%track_id, %error, "Lease renewal failed");
            }

            let outcome = match event.kind {
                EventKind::Delivered => Some(ShipmentOutcome::Delivered {
                    office: event.origin_office.clone(),
                }),
                EventKind::Lost => Some(ShipmentOutcome::Lost {
                    office: event.origin_office.clone(),
                }),
                EventKind::Arrived | EventKind::Departed => None,
            };
            events.push(event);

            if let Some(outcome) = outcome {
                let _ = injection.lease.cancel();
                return Ok(Shipment {
                    receipt,
                    outcome,
                    events,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use gps_03_office::OfficeConfig;

    use super::*;
    use crate::container::OfficeNetwork;

    fn office(name: &str, x: f64) -> OfficeConfig {
        OfficeConfig::new(name, Coordinate::new(x, 0.0)).with_inspection_delay(Duration::ZERO)
    }

    fn customer(network: &OfficeNetwork) -> Customer {
        Customer::new(
            network.directory(),
            Duration::from_secs(60),
            Duration::from_secs(5),
        )
    }

    #[tokio::test]
    async fn test_ship_to_delivery() {
        let network = OfficeNetwork::new();
        network.launch(office("B", 10.0)).await.unwrap();
        network.launch(office("A", 0.0)).await.unwrap();

        let shipment = customer(&network)
            .ship("A", Coordinate::new(10.0, 0.0))
            .await
            .unwrap();

        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Delivered {
                office: "B".into()
            }
        );
        assert_eq!(shipment.route(), ["A", "B"]);
        assert_eq!(shipment.events.len(), 4);
    }

    #[tokio::test]
    async fn test_ship_to_lost() {
        let network = OfficeNetwork::new();
        let b = network.launch(office("B", 10.0)).await.unwrap();
        network.launch(office("A", 0.0)).await.unwrap();
        b.halt();

        let shipment = customer(&network)
            .ship("A", Coordinate::new(10.0, 0.0))
            .await
            .unwrap();

        assert_eq!(
            shipment.outcome,
            ShipmentOutcome::Lost {
                office: "A".into()
            }
        );
    }

    #[tokio::test]
    async fn test_unknown_origin() {
        let network = OfficeNetwork::new();

        let result = customer(&network).ship("Nowhere", Coordinate::origin()).await;

        assert!(matches!(
            result,
            Err(CustomerError::Directory(DirectoryError::NotBound { .. }))
        ));
    }

    #[tokio::test]
    async fn test_halted_origin_is_unreachable() {
        let network = OfficeNetwork::new();
        network.launch(office("A", 0.0)).await.unwrap().halt();

        let result = customer(&network).ship("A", Coordinate::origin()).await;

        assert!(matches!(
            result,
            Err(CustomerError::Remote(RemoteError::Unreachable { .. }))
        ));
    }
}
