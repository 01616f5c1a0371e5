//! # GPS Runtime
//!
//! Brings up a network of offices in one process.
//!
//! ## Startup Sequence
//!
//! 1. Install logging and metrics
//! 2. Load configuration (`GPS_CONFIG` file, then environment overrides)
//! 3. Start offices in configuration order
//! 4. Attach Headquarters to every office
//! 5. Ship the configured packages
//! 6. Run until Ctrl+C, then shut every office down

use std::sync::Arc;

use anyhow::{Context, Result};
use futures::future::join_all;
use gps_runtime::{
    Customer, Headquarters, HeadquartersConfig, OfficeNetwork, RuntimeConfig, ShipmentOutcome,
};
use gps_telemetry::{encode_metrics, init_telemetry, TelemetryConfig};
use tracing::{debug, error, info, warn};

/// The running network and its monitor.
struct GpsRuntime {
    config: RuntimeConfig,
    network: OfficeNetwork,
    headquarters: Arc<Headquarters>,
}

impl GpsRuntime {
    async fn start(config: RuntimeConfig) -> Result<Self> {
        info!("===========================================");
        info!("  GPS Mesh Runtime v{}", env!("CARGO_PKG_VERSION"));
        info!("===========================================");

        let network = OfficeNetwork::start(&config)
            .await
            .context("Failed to start office network")?;
        let headquarters = Headquarters::start(
            network.directory(),
            HeadquartersConfig::with_lease(config.listener_lease()),
        )
        .await
        .context("Failed to start Headquarters")?;

        info!(offices = ?network.names(), "Network running");
        Ok(Self {
            config,
            network,
            headquarters,
        })
    }

    /// Ship every configured package concurrently and log the outcomes.
    async fn run_shipments(&self) {
        if self.config.shipments.is_empty() {
            return;
        }
        let customer = Customer::new(
            self.network.directory(),
            self.config.listener_lease(),
            self.config.shipment_patience(),
        );
        let shipments = self
            .config
            .shipments
            .iter()
            .map(|shipment| customer.ship(&shipment.origin, shipment.destination()));

        for (entry, result) in self.config.shipments.iter().zip(join_all(shipments).await) {
            match result {
                Ok(shipment) => match &shipment.outcome {
                    ShipmentOutcome::Delivered { office } => info!(
                        track_id = %shipment.receipt.track_id,
                        route = ?shipment.route(),
                        office = %office,
                        "Shipment delivered"
                    ),
                    ShipmentOutcome::Lost { office } => warn!(
                        track_id = %shipment.receipt.track_id,
                        office = %office,
                        "Shipment lost"
                    ),
                },
                Err(err) => error!(origin = %entry.origin, error = %err, "Shipment failed"),
            }
        }

        let summary = self.headquarters.summary();
        info!(
            delivered = summary.delivered,
            lost = summary.lost,
            in_flight = summary.in_flight,
            "Headquarters summary"
        );
    }

    async fn shutdown(&self) {
        info!("Initiating graceful shutdown...");
        self.headquarters.shutdown();
        self.network.shutdown().await;

        match encode_metrics() {
            Ok(text) => debug!(metrics = %text, "Final metrics"),
            Err(err) => warn!(error = %err, "Failed to encode metrics"),
        }
        info!("Shutdown complete");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let _telemetry =
        init_telemetry(TelemetryConfig::from_env()).context("Failed to initialize telemetry")?;

    let config = RuntimeConfig::load().context("Failed to load configuration")?;

    let runtime = GpsRuntime::start(config).await?;
    runtime.run_shipments().await;

    info!("Network is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
