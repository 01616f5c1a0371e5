//! Prometheus metrics for GPS offices.
//!
//! All metrics follow the naming convention: `gps_<area>_<metric>_<unit>`
//!
//! Counters are usable before `register_metrics` runs; registration only
//! makes them visible to `encode_metrics`.

use lazy_static::lazy_static;
use prometheus::{Counter, CounterVec, Encoder, Gauge, Opts, Registry, TextEncoder};
use std::sync::Arc;

use crate::TelemetryError;

lazy_static! {
    /// Global metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // =========================================================================
    // PACKAGE METRICS
    // =========================================================================

    /// Packages accepted from customers
    pub static ref PACKAGES_INJECTED: Counter = Counter::new(
        "gps_packages_injected_total",
        "Total number of packages injected by customers"
    ).expect("metric creation failed");

    /// Hops handed to a neighbor
    pub static ref HOPS_FORWARDED: Counter = Counter::new(
        "gps_hops_forwarded_total",
        "Total number of hops dispatched to a neighbor"
    ).expect("metric creation failed");

    /// Packages that reached their delivery office
    pub static ref PACKAGES_DELIVERED: Counter = Counter::new(
        "gps_packages_delivered_total",
        "Total number of packages delivered"
    ).expect("metric creation failed");

    /// Packages whose next hop could not be reached
    pub static ref PACKAGES_LOST: Counter = Counter::new(
        "gps_packages_lost_total",
        "Total number of packages lost on a failed hop"
    ).expect("metric creation failed");

    /// Hops currently running in dispatcher workers
    pub static ref IN_FLIGHT_HOPS: Gauge = Gauge::new(
        "gps_hops_in_flight",
        "Number of hops currently being dispatched"
    ).expect("metric creation failed");

    // =========================================================================
    // NEIGHBOR TABLE METRICS
    // =========================================================================

    /// Neighbor table changes
    pub static ref NEIGHBOR_TABLE_UPDATES: CounterVec = CounterVec::new(
        Opts::new("gps_neighbor_table_updates_total", "Neighbor table changes"),
        &["change"]  // change: bound/unbound/rebuild
    ).expect("metric creation failed");

    // =========================================================================
    // EVENT METRICS
    // =========================================================================

    /// Routing events published by offices
    pub static ref ROUTING_EVENTS_PUBLISHED: CounterVec = CounterVec::new(
        Opts::new("gps_routing_events_published_total", "Routing events published"),
        &["kind"]  // kind: arrived/departed/delivered/lost
    ).expect("metric creation failed");
}

/// Handle for the registered metrics
pub struct MetricsHandle {
    _registry: Arc<Registry>,
}

/// Register all metrics with the global registry.
///
/// # Errors
///
/// `TelemetryError::MetricsInit` if called twice in one process.
pub fn register_metrics() -> Result<MetricsHandle, TelemetryError> {
    let metrics: Vec<Box<dyn prometheus::core::Collector>> = vec![
        // Packages
        Box::new(PACKAGES_INJECTED.clone()),
        Box::new(HOPS_FORWARDED.clone()),
        Box::new(PACKAGES_DELIVERED.clone()),
        Box::new(PACKAGES_LOST.clone()),
        Box::new(IN_FLIGHT_HOPS.clone()),
        // Neighbor table
        Box::new(NEIGHBOR_TABLE_UPDATES.clone()),
        // Events
        Box::new(ROUTING_EVENTS_PUBLISHED.clone()),
    ];

    for metric in metrics {
        REGISTRY
            .register(metric)
            .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    }

    Ok(MetricsHandle {
        _registry: Arc::new(REGISTRY.clone()),
    })
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> Result<String, TelemetryError> {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder
        .encode(&metric_families, &mut buffer)
        .map_err(|e| TelemetryError::MetricsInit(e.to_string()))?;
    String::from_utf8(buffer).map_err(|e| TelemetryError::MetricsInit(e.to_string()))
}
