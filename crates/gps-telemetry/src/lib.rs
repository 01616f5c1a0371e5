//! # GPS Telemetry
//!
//! Observability for GPS offices.
//!
//! ## Components
//!
//! - **Logs:** `tracing` events rendered by `tracing-subscriber`, pretty for
//!   development or JSON for log shippers
//! - **Metrics:** Prometheus counters in a process-wide registry, rendered
//!   with `encode_metrics`
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gps_telemetry::{init_telemetry, TelemetryConfig};
//!
//! fn main() {
//!     let _guard = init_telemetry(TelemetryConfig::from_env()).expect("telemetry");
//!     // offices run here
//! }
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `OTEL_SERVICE_NAME` | `gps-mesh` | Service name attached to the startup log |
//! | `GPS_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `GPS_JSON_LOGS` | `false` | JSON formatted logs |
//! | `GPS_CONSOLE_OUTPUT` | `true` | Write logs to stdout at all |

mod config;
mod logging;
pub mod metrics;

pub use config::TelemetryConfig;
pub use logging::{init_logging, LoggingGuard};
pub use metrics::{
    encode_metrics, register_metrics, MetricsHandle, HOPS_FORWARDED, IN_FLIGHT_HOPS,
    NEIGHBOR_TABLE_UPDATES, PACKAGES_DELIVERED, PACKAGES_INJECTED, PACKAGES_LOST,
    ROUTING_EVENTS_PUBLISHED,
};

use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Failed to initialize Prometheus metrics: {0}")]
    MetricsInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Install logging and register metrics.
///
/// Returns a guard to hold for the lifetime of the process. Calling this a
/// second time fails with `TelemetryError::TracerInit` because a global
/// subscriber is already installed.
pub fn init_telemetry(config: TelemetryConfig) -> Result<TelemetryGuard, TelemetryError> {
    let metrics = register_metrics()?;
    let logging = init_logging(&config)?;

    tracing::info!(
        service = %config.service_name,
        json_logs = config.json_logs,
        "Telemetry initialized"
    );

    Ok(TelemetryGuard {
        _logging: logging,
        _metrics: metrics,
    })
}

/// Guard that keeps telemetry active.
pub struct TelemetryGuard {
    _logging: LoggingGuard,
    _metrics: MetricsHandle,
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        tracing::info!("Shutting down telemetry");
    }
}

/// Span scoped to one office.
///
/// ```rust,ignore
/// let _span = gps_telemetry::office_span!("forward", office = "A").entered();
/// ```
#[macro_export]
macro_rules! office_span {
    ($name:expr, $($field:tt)*) => {
        tracing::info_span!($name, $($field)*)
    };
}

/// Increment a counter, optionally selecting label values.
#[macro_export]
macro_rules! metric_inc {
    ($metric:expr) => {
        $metric.inc()
    };
    ($metric:expr, $labels:expr) => {
        $metric.with_label_values($labels).inc()
    };
}
