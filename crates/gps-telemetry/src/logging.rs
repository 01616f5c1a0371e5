//! Structured logging.
//!
//! Every log line carries consistent fields so offices can be filtered
//! apart in a shared sink:
//! - `office`: name of the office emitting the line
//! - `track_id`: package tracking number, when the line is about a package
//! - `peer`: name of the other office, when the line is about a neighbor

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::{TelemetryConfig, TelemetryError};

/// Marker that the global subscriber is installed.
pub struct LoggingGuard {
    _initialized: bool,
}

/// Install the global `tracing` subscriber.
///
/// # Errors
///
/// `TelemetryError::TracerInit` when the filter directive is invalid or a
/// global subscriber is already installed.
pub fn init_logging(config: &TelemetryConfig) -> Result<LoggingGuard, TelemetryError> {
    let env_filter = EnvFilter::try_new(&config.log_level)
        .or_else(|_| EnvFilter::try_from_default_env())
        .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;

    if !config.console_output {
        tracing_subscriber::registry()
            .with(env_filter)
            .try_init()
            .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;
    } else if config.json_logs {
        // JSON output for containers/production
        let json_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(json_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;
    } else {
        // Pretty output for development
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(true)
            .with_thread_ids(false)
            .with_file(false)
            .with_line_number(false)
            .with_ansi(true);

        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| TelemetryError::TracerInit(e.to_string()))?;
    }

    Ok(LoggingGuard { _initialized: true })
}

/// Log a package-related event with standard fields.
///
/// ```rust,ignore
/// log_package_event!(info, "A", track_id, "Package delivered", destination = %dest);
/// ```
#[macro_export]
macro_rules! log_package_event {
    ($level:ident, $office:expr, $track_id:expr, $msg:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            office = %$office,
            track_id = %$track_id,
            $($($field)*,)?
            $msg
        )
    };
}

/// Log a neighbor-related event with standard fields.
#[macro_export]
macro_rules! log_peer_event {
    ($level:ident, $office:expr, $msg:expr, $peer:expr $(, $($field:tt)*)?) => {
        tracing::$level!(
            office = %$office,
            peer = %$peer,
            $($($field)*,)?
            $msg
        )
    };
}
