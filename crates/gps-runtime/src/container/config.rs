//! # Runtime Configuration
//!
//! The office network, per-office tuning and demo shipments, read from a
//! TOML file and then overridden from the environment.
//!
//! ```toml
//! inspection_delay_ms = 3000
//! neighbor_capacity = 3
//!
//! [[offices]]
//! name = "A"
//! x = 0.0
//! y = 0.0
//!
//! [[shipments]]
//! origin = "A"
//! x = 20.0
//! y = 0.0
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use gps_03_office::{OfficeConfig, DEFAULT_WORKER_POOL_SIZE};
use serde::Deserialize;
use shared_types::Coordinate;
use thiserror::Error;

/// Environment variable naming the TOML file.
pub const CONFIG_PATH_VAR: &str = "GPS_CONFIG";

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value {value:?} for {var}")]
    InvalidOverride { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// One office to start.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OfficeEntry {
    pub name: String,
    pub x: f64,
    pub y: f64,
}

impl OfficeEntry {
    pub fn location(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }
}

/// One package to send once the network is up.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ShipmentEntry {
    /// Office the package is handed to
    pub origin: String,
    pub x: f64,
    pub y: f64,
}

impl ShipmentEntry {
    pub fn destination(&self) -> Coordinate {
        Coordinate::new(self.x, self.y)
    }
}

/// Complete runtime configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Per-hop inspection pause in milliseconds.
    pub inspection_delay_ms: u64,
    /// Neighbors kept per office.
    pub neighbor_capacity: usize,
    /// Concurrent hop dispatches per office.
    pub worker_pool_size: usize,
    /// Lease granted to Headquarters and Customer listeners, in seconds.
    pub listener_lease_secs: u64,
    /// Periodic neighbor rebuild in milliseconds; 0 disables it.
    pub refresh_interval_ms: u64,
    /// How long a Customer waits for the next event before giving up, in
    /// seconds.
    pub shipment_patience_secs: u64,
    pub offices: Vec<OfficeEntry>,
    pub shipments: Vec<ShipmentEntry>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            inspection_delay_ms: 3000,
            neighbor_capacity: 3,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            listener_lease_secs: 60,
            refresh_interval_ms: 0,
            shipment_patience_secs: 30,
            offices: Vec::new(),
            shipments: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Small demo network used when no file is given.
    pub fn demo() -> Self {
        let office = |name: &str, x: f64, y: f64| OfficeEntry {
            name: name.to_string(),
            x,
            y,
        };
        Self {
            offices: vec![
                office("A", 0.0, 0.0),
                office("B", 10.0, 0.0),
                office("C", 20.0, 0.0),
                office("D", 10.0, 10.0),
            ],
            shipments: vec![ShipmentEntry {
                origin: "A".to_string(),
                x: 20.0,
                y: 0.0,
            }],
            ..Self::default()
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Load from `GPS_CONFIG` (or the demo network), apply environment
    /// overrides, and validate.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os(CONFIG_PATH_VAR) {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::demo(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Apply `GPS_INSPECTION_DELAY_MS`, `GPS_NEIGHBOR_CAPACITY` and
    /// `GPS_WORKER_POOL_SIZE` as read through `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = parse_override(&lookup, "GPS_INSPECTION_DELAY_MS")? {
            self.inspection_delay_ms = value;
        }
        if let Some(value) = parse_override(&lookup, "GPS_NEIGHBOR_CAPACITY")? {
            self.neighbor_capacity = value;
        }
        if let Some(value) = parse_override(&lookup, "GPS_WORKER_POOL_SIZE")? {
            self.worker_pool_size = value;
        }
        Ok(())
    }

    /// Check names are unique and every shipment starts at a known office.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut names: Vec<&str> = self.offices.iter().map(|office| office.name.as_str()).collect();
        names.sort_unstable();
        if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
            return Err(ConfigError::Invalid(format!(
                "office {} is listed twice",
                pair[0]
            )));
        }
        if let Some(shipment) = self
            .shipments
            .iter()
            .find(|shipment| names.binary_search(&shipment.origin.as_str()).is_err())
        {
            return Err(ConfigError::Invalid(format!(
                "shipment origin {} is not a configured office",
                shipment.origin
            )));
        }
        if self.listener_lease_secs == 0 {
            return Err(ConfigError::Invalid(
                "listener_lease_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    pub fn inspection_delay(&self) -> Duration {
        Duration::from_millis(self.inspection_delay_ms)
    }

    pub fn listener_lease(&self) -> Duration {
        Duration::from_secs(self.listener_lease_secs)
    }

    pub fn shipment_patience(&self) -> Duration {
        Duration::from_secs(self.shipment_patience_secs)
    }

    /// Office configuration for `entry` with the shared tuning applied.
    pub fn office_config(&self, entry: &OfficeEntry) -> OfficeConfig {
        let config = OfficeConfig::new(entry.name.clone(), entry.location())
            .with_neighbor_capacity(self.neighbor_capacity)
            .with_inspection_delay(self.inspection_delay())
            .with_worker_pool_size(self.worker_pool_size)
            .with_listener_lease(self.listener_lease());
        if self.refresh_interval_ms > 0 {
            config.with_refresh_interval(Duration::from_millis(self.refresh_interval_ms))
        } else {
            config
        }
    }
}

fn parse_override<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    let Some(value) = lookup(var) else {
        return Ok(None);
    };
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| ConfigError::InvalidOverride { var, value })
}
