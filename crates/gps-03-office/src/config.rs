//! Office configuration.

use std::time::Duration;

use gps_01_neighbor_table::{NeighborTableConfig, DEFAULT_CAPACITY};
use shared_types::{Coordinate, NodeIdentity, OFFICE_TYPE};

use crate::domain::OfficeError;

/// Pause at each hop representing package inspection.
pub const DEFAULT_INSPECTION_DELAY: Duration = Duration::from_secs(3);

/// Concurrent hop dispatches per office.
pub const DEFAULT_WORKER_POOL_SIZE: usize = 64;

/// Office configuration.
#[derive(Debug, Clone)]
pub struct OfficeConfig {
    /// Unique directory name
    pub name: String,
    /// Fixed location
    pub location: Coordinate,
    /// Registry type the office binds under and watches for
    pub type_name: String,
    /// Neighbors kept (K)
    pub neighbor_capacity: usize,
    /// Pause at each hop before the routing decision
    pub inspection_delay: Duration,
    /// Default lease on the global channel
    pub listener_lease: Duration,
    /// Concurrent hop dispatches
    pub worker_pool_size: usize,
    /// Periodic full neighbor rebuild, compensating for missed notifications
    pub refresh_interval: Option<Duration>,
    /// Eager purge of lapsed leases on the global channel
    pub sweep_interval: Option<Duration>,
}

impl OfficeConfig {
    /// Defaults for an office named `name` at `location`.
    pub fn new(name: impl Into<String>, location: Coordinate) -> Self {
        Self {
            name: name.into(),
            location,
            type_name: OFFICE_TYPE.to_string(),
            neighbor_capacity: DEFAULT_CAPACITY,
            inspection_delay: DEFAULT_INSPECTION_DELAY,
            listener_lease: shared_bus::DEFAULT_LEASE,
            worker_pool_size: DEFAULT_WORKER_POOL_SIZE,
            refresh_interval: None,
            sweep_interval: None,
        }
    }

    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    #[must_use]
    pub fn with_neighbor_capacity(mut self, capacity: usize) -> Self {
        self.neighbor_capacity = capacity;
        self
    }

    #[must_use]
    pub fn with_inspection_delay(mut self, delay: Duration) -> Self {
        self.inspection_delay = delay;
        self
    }

    #[must_use]
    pub fn with_listener_lease(mut self, lease: Duration) -> Self {
        self.listener_lease = lease;
        self
    }

    #[must_use]
    pub fn with_worker_pool_size(mut self, size: usize) -> Self {
        self.worker_pool_size = size;
        self
    }

    #[must_use]
    pub fn with_refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = Some(interval);
        self
    }

    #[must_use]
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = Some(interval);
        self
    }

    /// Identity derived from name and location.
    pub fn identity(&self) -> NodeIdentity {
        NodeIdentity::new(self.name.clone(), self.location)
    }

    pub fn table_config(&self) -> NeighborTableConfig {
        NeighborTableConfig::with_capacity(self.neighbor_capacity)
    }

    /// Check the configuration is usable.
    ///
    /// # Errors
    ///
    /// `OfficeError::InvalidConfig` describing the first problem found.
    pub fn validate(&self) -> Result<(), OfficeError> {
        if self.name.trim().is_empty() {
            return Err(OfficeError::InvalidConfig("name must not be empty".into()));
        }
        if !self.location.is_finite() {
            return Err(OfficeError::InvalidConfig(format!(
                "location of {} must be finite",
                self.name
            )));
        }
        if self.type_name.is_empty() {
            return Err(OfficeError::InvalidConfig(
                "type_name must not be empty".into(),
            ));
        }
        if self.neighbor_capacity == 0 {
            return Err(OfficeError::InvalidConfig(
                "neighbor_capacity must be at least 1".into(),
            ));
        }
        if self.worker_pool_size == 0 {
            return Err(OfficeError::InvalidConfig(
                "worker_pool_size must be at least 1".into(),
            ));
        }
        if self.listener_lease.is_zero() {
            return Err(OfficeError::InvalidConfig(
                "listener_lease must be positive".into(),
            ));
        }
        if matches!(self.refresh_interval, Some(interval) if interval.is_zero())
            || matches!(self.sweep_interval, Some(interval) if interval.is_zero())
        {
            return Err(OfficeError::InvalidConfig(
                "background intervals must be positive".into(),
            ));
        }
        Ok(())
    }
}
