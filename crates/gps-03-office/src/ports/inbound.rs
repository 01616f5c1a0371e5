//! Inbound port: the office remote surface.

use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use shared_bus::{EventChannel, EventSink, Lease};
use shared_types::{Coordinate, Receipt, RemoteError};

/// A package accepted by an office.
#[derive(Debug, Clone)]
pub struct Injection {
    pub receipt: Receipt,
    /// Channel carrying every event of this package, at every hop.
    pub channel: EventChannel,
}

/// A package accepted by an office with a listener registered on its
/// channel before the first hop runs.
#[derive(Debug, Clone)]
pub struct ObservedInjection {
    pub receipt: Receipt,
    pub channel: EventChannel,
    pub lease: Lease,
}

/// Operations an office serves to remote callers.
///
/// Every call may fail with `RemoteError::Unreachable` when the office
/// process is gone, even if its directory entry is still present.
#[async_trait]
pub trait OfficeApi: Send + Sync {
    /// Directory name of the office.
    async fn name(&self) -> Result<String, RemoteError>;

    /// Fixed location of the office.
    async fn location(&self) -> Result<Coordinate, RemoteError>;

    /// Accept a new package bound for `destination` and start routing it.
    ///
    /// Returns as soon as the package is accepted; the first events may be
    /// published before the caller subscribes to the returned channel.
    async fn inject(&self, destination: Coordinate) -> Result<Injection, RemoteError>;

    /// Like `inject`, with `sink` registered on the package channel first so
    /// no event is missed.
    async fn inject_observed(
        &self,
        destination: Coordinate,
        sink: Arc<dyn EventSink>,
        lease: Duration,
    ) -> Result<ObservedInjection, RemoteError>;

    /// Handle one hop of an in-flight package.
    ///
    /// Completes once this office has decided the package's fate: delivered
    /// here, or handed to the next hop's worker.
    async fn forward(&self, receipt: Receipt, channel: EventChannel) -> Result<(), RemoteError>;

    /// Listen on this office's global channel (every package it handles).
    async fn add_listener(
        &self,
        sink: Arc<dyn EventSink>,
        lease: Duration,
    ) -> Result<Lease, RemoteError>;
}

/// Cloneable reference to an office, resolvable by name.
///
/// This is what the directory stores and what neighbor entries carry; it
/// never owns the office it points to.
#[derive(Clone)]
pub struct OfficeHandle {
    name: Arc<str>,
    api: Arc<dyn OfficeApi>,
}

impl OfficeHandle {
    pub fn new(name: impl Into<Arc<str>>, api: Arc<dyn OfficeApi>) -> Self {
        Self {
            name: name.into(),
            api,
        }
    }

    /// Name the handle was bound under.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Deref for OfficeHandle {
    type Target = dyn OfficeApi;

    fn deref(&self) -> &Self::Target {
        self.api.as_ref()
    }
}

impl fmt::Debug for OfficeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("OfficeHandle").field(&self.name).finish()
    }
}
