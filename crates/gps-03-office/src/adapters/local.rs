//! In-process office endpoint.

use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use shared_bus::{EventChannel, EventSink, Lease};
use shared_types::{Coordinate, Receipt, RemoteError};

use crate::ports::{Injection, ObservedInjection, OfficeApi};
use crate::service::RoutingNode;

/// `OfficeApi` over a node in the same process.
///
/// Holds the node weakly: once the node is dropped or stops serving, every
/// call fails with `Unreachable`, the same way a call to a dead process
/// would.
pub struct LocalOffice {
    name: String,
    node: Weak<RoutingNode>,
}

impl LocalOffice {
    pub fn new(name: impl Into<String>, node: Weak<RoutingNode>) -> Self {
        Self {
            name: name.into(),
            node,
        }
    }

    fn node(&self) -> Result<Arc<RoutingNode>, RemoteError> {
        self.node
            .upgrade()
            .filter(|node| node.is_serving())
            .ok_or_else(|| RemoteError::unreachable(self.name.as_str()))
    }
}

#[async_trait]
impl OfficeApi for LocalOffice {
    async fn name(&self) -> Result<String, RemoteError> {
        Ok(self.node()?.name().to_string())
    }

    async fn location(&self) -> Result<Coordinate, RemoteError> {
        Ok(self.node()?.location())
    }

    async fn inject(&self, destination: Coordinate) -> Result<Injection, RemoteError> {
        self.node()?.inject(destination)
    }

    async fn inject_observed(
        &self,
        destination: Coordinate,
        sink: Arc<dyn EventSink>,
        lease: Duration,
    ) -> Result<ObservedInjection, RemoteError> {
        self.node()?.inject_observed(destination, sink, lease)
    }

    async fn forward(&self, receipt: Receipt, channel: EventChannel) -> Result<(), RemoteError> {
        self.node()?.forward(receipt, channel).await;
        Ok(())
    }

    async fn add_listener(
        &self,
        sink: Arc<dyn EventSink>,
        lease: Duration,
    ) -> Result<Lease, RemoteError> {
        Ok(self.node()?.global_channel().add_listener(sink, lease))
    }
}
