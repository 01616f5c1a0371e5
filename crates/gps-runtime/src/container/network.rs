use std::collections::BTreeMap;
use std::sync::Arc;

use gps_02_directory::InMemoryDirectory;
use gps_03_office::{
    OfficeConfig, OfficeContext, OfficeDirectory, OfficeError, OfficeHandle, RoutingNode,
};
use parking_lot::RwLock;
use tracing::{info, instrument, warn};

use super::config::RuntimeConfig;

/// Directory plus the offices started against it.
pub struct OfficeNetwork {
    directory: InMemoryDirectory<OfficeHandle>,
    context: OfficeContext,
    offices: RwLock<BTreeMap<String, Arc<RoutingNode>>>,
}

impl OfficeNetwork {
    /// Empty network over a fresh in-memory directory.
    pub fn new() -> Self {
        let directory = InMemoryDirectory::new();
        let shared: Arc<OfficeDirectory> = Arc::new(directory.clone());
        Self {
            context: OfficeContext::new(shared),
            directory,
            offices: RwLock::new(BTreeMap::new()),
        }
    }

    /// Start every office listed in `config`.
    ///
    /// Stops at the first office that fails to start; offices already
    /// started keep running.
    #[instrument(skip_all, fields(offices = config.offices.len()))]
    pub async fn start(config: &RuntimeConfig) -> Result<Self, OfficeError> {
        let network = Self::new();
        for entry in &config.offices {
            network.launch(config.office_config(entry)).await?;
        }
        info!(offices = network.len(), "Office network up");
        Ok(network)
    }

    /// Start one more office.
    pub async fn launch(
        &self,
        config: OfficeConfig,
    ) -> Result<Arc<RoutingNode>, OfficeError> {
        let node = RoutingNode::start(config, self.context.clone()).await?;
        self.offices
            .write()
            .insert(node.name().to_string(), Arc::clone(&node));
        Ok(node)
    }

    /// Shut one office down and forget it.
    pub async fn retire(&self, name: &str) -> Result<bool, OfficeError> {
        let removed = self.offices.write().remove(name);
        match removed {
            Some(node) => {
                node.shutdown().await?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn office(&self, name: &str) -> Option<Arc<RoutingNode>> {
        self.offices.read().get(name).cloned()
    }

    pub fn names(&self) -> Vec<String> {
        self.offices.read().keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.offices.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.offices.read().is_empty()
    }

    /// Directory the offices are bound in.
    pub fn directory(&self) -> Arc<OfficeDirectory> {
        Arc::clone(&self.context.directory)
    }

    /// Concrete directory, for outage simulation.
    pub fn registry(&self) -> &InMemoryDirectory<OfficeHandle> {
        &self.directory
    }

    /// Shut every office down. Failures are logged, not returned.
    pub async fn shutdown(&self) {
        let offices: Vec<Arc<RoutingNode>> = {
            let mut offices = self.offices.write();
            std::mem::take(&mut *offices).into_values().collect()
        };
        for node in offices {
            if let Err(error) = node.shutdown().await {
                warn!(office = %node.name(), %error, "Office shutdown failed");
            }
        }
        info!("Office network down");
    }
}

impl Default for OfficeNetwork {
    fn default() -> Self {
        Self::new()
    }
}
