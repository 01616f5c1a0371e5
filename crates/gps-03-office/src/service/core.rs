use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};

use gps_01_neighbor_table::NeighborTable;
use gps_02_directory::{DirectoryError, RegistryEventFilter};
use parking_lot::Mutex;
use shared_bus::{ChannelConfig, EventChannel};
use shared_types::{Coordinate, NodeIdentity, TrackIdGenerator};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::dispatcher::HopDispatcher;
use crate::adapters::LocalOffice;
use crate::config::OfficeConfig;
use crate::domain::OfficeError;
use crate::ports::{OfficeDirectory, OfficeHandle};

/// Resources shared by every office of one network.
#[derive(Clone)]
pub struct OfficeContext {
    /// Directory offices bind in and watch
    pub directory: Arc<OfficeDirectory>,
    /// Track number source shared so numbers stay unique network-wide
    pub track_ids: Arc<TrackIdGenerator>,
}

impl OfficeContext {
    /// Build the context a process starts its offices from. Clones share the
    /// directory and the track number source.
    pub fn new(directory: Arc<OfficeDirectory>) -> Self {
        Self {
            directory,
            track_ids: Arc::new(TrackIdGenerator::new()),
        }
    }
}

/// Point-in-time counters of one office.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficeStats {
    pub name: String,
    pub neighbors: Vec<String>,
    /// Hops handled here (one per `Arrived`)
    pub packages_handled: u64,
    pub delivered: u64,
    pub forwarded: u64,
    pub lost: u64,
    pub in_flight_hops: usize,
    pub global_listeners: usize,
}

#[derive(Debug, Default)]
pub(super) struct OfficeCounters {
    pub(super) handled: AtomicU64,
    pub(super) delivered: AtomicU64,
    pub(super) forwarded: AtomicU64,
    pub(super) lost: AtomicU64,
}

/// One office: a neighbor table kept current from the directory, a global
/// event channel and a bounded hop dispatcher.
///
/// Built with [`RoutingNode::start`], which binds it in the directory. The
/// node reaches itself through the `OfficeHandle` it publishes, so callers
/// hold it in an `Arc` for as long as it serves.
pub struct RoutingNode {
    pub(super) identity: NodeIdentity,
    pub(super) config: OfficeConfig,
    pub(super) context: OfficeContext,
    pub(super) table: Mutex<NeighborTable<OfficeHandle>>,
    pub(super) global: EventChannel,
    pub(super) dispatcher: HopDispatcher,
    pub(super) counters: OfficeCounters,
    pub(super) serving: AtomicBool,
    pub(super) shutdown: CancellationToken,
    sweeper: Mutex<Option<JoinHandle<()>>>,
    handle: OfficeHandle,
}

impl RoutingNode {
    /// Create the office, bind it and build its initial neighbor table.
    ///
    /// The directory feed is opened before binding so no peer that binds
    /// concurrently is missed.
    ///
    /// # Errors
    ///
    /// - `InvalidConfig` if `config` does not validate
    /// - `AlreadyBound` if another office holds the name
    /// - `Directory` if the directory cannot be reached
    pub async fn start(config: OfficeConfig, context: OfficeContext) -> Result<Arc<Self>, OfficeError> {
        config.validate()?;

        let name = config.name.clone();
        let type_name = config.type_name.clone();
        let identity = config.identity();
        let global = EventChannel::with_config(ChannelConfig {
            name: format!("office-{name}"),
            default_lease: config.listener_lease,
        });

        let node = Arc::new_cyclic(|weak: &Weak<RoutingNode>| {
            let api = Arc::new(LocalOffice::new(name.clone(), weak.clone()));
            Self {
                table: Mutex::new(NeighborTable::new(identity.clone(), config.table_config())),
                dispatcher: HopDispatcher::new(config.worker_pool_size),
                handle: OfficeHandle::new(name.clone(), api),
                identity,
                config,
                context,
                global,
                counters: OfficeCounters::default(),
                serving: AtomicBool::new(true),
                shutdown: CancellationToken::new(),
                sweeper: Mutex::new(None),
            }
        });

        let filter = RegistryEventFilter::new()
            .report_type(type_name.as_str())
            .report_bound()
            .report_unbound();
        let feed = match node.context.directory.subscribe(filter).await {
            Ok(feed) => feed,
            Err(error) => {
                node.stop();
                return Err(error.into());
            }
        };

        match node
            .context
            .directory
            .bind(&name, &type_name, node.handle.clone())
            .await
        {
            Ok(()) => {}
            Err(DirectoryError::AlreadyBound { name }) => {
                node.stop();
                return Err(OfficeError::AlreadyBound { name });
            }
            Err(error) => {
                node.stop();
                return Err(error.into());
            }
        }

        if let Err(error) = node.rebuild_neighbors().await {
            warn!(office = %name, %error, "Initial neighbor discovery failed");
        }

        node.spawn_watcher(feed);
        if let Some(interval) = node.config.refresh_interval {
            node.spawn_refresh(interval);
        }
        if let Some(interval) = node.config.sweep_interval {
            *node.sweeper.lock() = Some(node.global.spawn_sweeper(interval));
        }

        info!(
            office = %name,
            location = %node.identity.location,
            neighbors = ?node.neighbor_names(),
            "Office started"
        );
        Ok(node)
    }

    /// Stop serving and release the name.
    ///
    /// Hops already holding a worker finish; queued ones are dropped.
    /// Unbinding a name that is already gone is not an error.
    ///
    /// # Errors
    ///
    /// `Directory` if the directory cannot be reached.
    pub async fn shutdown(&self) -> Result<(), OfficeError> {
        self.stop();
        match self.context.directory.unbind(self.name()).await {
            Ok(()) | Err(DirectoryError::NotBound { .. }) => {
                info!(office = %self.name(), "Office shut down");
                Ok(())
            }
            Err(error) => Err(error.into()),
        }
    }

    /// Stop serving without unbinding, as if the process died.
    ///
    /// The directory entry stays; every call through it fails with
    /// `Unreachable`.
    pub fn halt(&self) {
        if self.stop() {
            warn!(office = %self.name(), "Office halted while still bound");
        }
    }

    /// Returns whether the node was serving.
    fn stop(&self) -> bool {
        let was_serving = self.serving.swap(false, Ordering::SeqCst);
        self.shutdown.cancel();
        self.dispatcher.close();
        if let Some(sweeper) = self.sweeper.lock().take() {
            sweeper.abort();
        }
        was_serving
    }

    pub fn name(&self) -> &str {
        &self.identity.name
    }

    pub fn identity(&self) -> &NodeIdentity {
        &self.identity
    }

    pub fn location(&self) -> Coordinate {
        self.identity.location
    }

    pub fn config(&self) -> &OfficeConfig {
        &self.config
    }

    /// Handle other offices and customers reach this node through.
    pub fn handle(&self) -> OfficeHandle {
        self.handle.clone()
    }

    /// Channel receiving every event of every package handled here.
    pub fn global_channel(&self) -> &EventChannel {
        &self.global
    }

    pub fn is_serving(&self) -> bool {
        self.serving.load(Ordering::SeqCst)
    }

    /// Current neighbors, nearest first.
    pub fn neighbors(&self) -> Vec<NodeIdentity> {
        self.table
            .lock()
            .entries()
            .iter()
            .map(|entry| entry.identity.clone())
            .collect()
    }

    pub fn neighbor_names(&self) -> Vec<String> {
        self.table
            .lock()
            .names()
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    pub fn stats(&self) -> OfficeStats {
        OfficeStats {
            name: self.name().to_string(),
            neighbors: self.neighbor_names(),
            packages_handled: self.counters.handled.load(Ordering::Relaxed),
            delivered: self.counters.delivered.load(Ordering::Relaxed),
            forwarded: self.counters.forwarded.load(Ordering::Relaxed),
            lost: self.counters.lost.load(Ordering::Relaxed),
            in_flight_hops: self.dispatcher.in_flight(),
            global_listeners: self.global.listener_count(),
        }
    }

    /// Wait until every hop this node has dispatched so far has finished.
    pub async fn wait_idle(&self) {
        self.dispatcher.wait_idle().await;
    }
}

impl std::fmt::Debug for RoutingNode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoutingNode")
            .field("identity", &self.identity)
            .field("serving", &self.is_serving())
            .field("neighbors", &self.neighbor_names())
            .finish_non_exhaustive()
    }
}
