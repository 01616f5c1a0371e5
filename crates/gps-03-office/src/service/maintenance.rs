use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use futures::StreamExt;
use gps_01_neighbor_table::RebuildSummary;
use gps_02_directory::{RegistryEvent, RegistryEventKind, RegistryEventStream};
use gps_telemetry::{log_peer_event, metric_inc, NEIGHBOR_TABLE_UPDATES};
use shared_types::Coordinate;
use tracing::{debug, info, warn};

use super::core::RoutingNode;
use crate::domain::OfficeError;
use crate::ports::OfficeHandle;

impl RoutingNode {
    /// Replace the neighbor table from a full directory listing.
    ///
    /// Peers that vanish or stop answering mid-rebuild are skipped.
    ///
    /// # Errors
    ///
    /// `Directory` if the listing fails; the table is left untouched.
    pub async fn rebuild_neighbors(&self) -> Result<RebuildSummary, OfficeError> {
        let names = self
            .context
            .directory
            .list(Some(&self.config.type_name))
            .await?;

        let lookups = names
            .iter()
            .filter(|name| name.as_str() != self.name())
            .map(|name| async move { (name.clone(), self.resolve_peer(name).await) });
        let mut resolved: HashMap<String, (Coordinate, OfficeHandle)> = join_all(lookups)
            .await
            .into_iter()
            .filter_map(|(name, peer)| peer.map(|peer| (name, peer)))
            .collect();

        let summary = self
            .table
            .lock()
            .rebuild(&names, |name| resolved.remove(name));

        metric_inc!(NEIGHBOR_TABLE_UPDATES, &["rebuild"]);
        info!(
            office = %self.name(),
            candidates = summary.candidates,
            unresolved = summary.unresolved,
            kept = summary.kept,
            neighbors = ?self.neighbor_names(),
            "Neighbor table rebuilt"
        );
        Ok(summary)
    }

    /// Look up `name` and ask it for its location.
    async fn resolve_peer(&self, name: &str) -> Option<(Coordinate, OfficeHandle)> {
        let handle = match self.context.directory.lookup(name).await {
            Ok(handle) => handle,
            Err(error) => {
                log_peer_event!(debug, self.name(), "Peer lookup failed", name, %error);
                return None;
            }
        };
        match handle.location().await {
            Ok(location) => Some((location, handle)),
            Err(error) => {
                log_peer_event!(debug, self.name(), "Peer did not answer", name, %error);
                None
            }
        }
    }

    /// Consume the directory feed on a background task until shutdown.
    ///
    /// Events are handled in arrival order, one at a time, so a rebind is
    /// never overtaken by the unbind that preceded it.
    pub(super) fn spawn_watcher(self: &Arc<Self>, mut feed: RegistryEventStream) {
        let node = Arc::downgrade(self);
        let token = self.shutdown.clone();
        let office = self.name().to_string();

        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    () = token.cancelled() => break,
                    event = feed.next() => event,
                };
                let Some(event) = event else {
                    warn!(office = %office, "Directory feed closed, neighbor table no longer updates");
                    break;
                };
                let Some(node) = node.upgrade() else {
                    break;
                };
                node.on_registry_event(event).await;
            }
            debug!(office = %office, "Directory watcher stopped");
        });
    }

    async fn on_registry_event(&self, event: RegistryEvent) {
        if event.name == self.name() {
            return;
        }
        match event.kind {
            RegistryEventKind::Bound => self.on_peer_bound(&event.name).await,
            RegistryEventKind::Unbound => self.on_peer_unbound(&event.name).await,
        }
    }

    async fn on_peer_bound(&self, name: &str) {
        let Some((location, handle)) = self.resolve_peer(name).await else {
            return;
        };
        let outcome = self.table.lock().on_peer_bound(name, handle, location);

        match outcome {
            Ok(outcome) if outcome.changed() => {
                metric_inc!(NEIGHBOR_TABLE_UPDATES, &["bound"]);
                log_peer_event!(
                    info,
                    self.name(),
                    "Neighbor table updated",
                    name,
                    outcome = ?outcome,
                    neighbors = ?self.neighbor_names()
                );
            }
            Ok(_) => {
                log_peer_event!(debug, self.name(), "Peer too far to become a neighbor", name);
            }
            Err(error) => {
                log_peer_event!(warn, self.name(), "Peer ignored", name, %error);
            }
        }
    }

    async fn on_peer_unbound(&self, name: &str) {
        let outcome = self.table.lock().on_peer_unbound(name);
        if outcome.removed.is_none() {
            return;
        }

        metric_inc!(NEIGHBOR_TABLE_UPDATES, &["unbound"]);
        log_peer_event!(
            info,
            self.name(),
            "Neighbor left",
            name,
            neighbors = ?self.neighbor_names()
        );

        if !outcome.needs_backfill() {
            return;
        }
        let candidates = match self.context.directory.list(Some(&self.config.type_name)).await {
            Ok(names) => names.iter().filter(|peer| peer.as_str() != self.name()).count(),
            Err(error) => {
                warn!(office = %self.name(), %error, "Backfill listing failed");
                return;
            }
        };
        let held = self.table.lock().len();
        if candidates > held {
            if let Err(error) = self.rebuild_neighbors().await {
                warn!(office = %self.name(), %error, "Backfill rebuild failed");
            }
        }
    }

    /// Rebuild on a fixed period, covering notifications the feed missed.
    pub(super) fn spawn_refresh(self: &Arc<Self>, interval: Duration) {
        let node = Arc::downgrade(self);
        let token = self.shutdown.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(node) = node.upgrade() else {
                    break;
                };
                if let Err(error) = node.rebuild_neighbors().await {
                    warn!(office = %node.name(), %error, "Periodic neighbor refresh failed");
                }
            }
        });
    }
}
