//! # Headquarters
//!
//! Network-wide observer. Headquarters listens on the global channel of
//! every bound office, including offices that bind later, and folds every
//! event it receives into a `PackageTracker`.
//!
//! Leases are renewed on a fixed period; a lease found lapsed is replaced
//! by a fresh registration. Each renewal round also prunes packages that
//! settled longer ago than the retention window.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use gps_02_directory::{DirectoryError, RegistryEventFilter, RegistryEventKind, RegistryEventStream};
use gps_03_office::{Observation, OfficeDirectory, PackageTracker, TrackedPackage};
use parking_lot::Mutex;
use shared_bus::{EventSink, Lease};
use shared_types::{RemoteError, RoutingEvent, TrackId, OFFICE_TYPE};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Shortest renewal period the renewal task will run with.
pub const MIN_RENEW_PERIOD: Duration = Duration::from_millis(10);

/// How long settled packages stay queryable by default.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(300);

/// Headquarters settings.
#[derive(Debug, Clone)]
pub struct HeadquartersConfig {
    /// Registry type of the offices to monitor
    pub type_name: String,
    /// Lease requested on each office
    pub lease: Duration,
    /// Renewal period; must be shorter than `lease`. Raised to
    /// `MIN_RENEW_PERIOD` if smaller.
    pub renew_every: Duration,
    /// How long a delivered or lost package stays in the tracker
    pub retention: Duration,
}

impl HeadquartersConfig {
    pub fn with_lease(lease: Duration) -> Self {
        Self {
            type_name: OFFICE_TYPE.to_string(),
            lease,
            renew_every: (lease / 3).max(MIN_RENEW_PERIOD),
            retention: DEFAULT_RETENTION,
        }
    }

    #[must_use]
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }
}

impl Default for HeadquartersConfig {
    fn default() -> Self {
        Self::with_lease(shared_bus::DEFAULT_LEASE)
    }
}

/// Tracker counts at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeadquartersSummary {
    pub in_flight: usize,
    pub delivered: usize,
    pub lost: usize,
    /// Packages currently held, settled ones included
    pub tracked: usize,
}

/// Listener registered on one office's global channel.
struct OfficeListener {
    office: String,
    /// Tracker stream key, unique per registration so a fresh lease starts
    /// a fresh sequence.
    stream: String,
    tracker: Arc<Mutex<PackageTracker>>,
    /// Set once the registration is replaced or dropped; events still
    /// queued for it are discarded.
    retired: Arc<AtomicBool>,
}

#[async_trait]
impl EventSink for OfficeListener {
    async fn on_event(&self, sequence: u64, event: RoutingEvent) -> Result<(), RemoteError> {
        if self.retired.load(Ordering::Acquire) {
            return Ok(());
        }
        let observation = self.tracker.lock().record(&self.stream, sequence, &event);
        match observation {
            Observation::Progress | Observation::Terminal => {
                info!(office = %self.office, track_id = %event.track_id(), "{event}");
            }
            Observation::AfterTerminal | Observation::Stale => {
                debug!(office = %self.office, sequence, ?observation, "Event ignored");
            }
        }
        Ok(())
    }
}

/// One live listener registration on an office.
#[derive(Clone)]
struct Registration {
    lease: Lease,
    stream: String,
    retired: Arc<AtomicBool>,
}

/// The network monitor.
pub struct Headquarters {
    directory: Arc<OfficeDirectory>,
    config: HeadquartersConfig,
    tracker: Arc<Mutex<PackageTracker>>,
    registrations_by_office: Mutex<HashMap<String, Registration>>,
    registrations: AtomicU64,
    shutdown: CancellationToken,
}

impl Headquarters {
    /// Attach to every bound office and keep following the directory.
    ///
    /// # Errors
    ///
    /// The directory could not be subscribed to or listed.
    pub async fn start(
        directory: Arc<OfficeDirectory>,
        config: HeadquartersConfig,
    ) -> Result<Arc<Self>, DirectoryError> {
        let filter = RegistryEventFilter::new()
            .report_type(config.type_name.as_str())
            .report_bound()
            .report_unbound();
        let feed = directory.subscribe(filter).await?;
        let offices = directory.list(Some(&config.type_name)).await?;

        let headquarters = Arc::new(Self {
            directory,
            config,
            tracker: Arc::new(Mutex::new(PackageTracker::new())),
            registrations_by_office: Mutex::new(HashMap::new()),
            registrations: AtomicU64::new(0),
            shutdown: CancellationToken::new(),
        });

        for office in &offices {
            headquarters.attach(office).await;
        }
        headquarters.spawn_watcher(feed);
        headquarters.spawn_renewal();

        info!(offices = offices.len(), "Headquarters monitoring");
        Ok(headquarters)
    }

    /// Register a listener on `office`'s global channel, replacing any
    /// earlier registration. Returns whether it succeeded.
    pub async fn attach(&self, office: &str) -> bool {
        let handle = match self.directory.lookup(office).await {
            Ok(handle) => handle,
            Err(error) => {
                warn!(office, %error, "Office lookup failed");
                return false;
            }
        };

        let number = self.registrations.fetch_add(1, Ordering::Relaxed);
        let stream = format!("{office}#{number}");
        let retired = Arc::new(AtomicBool::new(false));
        let sink = Arc::new(OfficeListener {
            office: office.to_string(),
            stream: stream.clone(),
            tracker: Arc::clone(&self.tracker),
            retired: Arc::clone(&retired),
        });

        match handle.add_listener(sink, self.config.lease).await {
            Ok(lease) => {
                let registration = Registration {
                    lease,
                    stream,
                    retired,
                };
                let previous = self
                    .registrations_by_office
                    .lock()
                    .insert(office.to_string(), registration);
                if let Some(previous) = previous {
                    self.retire(previous);
                }
                debug!(office, "Listening on office");
                true
            }
            Err(error) => {
                warn!(office, %error, "Office refused listener");
                false
            }
        }
    }

    /// Drop the registration on `office`, if any.
    pub fn detach(&self, office: &str) {
        let registration = self.registrations_by_office.lock().remove(office);
        if let Some(registration) = registration {
            self.retire(registration);
            debug!(office, "Stopped listening on office");
        }
    }

    /// Cancel a registration and drop its sequence cursor.
    fn retire(&self, registration: Registration) {
        registration.retired.store(true, Ordering::Release);
        // Already gone is fine: the lease may have lapsed.
        let _ = registration.lease.cancel();
        self.tracker.lock().forget_stream(&registration.stream);
    }

    /// Renew every lease; re-register where one has lapsed, then prune
    /// settled packages past retention. Returns how many leases were renewed
    /// in place.
    pub async fn renew_all(&self) -> usize {
        let leases: Vec<(String, Lease)> = self
            .registrations_by_office
            .lock()
            .iter()
            .map(|(office, registration)| (office.clone(), registration.lease.clone()))
            .collect();

        let mut renewed = 0;
        for (office, lease) in leases {
            match lease.renew(self.config.lease) {
                Ok(()) => renewed += 1,
                Err(error) => {
                    info!(office = %office, %error, "Lease lapsed, registering again");
                    if !self.attach(&office).await {
                        self.detach(&office);
                    }
                }
            }
        }

        let pruned = self.prune();
        if pruned > 0 {
            debug!(pruned, "Settled packages pruned");
        }
        renewed
    }

    /// Drop packages that settled longer ago than the retention window.
    pub fn prune(&self) -> usize {
        self.tracker.lock().prune_settled(self.config.retention)
    }

    /// Offices currently monitored, sorted.
    pub fn monitored(&self) -> Vec<String> {
        let mut offices: Vec<String> = self
            .registrations_by_office
            .lock()
            .keys()
            .cloned()
            .collect();
        offices.sort_unstable();
        offices
    }

    pub fn package(&self, track_id: TrackId) -> Option<TrackedPackage> {
        self.tracker.lock().get(track_id).cloned()
    }

    pub fn summary(&self) -> HeadquartersSummary {
        let tracker = self.tracker.lock();
        HeadquartersSummary {
            in_flight: tracker.in_flight(),
            delivered: tracker.delivered(),
            lost: tracker.lost(),
            tracked: tracker.len(),
        }
    }

    /// Stop following the directory and release every lease.
    pub fn shutdown(&self) {
        self.shutdown.cancel();
        let registrations: Vec<Registration> = self
            .registrations_by_office
            .lock()
            .drain()
            .map(|(_, registration)| registration)
            .collect();
        for registration in registrations {
            self.retire(registration);
        }
        info!("Headquarters stopped");
    }

    fn spawn_watcher(self: &Arc<Self>, mut feed: RegistryEventStream) {
        let headquarters = Arc::downgrade(self);
        let token = self.shutdown.clone();
        tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    () = token.cancelled() => break,
                    event = feed.next() => event,
                };
                let (Some(event), Some(headquarters)) = (event, headquarters.upgrade()) else {
                    break;
                };
                match event.kind {
                    RegistryEventKind::Bound => {
                        headquarters.attach(&event.name).await;
                    }
                    RegistryEventKind::Unbound => headquarters.detach(&event.name),
                }
            }
        });
    }

    fn spawn_renewal(self: &Arc<Self>) {
        let headquarters = Arc::downgrade(self);
        let token = self.shutdown.clone();
        let period = self.config.renew_every.max(MIN_RENEW_PERIOD);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.tick().await;
            loop {
                tokio::select! {
                    () = token.cancelled() => break,
                    _ = ticker.tick() => {}
                }
                let Some(headquarters) = headquarters.upgrade() else {
                    break;
                };
                let renewed = headquarters.renew_all().await;
                debug!(renewed, "Headquarters leases renewed");
            }
        });
    }
}
