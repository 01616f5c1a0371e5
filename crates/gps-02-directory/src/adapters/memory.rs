//! In-process directory.
//!
//! Holds bindings in a sorted map and fans change notifications out over a
//! `tokio::sync::broadcast` channel. Clones share the same registry, so
//! every office in one process can be handed its own copy.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use tokio::sync::broadcast;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt;
use tracing::{debug, warn};

use crate::domain::{DirectoryError, RegistryEvent, RegistryEventFilter};
use crate::ports::{Directory, RegistryEventStream};

/// Buffered notifications per feed before a slow feed starts lagging.
pub const DEFAULT_FEED_CAPACITY: usize = 1024;

struct Binding<H> {
    type_name: String,
    handle: H,
}

struct DirectoryInner<H> {
    bindings: RwLock<BTreeMap<String, Binding<H>>>,
    feed: broadcast::Sender<RegistryEvent>,
    available: AtomicBool,
}

/// Single-process directory.
pub struct InMemoryDirectory<H> {
    inner: Arc<DirectoryInner<H>>,
}

impl<H> Clone for InMemoryDirectory<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H> Default for InMemoryDirectory<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H> InMemoryDirectory<H> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_feed_capacity(DEFAULT_FEED_CAPACITY)
    }

    #[must_use]
    pub fn with_feed_capacity(capacity: usize) -> Self {
        let (feed, _) = broadcast::channel(capacity.max(1));
        Self {
            inner: Arc::new(DirectoryInner {
                bindings: RwLock::new(BTreeMap::new()),
                feed,
                available: AtomicBool::new(true),
            }),
        }
    }

    /// Simulate an outage: while unavailable every call fails with
    /// `DirectoryError::Unavailable`. Open feeds stay open.
    pub fn set_available(&self, available: bool) {
        self.inner.available.store(available, Ordering::SeqCst);
        debug!(available, "Directory availability changed");
    }

    /// Number of bound names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.bindings.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.bindings.read().is_empty()
    }

    fn ensure_available(&self) -> Result<(), DirectoryError> {
        if self.inner.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(DirectoryError::Unavailable(
                "in-memory directory is offline".to_string(),
            ))
        }
    }

    /// Called with the bindings write lock held, so the feed order matches
    /// the order in which bindings changed.
    fn notify(&self, event: RegistryEvent) {
        // No open feeds is not an error.
        let _ = self.inner.feed.send(event);
    }
}

#[async_trait]
impl<H> Directory<H> for InMemoryDirectory<H>
where
    H: Clone + Send + Sync + 'static,
{
    async fn bind(&self, name: &str, type_name: &str, handle: H) -> Result<(), DirectoryError> {
        self.ensure_available()?;
        let mut bindings = self.inner.bindings.write();
        if bindings.contains_key(name) {
            return Err(DirectoryError::AlreadyBound {
                name: name.to_string(),
            });
        }
        bindings.insert(
            name.to_string(),
            Binding {
                type_name: type_name.to_string(),
                handle,
            },
        );
        self.notify(RegistryEvent::bound(name, type_name));
        drop(bindings);
        debug!(name, type_name, "Name bound");
        Ok(())
    }

    async fn unbind(&self, name: &str) -> Result<(), DirectoryError> {
        self.ensure_available()?;
        let mut bindings = self.inner.bindings.write();
        let Some(binding) = bindings.remove(name) else {
            return Err(DirectoryError::NotBound {
                name: name.to_string(),
            });
        };
        self.notify(RegistryEvent::unbound(name, binding.type_name.as_str()));
        drop(bindings);
        debug!(name, type_name = %binding.type_name, "Name unbound");
        Ok(())
    }

    async fn list(&self, type_filter: Option<&str>) -> Result<Vec<String>, DirectoryError> {
        self.ensure_available()?;
        let bindings = self.inner.bindings.read();
        Ok(bindings
            .iter()
            .filter(|(_, binding)| type_filter.map_or(true, |wanted| binding.type_name == wanted))
            .map(|(name, _)| name.clone())
            .collect())
    }

    async fn lookup(&self, name: &str) -> Result<H, DirectoryError> {
        self.ensure_available()?;
        self.inner
            .bindings
            .read()
            .get(name)
            .map(|binding| binding.handle.clone())
            .ok_or_else(|| DirectoryError::NotBound {
                name: name.to_string(),
            })
    }

    async fn subscribe(
        &self,
        filter: RegistryEventFilter,
    ) -> Result<RegistryEventStream, DirectoryError> {
        self.ensure_available()?;
        let receiver = self.inner.feed.subscribe();
        let stream = BroadcastStream::new(receiver).filter_map(move |item| match item {
            Ok(event) if filter.matches(&event) => Some(event),
            Ok(_) => None,
            Err(BroadcastStreamRecvError::Lagged(missed)) => {
                warn!(missed, "Directory feed lagged, notifications dropped");
                None
            }
        });
        Ok(Box::pin(stream))
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::timeout;

    use super::*;
    use crate::domain::RegistryEventKind;

    fn directory() -> InMemoryDirectory<u32> {
        InMemoryDirectory::new()
    }

    async fn next_event(stream: &mut RegistryEventStream) -> RegistryEvent {
        timeout(Duration::from_millis(100), stream.next())
            .await
            .expect("timeout")
            .expect("event")
    }

    #[tokio::test]
    async fn test_bind_lookup_unbind() {
        let dir = directory();

        dir.bind("A", "GPSOffice", 1).await.unwrap();
        assert_eq!(dir.lookup("A").await, Ok(1));

        dir.unbind("A").await.unwrap();
        assert_eq!(
            dir.lookup("A").await,
            Err(DirectoryError::NotBound { name: "A".into() })
        );
    }

    #[tokio::test]
    async fn test_bind_twice_fails() {
        let dir = directory();
        dir.bind("A", "GPSOffice", 1).await.unwrap();

        assert_eq!(
            dir.bind("A", "GPSOffice", 2).await,
            Err(DirectoryError::AlreadyBound { name: "A".into() })
        );
        assert_eq!(dir.lookup("A").await, Ok(1));
    }

    #[tokio::test]
    async fn test_unbind_unknown_fails() {
        let dir = directory();
        assert_eq!(
            dir.unbind("ghost").await,
            Err(DirectoryError::NotBound {
                name: "ghost".into()
            })
        );
    }

    #[tokio::test]
    async fn test_list_is_sorted_and_filtered_by_type() {
        let dir = directory();
        dir.bind("C", "GPSOffice", 3).await.unwrap();
        dir.bind("A", "GPSOffice", 1).await.unwrap();
        dir.bind("printer", "Printer", 9).await.unwrap();

        assert_eq!(dir.list(Some("GPSOffice")).await.unwrap(), vec!["A", "C"]);
        assert_eq!(
            dir.list(None).await.unwrap(),
            vec!["A", "C", "printer"]
        );
    }

    #[tokio::test]
    async fn test_feed_reports_matching_changes_only() {
        let dir = directory();
        let mut feed = dir
            .subscribe(
                RegistryEventFilter::new()
                    .report_type("GPSOffice")
                    .report_bound()
                    .report_unbound(),
            )
            .await
            .unwrap();

        dir.bind("printer", "Printer", 9).await.unwrap();
        dir.bind("A", "GPSOffice", 1).await.unwrap();
        dir.unbind("A").await.unwrap();

        let bound = next_event(&mut feed).await;
        assert_eq!(bound, RegistryEvent::bound("A", "GPSOffice"));
        let unbound = next_event(&mut feed).await;
        assert_eq!(unbound.kind, RegistryEventKind::Unbound);
        assert_eq!(unbound.name, "A");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_feed_order_matches_racing_unbind_and_rebind() {
        let dir = directory();
        let mut feed = dir
            .subscribe(RegistryEventFilter::new().report_bound().report_unbound())
            .await
            .unwrap();
        dir.bind("A", "GPSOffice", 0).await.unwrap();
        assert_eq!(next_event(&mut feed).await.kind, RegistryEventKind::Bound);

        for round in 1..=100u32 {
            let unbinder = dir.clone();
            let binder = dir.clone();
            let unbind = tokio::spawn(async move { unbinder.unbind("A").await });
            let rebind = tokio::spawn(async move { binder.bind("A", "GPSOffice", round).await });
            let unbound = unbind.await.unwrap().is_ok();
            let rebound = rebind.await.unwrap().is_ok();

            // Replay the feed for this round from "bound".
            let mut bound = true;
            for _ in 0..(usize::from(unbound) + usize::from(rebound)) {
                bound = next_event(&mut feed).await.kind == RegistryEventKind::Bound;
            }
            assert_eq!(bound, dir.lookup("A").await.is_ok(), "round {round}");

            if !bound {
                dir.bind("A", "GPSOffice", round).await.unwrap();
                next_event(&mut feed).await;
            }
        }
    }

    #[tokio::test]
    async fn test_feed_starts_after_subscribe() {
        let dir = directory();
        dir.bind("early", "GPSOffice", 1).await.unwrap();

        let mut feed = dir
            .subscribe(RegistryEventFilter::new().report_bound())
            .await
            .unwrap();
        dir.bind("late", "GPSOffice", 2).await.unwrap();

        assert_eq!(next_event(&mut feed).await.name, "late");
    }

    #[tokio::test]
    async fn test_offline_directory_fails_every_call() {
        let dir = directory();
        dir.bind("A", "GPSOffice", 1).await.unwrap();
        dir.set_available(false);

        assert!(matches!(
            dir.lookup("A").await,
            Err(DirectoryError::Unavailable(_))
        ));
        assert!(matches!(
            dir.list(None).await,
            Err(DirectoryError::Unavailable(_))
        ));
        assert!(matches!(
            dir.bind("B", "GPSOffice", 2).await,
            Err(DirectoryError::Unavailable(_))
        ));

        dir.set_available(true);
        assert_eq!(dir.lookup("A").await, Ok(1));
    }

    #[tokio::test]
    async fn test_clones_share_bindings() {
        let dir = directory();
        let other = dir.clone();

        dir.bind("A", "GPSOffice", 1).await.unwrap();

        assert_eq!(other.lookup("A").await, Ok(1));
        assert_eq!(other.len(), 1);
    }
}
