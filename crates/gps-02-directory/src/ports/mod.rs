//! Ports Layer - the directory boundary consumed by offices

use std::pin::Pin;

use async_trait::async_trait;
use futures::Stream;

use crate::domain::{DirectoryError, RegistryEvent, RegistryEventFilter};

/// Live feed of registry changes.
pub type RegistryEventStream = Pin<Box<dyn Stream<Item = RegistryEvent> + Send>>;

/// Naming service over handles of type `H`.
///
/// Implementations deliver every change at least once to each open feed,
/// but consumers must tolerate missed notifications; a periodic `list` is
/// the compensating mechanism.
#[async_trait]
pub trait Directory<H>: Send + Sync
where
    H: Clone + Send + Sync + 'static,
{
    /// Bind `handle` under `name` with registry type `type_name`.
    ///
    /// # Errors
    /// `AlreadyBound` if the name is taken, `Unavailable` on outage.
    async fn bind(&self, name: &str, type_name: &str, handle: H) -> Result<(), DirectoryError>;

    /// Release `name`.
    ///
    /// # Errors
    /// `NotBound` if nothing is bound there, `Unavailable` on outage.
    async fn unbind(&self, name: &str) -> Result<(), DirectoryError>;

    /// Names currently bound, in ascending order, optionally restricted to
    /// one registry type.
    async fn list(&self, type_filter: Option<&str>) -> Result<Vec<String>, DirectoryError>;

    /// Handle bound under `name`.
    async fn lookup(&self, name: &str) -> Result<H, DirectoryError>;

    /// Open a change feed. Only changes after this call are reported.
    async fn subscribe(
        &self,
        filter: RegistryEventFilter,
    ) -> Result<RegistryEventStream, DirectoryError>;
}
