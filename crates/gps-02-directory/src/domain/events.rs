//! Registry change notifications and their filter.

use std::fmt;

/// What happened to a name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryEventKind {
    /// An object was bound under the name.
    Bound,
    /// The name was released.
    Unbound,
}

impl fmt::Display for RegistryEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bound => write!(f, "bound"),
            Self::Unbound => write!(f, "unbound"),
        }
    }
}

/// One change in the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEvent {
    pub kind: RegistryEventKind,
    pub name: String,
    /// Registry type of the object bound (or formerly bound) under `name`.
    pub type_name: String,
}

impl RegistryEvent {
    pub fn bound(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            kind: RegistryEventKind::Bound,
            name: name.into(),
            type_name: type_name.into(),
        }
    }

    pub fn unbound(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            kind: RegistryEventKind::Unbound,
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Selects which registry events a subscriber receives.
///
/// Built fluently; a fresh filter reports nothing until at least one of
/// `report_bound` or `report_unbound` is set.
///
/// ```
/// use gps_02_directory::RegistryEventFilter;
///
/// let filter = RegistryEventFilter::new()
///     .report_type("GPSOffice")
///     .report_bound()
///     .report_unbound();
/// assert!(filter.reports_bound() && filter.reports_unbound());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryEventFilter {
    type_name: Option<String>,
    bound: bool,
    unbound: bool,
}

impl RegistryEventFilter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Only report objects of this registry type.
    #[must_use]
    pub fn report_type(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = Some(type_name.into());
        self
    }

    #[must_use]
    pub fn report_bound(mut self) -> Self {
        self.bound = true;
        self
    }

    #[must_use]
    pub fn report_unbound(mut self) -> Self {
        self.unbound = true;
        self
    }

    #[must_use]
    pub fn reports_bound(&self) -> bool {
        self.bound
    }

    #[must_use]
    pub fn reports_unbound(&self) -> bool {
        self.unbound
    }

    /// Check if an event passes this filter.
    #[must_use]
    pub fn matches(&self, event: &RegistryEvent) -> bool {
        let kind_ok = match event.kind {
            RegistryEventKind::Bound => self.bound,
            RegistryEventKind::Unbound => self.unbound,
        };
        let type_ok = self
            .type_name
            .as_deref()
            .map_or(true, |wanted| wanted == event.type_name);
        kind_ok && type_ok
    }
}
