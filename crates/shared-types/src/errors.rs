//! # Error Types
//!
//! Defines the failure shared by every call that crosses an office boundary.

use thiserror::Error;

/// Failure of a call made to another office or to a listener.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    /// The target process is gone or no longer serving.
    #[error("Remote endpoint {name} is unreachable")]
    Unreachable { name: String },

    /// The target refused the request.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The listener side of a channel was closed.
    #[error("Listener closed")]
    Closed,
}

impl RemoteError {
    /// Shorthand for an unreachable endpoint.
    pub fn unreachable(name: impl Into<String>) -> Self {
        Self::Unreachable { name: name.into() }
    }
}
