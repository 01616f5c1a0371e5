//! Directory errors.

use thiserror::Error;

/// Errors returned by directory operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DirectoryError {
    /// Another object is already bound under this name.
    #[error("Name {name} is already bound")]
    AlreadyBound { name: String },

    /// Nothing is bound under this name.
    #[error("Name {name} is not bound")]
    NotBound { name: String },

    /// The directory could not be reached.
    #[error("Directory unavailable: {0}")]
    Unavailable(String),
}

impl DirectoryError {
    /// Whether retrying later could succeed.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Unavailable(_))
    }
}
