//! Office errors.

use gps_02_directory::DirectoryError;
use thiserror::Error;

/// Errors from office lifecycle operations.
///
/// Routing itself never fails with this type: hop failures become `Lost`
/// events and listener failures drop the listener.
#[derive(Debug, Error)]
pub enum OfficeError {
    /// Another office already holds this name. Fatal to startup.
    #[error("Office name {name} is already bound")]
    AlreadyBound { name: String },

    /// The directory rejected or could not serve a request.
    #[error("Directory error: {0}")]
    Directory(#[from] DirectoryError),

    /// The office configuration is unusable.
    #[error("Invalid office configuration: {0}")]
    InvalidConfig(String),
}
