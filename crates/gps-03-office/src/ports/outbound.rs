//! Outbound port: the directory offices bind in.

use gps_02_directory::Directory;

use super::inbound::OfficeHandle;

/// Directory of office handles.
pub type OfficeDirectory = dyn Directory<OfficeHandle>;
