//! Ports Layer - Trait definitions for the office boundaries
//!
//! - **Inbound:** `OfficeApi`, the remote surface an office exposes to
//!   customers, other offices and the headquarters monitor
//! - **Outbound:** the directory an office binds itself in and discovers
//!   neighbors through

pub mod inbound;
pub mod outbound;

pub use inbound::*;
pub use outbound::*;
