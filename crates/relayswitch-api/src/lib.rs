//! Wire protocol for the relay session
//!
//! The relay speaks newline-delimited JSON objects keyed by short field names
//! (`M` = method, `C` = content, `ID` = device id, `K` = api key).
//! This crate defines:
//! - Outbound messages (check-in handshake, status heartbeat)
//! - Inbound messages and the abstract `RemoteCommand` they map to
//! - Protocol errors

mod commands;
mod messages;

pub use commands::*;
pub use messages::*;

/// Line terminator used by the relay in both directions
pub const LINE_TERMINATOR: u8 = b'\n';
