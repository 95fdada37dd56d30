//! Shared utilities for relayswitch
//!
//! This crate provides:
//! - Monotonic time used by every timeout in the system
//! - The shared error type
//! - Default configuration paths

mod error;
mod paths;
mod time;

pub use error::*;
pub use paths::*;
pub use time::*;
