//! Actuator trait interface for relayswitch
//!
//! This crate defines the capability-based interface between the switch core
//! and the concrete device bindings. It contains no device code itself.

mod mock;
mod traits;

pub use mock::*;
pub use traits::*;
