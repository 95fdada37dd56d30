//! Network actuator bindings for relayswitch
//!
//! Provides:
//! - HTTP toggle for Tasmota-style smart plugs
//! - UDP datagram sender (broadcast capable)
//! - In-memory actuator for dry runs
//! - `ConfiguredActuator`, the closed set of bindings selected by configuration

mod configured;
mod http;
mod memory;
mod udp;

pub use configured::*;
pub use http::*;
pub use memory::*;
pub use udp::*;
