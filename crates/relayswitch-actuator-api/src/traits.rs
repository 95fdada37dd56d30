//! Actuator traits

use async_trait::async_trait;
use thiserror::Error;

/// Errors from actuator operations
#[derive(Debug, Error)]
pub enum ActuatorError {
    #[error("Request failed: {0}")]
    Request(String),

    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Actuator is closed")]
    Closed,
}

pub type ActuatorResult<T> = Result<T, ActuatorError>;

/// Which binding drives the device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorKind {
    /// HTTP GET toggle (Tasmota-style smart plug)
    Http,
    /// Fixed UDP datagram per state
    Udp,
    /// State tracked in memory only
    Memory,
    /// Test double
    Mock,
}

impl std::fmt::Display for ActuatorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ActuatorKind::Http => "http",
            ActuatorKind::Udp => "udp",
            ActuatorKind::Memory => "memory",
            ActuatorKind::Mock => "mock",
        };
        f.write_str(name)
    }
}

/// Actuator trait - implemented by every device binding.
///
/// Calls are fire-and-forget: an implementation performs one attempt and
/// reports the outcome. Retrying is the caller's business, and the caller
/// never retries inline.
#[async_trait]
pub trait Actuator: Send + Sync {
    /// Binding used by this actuator
    fn kind(&self) -> ActuatorKind;

    /// Drive the device on
    async fn on(&self) -> ActuatorResult<()>;

    /// Drive the device off
    async fn off(&self) -> ActuatorResult<()>;

    /// Last state this actuator successfully drove the device to
    fn is_on(&self) -> bool;

    /// Optional: release sockets or other handles before exit
    async fn shutdown(&self) -> ActuatorResult<()> {
        Ok(())
    }
}
