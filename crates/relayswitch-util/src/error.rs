//! Error types for relayswitch

use thiserror::Error;

/// Error type shared by the orchestration layer
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("Session error: {0}")]
    SessionError(String),

    #[error("Actuator error: {0}")]
    ActuatorError(String),
}

impl RelayError {
    pub fn session(msg: impl Into<String>) -> Self {
        Self::SessionError(msg.into())
    }

    pub fn actuator(msg: impl Into<String>) -> Self {
        Self::ActuatorError(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, RelayError>;
