//! Relay session client for relayswitch
//!
//! Provides:
//! - A long-lived stream session to the relay (connect, check-in handshake)
//! - NDJSON (newline-delimited JSON) receive with bounded, cooperative retry
//! - Heartbeat after a period of send silence
//! - Reconnect on connection loss, retrying forever
//! - A scripted mock transport for tests

mod client;
mod mock;
mod transport;

pub use client::*;
pub use mock::*;
pub use transport::*;

use relayswitch_api::ProtocolError;
use thiserror::Error;

/// Session errors
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Connection lost: {0}")]
    ConnectionLost(#[source] std::io::Error),

    #[error("Connection closed by relay")]
    ConnectionClosed,

    #[error("Not connected")]
    NotConnected,

    #[error("Malformed message: {0}")]
    Malformed(#[from] ProtocolError),
}

impl SessionError {
    /// Whether the session must be re-established after this error
    pub fn is_connection_loss(&self) -> bool {
        !matches!(self, SessionError::Malformed(_))
    }
}

pub type SessionResult<T> = Result<T, SessionError>;
