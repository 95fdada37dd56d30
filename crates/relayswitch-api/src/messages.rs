//! Outbound messages sent from the device to the relay

use serde::{Deserialize, Serialize};

use crate::ProtocolError;

/// Messages the device sends to the relay
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "M")]
pub enum Outbound {
    /// Session handshake. Sent once, right after the stream connects.
    #[serde(rename = "checkin")]
    Checkin {
        #[serde(rename = "ID")]
        device_id: String,
        #[serde(rename = "K")]
        api_key: String,
    },

    /// Liveness probe
    #[serde(rename = "status")]
    Status,
}

impl Outbound {
    pub fn checkin(device_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self::Checkin {
            device_id: device_id.into(),
            api_key: api_key.into(),
        }
    }

    /// Encode as a single newline-terminated line
    pub fn to_line(&self) -> Result<Vec<u8>, ProtocolError> {
        let mut bytes = serde_json::to_vec(self)?;
        bytes.push(crate::LINE_TERMINATOR);
        Ok(bytes)
    }
}
