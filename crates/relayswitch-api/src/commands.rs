//! Inbound messages and the commands they carry

use serde::Deserialize;
use thiserror::Error;

/// Errors decoding or encoding relay messages
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("Line is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),
}

/// Abstract command produced from one inbound line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteCommand {
    /// `{"M":"say","C":"play"}` - force the switch on
    Play,
    /// `{"M":"say","C":"stop"}` - force the switch off
    Stop,
    /// `{"M":"checked"}` - relay acknowledged our check-in or status probe
    StatusAck,
    /// Any other well-formed message, kept verbatim for logging
    Unknown(String),
}

impl RemoteCommand {
    /// Parse one line (without its terminator) into a command.
    ///
    /// Only malformed JSON is an error; well-formed messages of an
    /// unrecognised shape become `Unknown`.
    pub fn parse(line: &str) -> Result<Self, ProtocolError> {
        let msg: Inbound = serde_json::from_str(line)?;

        let command = match (msg.method.as_deref(), msg.content.as_ref()) {
            (Some("say"), Some(serde_json::Value::String(c))) if c == "play" => Self::Play,
            (Some("say"), Some(serde_json::Value::String(c))) if c == "stop" => Self::Stop,
            (Some("checked"), _) => Self::StatusAck,
            _ => Self::Unknown(line.to_string()),
        };

        Ok(command)
    }

    /// Whether this command drives the switch
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Play | Self::Stop)
    }
}

/// Inbound message as sent by the relay. Extra fields (`ID`, `NAME`, `T`, ...)
/// are ignored.
#[derive(Debug, Clone, Deserialize)]
struct Inbound {
    #[serde(rename = "M", default)]
    method: Option<String>,

    #[serde(rename = "C", default)]
    content: Option<serde_json::Value>,
}

/// Decode raw line bytes (terminator already stripped)
pub fn decode_line(bytes: Vec<u8>) -> Result<String, ProtocolError> {
    Ok(String::from_utf8(bytes)?)
}
