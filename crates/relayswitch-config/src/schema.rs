//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Device credentials registered with the relay
    pub device: RawDevice,

    /// Relay endpoint and session timing
    #[serde(default)]
    pub relay: RawRelay,

    /// Local debounce policy
    #[serde(default)]
    pub switch: RawSwitch,

    /// Remote command policy
    #[serde(default)]
    pub remote: RawRemote,

    /// Device binding
    pub actuator: RawActuator,
}

/// Device credentials
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawDevice {
    /// Device identifier echoed in the check-in handshake
    pub id: String,

    /// API key echoed in the check-in handshake
    pub api_key: String,
}

/// Relay settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRelay {
    /// Relay host (default: www.bigiot.net)
    pub host: Option<String>,

    /// Relay port (default: 8181)
    pub port: Option<u16>,

    /// Seconds of send silence before a status probe is sent (default: 40)
    pub heartbeat_interval_seconds: Option<u64>,

    /// Seconds to wait between failed connection attempts (default: 2)
    pub reconnect_delay_seconds: Option<u64>,
}

/// Local switch settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSwitch {
    /// Minimum on-time before a non-forced off is honored (default: 15)
    pub freeze_timeout_seconds: Option<u64>,

    /// Assume the device is on at startup
    #[serde(default)]
    pub initially_on: bool,

    /// Attempt a local off on every tick; the freeze timeouts decide whether it happens
    #[serde(default)]
    pub auto_off: bool,
}

/// Remote command settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawRemote {
    /// How long a remote "play" blocks local offs (default: 600)
    pub freeze_timeout_seconds: Option<u64>,
}

/// Raw actuator binding
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RawActuator {
    /// Tasmota-style HTTP toggle
    Http {
        host: String,
        /// Request timeout in seconds (default: 5)
        timeout_seconds: Option<u64>,
    },
    /// Fixed UDP datagram per state
    Udp {
        host: String,
        port: u16,
        /// Payload sent for "on" (default: "door close")
        on_payload: Option<String>,
        /// Payload sent for "off" (default: "door open")
        off_payload: Option<String>,
    },
    /// No device; state tracked in memory
    Memory,
}
