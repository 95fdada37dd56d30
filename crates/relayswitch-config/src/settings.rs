//! Validated settings structures

use crate::schema::{RawActuator, RawConfig, RawRelay, RawRemote, RawSwitch};
use std::time::Duration;

/// Default relay host
pub const DEFAULT_RELAY_HOST: &str = "www.bigiot.net";

/// Default relay port
pub const DEFAULT_RELAY_PORT: u16 = 8181;

/// Default UDP payload for "on"
pub const DEFAULT_UDP_ON_PAYLOAD: &str = "door close";

/// Default UDP payload for "off"
pub const DEFAULT_UDP_OFF_PAYLOAD: &str = "door open";

/// Validated settings ready for use by the daemon
#[derive(Debug, Clone)]
pub struct Settings {
    pub device: DeviceConfig,
    pub relay: RelayConfig,
    pub switch: SwitchConfig,
    pub remote: RemoteConfig,
    pub actuator: ActuatorTarget,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            device: DeviceConfig {
                id: raw.device.id,
                api_key: raw.device.api_key,
            },
            relay: RelayConfig::from_raw(raw.relay),
            switch: SwitchConfig::from_raw(raw.switch),
            remote: RemoteConfig::from_raw(raw.remote),
            actuator: ActuatorTarget::from_raw(raw.actuator),
        }
    }
}

/// Device credentials
#[derive(Debug, Clone)]
pub struct DeviceConfig {
    pub id: String,
    pub api_key: String,
}

/// Relay endpoint and session timing
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub host: String,
    pub port: u16,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
}

impl RelayConfig {
    fn from_raw(raw: RawRelay) -> Self {
        Self {
            host: raw.host.unwrap_or_else(|| DEFAULT_RELAY_HOST.to_string()),
            port: raw.port.unwrap_or(DEFAULT_RELAY_PORT),
            heartbeat_interval: Duration::from_secs(raw.heartbeat_interval_seconds.unwrap_or(40)),
            reconnect_delay: Duration::from_secs(raw.reconnect_delay_seconds.unwrap_or(2)),
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self::from_raw(RawRelay::default())
    }
}

/// Local debounce policy
#[derive(Debug, Clone)]
pub struct SwitchConfig {
    pub freeze_timeout: Duration,
    pub initially_on: bool,
    pub auto_off: bool,
}

impl SwitchConfig {
    fn from_raw(raw: RawSwitch) -> Self {
        Self {
            freeze_timeout: Duration::from_secs(raw.freeze_timeout_seconds.unwrap_or(15)),
            initially_on: raw.initially_on,
            auto_off: raw.auto_off,
        }
    }
}

impl Default for SwitchConfig {
    fn default() -> Self {
        Self::from_raw(RawSwitch::default())
    }
}

/// Remote command policy
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    pub freeze_timeout: Duration,
}

impl RemoteConfig {
    fn from_raw(raw: RawRemote) -> Self {
        Self {
            freeze_timeout: Duration::from_secs(raw.freeze_timeout_seconds.unwrap_or(600)),
        }
    }
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self::from_raw(RawRemote::default())
    }
}

/// Which device binding to build, and where it points
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActuatorTarget {
    Http {
        host: String,
        timeout: Duration,
    },
    Udp {
        host: String,
        port: u16,
        on_payload: String,
        off_payload: String,
    },
    Memory,
}

impl ActuatorTarget {
    fn from_raw(raw: RawActuator) -> Self {
        match raw {
            RawActuator::Http { host, timeout_seconds } => ActuatorTarget::Http {
                host,
                timeout: Duration::from_secs(timeout_seconds.unwrap_or(5)),
            },
            RawActuator::Udp {
                host,
                port,
                on_payload,
                off_payload,
            } => ActuatorTarget::Udp {
                host,
                port,
                on_payload: on_payload.unwrap_or_else(|| DEFAULT_UDP_ON_PAYLOAD.to_string()),
                off_payload: off_payload.unwrap_or_else(|| DEFAULT_UDP_OFF_PAYLOAD.to_string()),
            },
            RawActuator::Memory => ActuatorTarget::Memory,
        }
    }

    /// Short human-readable description for logs and summaries
    pub fn describe(&self) -> String {
        match self {
            ActuatorTarget::Http { host, .. } => format!("http ({})", host),
            ActuatorTarget::Udp { host, port, .. } => format!("udp ({}:{})", host, port),
            ActuatorTarget::Memory => "memory".to_string(),
        }
    }
}
