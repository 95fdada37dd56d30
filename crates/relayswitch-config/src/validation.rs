//! Configuration validation

use crate::schema::{RawActuator, RawConfig};
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Field '{0}' cannot be empty")]
    EmptyField(&'static str),

    #[error("Field '{0}' must be a non-zero port")]
    InvalidPort(&'static str),

    #[error("Field '{field}': {message}")]
    InvalidValue {
        field: &'static str,
        message: String,
    },
}

impl ValidationError {
    /// Dotted config path the error refers to, e.g. `relay.port`
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::EmptyField(field) | ValidationError::InvalidPort(field) => field,
            ValidationError::InvalidValue { field, .. } => field,
        }
    }
}

/// Longest accepted value for any `*_seconds` field (one year)
pub const MAX_TIMEOUT_SECONDS: u64 = 365 * 24 * 60 * 60;

fn check_seconds(field: &'static str, value: Option<u64>, errors: &mut Vec<ValidationError>) {
    if let Some(seconds) = value
        && seconds > MAX_TIMEOUT_SECONDS
    {
        errors.push(ValidationError::InvalidValue {
            field,
            message: format!("{} exceeds the {}s maximum", seconds, MAX_TIMEOUT_SECONDS),
        });
    }
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if config.device.id.trim().is_empty() {
        errors.push(ValidationError::EmptyField("device.id"));
    }
    if config.device.api_key.trim().is_empty() {
        errors.push(ValidationError::EmptyField("device.api_key"));
    }

    if let Some(host) = &config.relay.host
        && host.trim().is_empty() {
            errors.push(ValidationError::EmptyField("relay.host"));
        }
    if config.relay.port == Some(0) {
        errors.push(ValidationError::InvalidPort("relay.port"));
    }
    if config.relay.heartbeat_interval_seconds == Some(0) {
        errors.push(ValidationError::InvalidValue {
            field: "relay.heartbeat_interval_seconds",
            message: "heartbeat interval must be at least one second".into(),
        });
    }

    check_seconds(
        "relay.heartbeat_interval_seconds",
        config.relay.heartbeat_interval_seconds,
        &mut errors,
    );
    check_seconds(
        "relay.reconnect_delay_seconds",
        config.relay.reconnect_delay_seconds,
        &mut errors,
    );
    check_seconds(
        "switch.freeze_timeout_seconds",
        config.switch.freeze_timeout_seconds,
        &mut errors,
    );
    check_seconds(
        "remote.freeze_timeout_seconds",
        config.remote.freeze_timeout_seconds,
        &mut errors,
    );

    errors.extend(validate_actuator(&config.actuator));

    errors
}

fn validate_actuator(actuator: &RawActuator) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    match actuator {
        RawActuator::Http { host, timeout_seconds } => {
            if host.trim().is_empty() {
                errors.push(ValidationError::EmptyField("actuator.host"));
            }
            check_seconds("actuator.timeout_seconds", *timeout_seconds, &mut errors);
            if *timeout_seconds == Some(0) {
                errors.push(ValidationError::InvalidValue {
                    field: "actuator.timeout_seconds",
                    message: "request timeout must be at least one second".into(),
                });
            }
        }
        RawActuator::Udp {
            host,
            port,
            on_payload,
            off_payload,
        } => {
            if host.trim().is_empty() {
                errors.push(ValidationError::EmptyField("actuator.host"));
            }
            if *port == 0 {
                errors.push(ValidationError::InvalidPort("actuator.port"));
            }
            if on_payload.as_deref() == Some("") {
                errors.push(ValidationError::EmptyField("actuator.on_payload"));
            }
            if off_payload.as_deref() == Some("") {
                errors.push(ValidationError::EmptyField("actuator.off_payload"));
            }
        }
        RawActuator::Memory => {}
    }

    errors
}
