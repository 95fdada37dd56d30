//! HTTP toggle actuator
//!
//! Drives a Tasmota-style smart plug with a plain GET to
//! `http://<host>/cm?cmnd=Power%20On` (or `Power%20Off`).

use async_trait::async_trait;
use reqwest::Client;
use relayswitch_actuator_api::{Actuator, ActuatorError, ActuatorKind, ActuatorResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tracing::{debug, info};

/// Smart plug driven over HTTP
pub struct HttpActuator {
    client: Client,
    host: String,
    on: AtomicBool,
}

impl HttpActuator {
    pub fn new(host: impl Into<String>, timeout: Duration) -> ActuatorResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .no_proxy()
            .build()
            .map_err(|e| ActuatorError::Request(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            host: host.into(),
            on: AtomicBool::new(false),
        })
    }

    /// URL for a power command ("On" / "Off")
    pub fn command_url(&self, power: &str) -> String {
        format!("http://{}/cm?cmnd=Power%20{}", self.host, power)
    }

    async fn send_power(&self, power: &str) -> ActuatorResult<()> {
        let url = self.command_url(power);
        debug!(url = %url, "Sending power command");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ActuatorError::Request(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ActuatorError::Request(e.to_string()))?;

        if !status.is_success() {
            return Err(ActuatorError::UnexpectedResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        info!(host = %self.host, power, body = %body.trim(), "Power command accepted");
        Ok(())
    }
}

#[async_trait]
impl Actuator for HttpActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Http
    }

    async fn on(&self) -> ActuatorResult<()> {
        self.send_power("On").await?;
        self.on.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn off(&self) -> ActuatorResult<()> {
        self.send_power("Off").await?;
        self.on.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}
