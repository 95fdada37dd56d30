//! The closed set of actuator bindings, selected by configuration

use async_trait::async_trait;
use relayswitch_actuator_api::{Actuator, ActuatorKind, ActuatorResult};
use relayswitch_config::ActuatorTarget;

use crate::{HttpActuator, MemoryActuator, UdpActuator};

/// Actuator chosen at startup from `[actuator]` in the config file
pub enum ConfiguredActuator {
    Http(HttpActuator),
    Udp(UdpActuator),
    Memory(MemoryActuator),
}

impl ConfiguredActuator {
    /// Build the binding named by `target`.
    ///
    /// `initially_on` seeds the in-memory binding only; network bindings
    /// start off and learn their state from the first successful call.
    pub fn build(target: &ActuatorTarget, initially_on: bool) -> ActuatorResult<Self> {
        let actuator = match target {
            ActuatorTarget::Http { host, timeout } => {
                ConfiguredActuator::Http(HttpActuator::new(host.clone(), *timeout)?)
            }
            ActuatorTarget::Udp {
                host,
                port,
                on_payload,
                off_payload,
            } => ConfiguredActuator::Udp(UdpActuator::bind(
                host.clone(),
                *port,
                on_payload.as_bytes(),
                off_payload.as_bytes(),
            )?),
            ActuatorTarget::Memory => ConfiguredActuator::Memory(MemoryActuator::new(initially_on)),
        };

        Ok(actuator)
    }

    fn inner(&self) -> &dyn Actuator {
        match self {
            ConfiguredActuator::Http(a) => a,
            ConfiguredActuator::Udp(a) => a,
            ConfiguredActuator::Memory(a) => a,
        }
    }
}

#[async_trait]
impl Actuator for ConfiguredActuator {
    fn kind(&self) -> ActuatorKind {
        self.inner().kind()
    }

    async fn on(&self) -> ActuatorResult<()> {
        self.inner().on().await
    }

    async fn off(&self) -> ActuatorResult<()> {
        self.inner().off().await
    }

    fn is_on(&self) -> bool {
        self.inner().is_on()
    }

    async fn shutdown(&self) -> ActuatorResult<()> {
        self.inner().shutdown().await
    }
}
