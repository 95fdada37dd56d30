//! In-memory actuator: no device, state only

use async_trait::async_trait;
use relayswitch_actuator_api::{Actuator, ActuatorKind, ActuatorResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::debug;

/// Tracks on/off in memory. Useful for dry runs against the relay.
#[derive(Debug, Default)]
pub struct MemoryActuator {
    on: AtomicBool,
}

impl MemoryActuator {
    pub fn new(initially_on: bool) -> Self {
        Self {
            on: AtomicBool::new(initially_on),
        }
    }
}

#[async_trait]
impl Actuator for MemoryActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Memory
    }

    async fn on(&self) -> ActuatorResult<()> {
        self.on.store(true, Ordering::SeqCst);
        debug!("Memory actuator on");
        Ok(())
    }

    async fn off(&self) -> ActuatorResult<()> {
        self.on.store(false, Ordering::SeqCst);
        debug!("Memory actuator off");
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }
}
