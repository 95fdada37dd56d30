//! Mock actuator for testing

use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;

use crate::{Actuator, ActuatorError, ActuatorKind, ActuatorResult};

/// Mock actuator for unit/integration testing.
///
/// Clones share state, so a test can keep a handle while the switch owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct MockActuator {
    state: Arc<MockState>,
}

#[derive(Debug, Default)]
struct MockState {
    on: AtomicBool,
    on_calls: AtomicU32,
    off_calls: AtomicU32,
    fail_on: AtomicBool,
    fail_off: AtomicBool,
    shut_down: AtomicBool,
}

impl MockActuator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure `on()` to fail
    pub fn set_fail_on(&self, fail: bool) {
        self.state.fail_on.store(fail, Ordering::SeqCst);
    }

    /// Configure `off()` to fail
    pub fn set_fail_off(&self, fail: bool) {
        self.state.fail_off.store(fail, Ordering::SeqCst);
    }

    /// Number of `on()` calls, failed ones included
    pub fn on_calls(&self) -> u32 {
        self.state.on_calls.load(Ordering::SeqCst)
    }

    /// Number of `off()` calls, failed ones included
    pub fn off_calls(&self) -> u32 {
        self.state.off_calls.load(Ordering::SeqCst)
    }

    pub fn was_shut_down(&self) -> bool {
        self.state.shut_down.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Actuator for MockActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Mock
    }

    async fn on(&self) -> ActuatorResult<()> {
        self.state.on_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_on.load(Ordering::SeqCst) {
            return Err(ActuatorError::Request("Mock on failure".into()));
        }
        self.state.on.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn off(&self) -> ActuatorResult<()> {
        self.state.off_calls.fetch_add(1, Ordering::SeqCst);
        if self.state.fail_off.load(Ordering::SeqCst) {
            return Err(ActuatorError::Request("Mock off failure".into()));
        }
        self.state.on.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.state.on.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) -> ActuatorResult<()> {
        self.state.shut_down.store(true, Ordering::SeqCst);
        Ok(())
    }
}
