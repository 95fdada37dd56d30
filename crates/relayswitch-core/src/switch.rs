//! Debounced switch over an actuator

use async_trait::async_trait;
use relayswitch_actuator_api::Actuator;
use relayswitch_util::MonotonicInstant;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{SwitchAction, SwitchEvent};

/// Something that can be switched on and off.
///
/// The arbiter only sees this trait, so tests can drive it with any
/// implementation.
#[async_trait]
pub trait Switch: Send {
    async fn on(&mut self, force: bool, now: MonotonicInstant) -> SwitchEvent;

    async fn off(&mut self, force: bool, now: MonotonicInstant) -> SwitchEvent;

    fn is_on(&self) -> bool;
}

/// Switch that ignores non-forced offs until `freeze_timeout` has passed
/// since the last `on()`.
pub struct DebouncedSwitch<A: Actuator> {
    actuator: A,
    is_on: bool,
    last_on_time: MonotonicInstant,
    freeze_timeout: Duration,
}

impl<A: Actuator> DebouncedSwitch<A> {
    pub fn new(actuator: A, freeze_timeout: Duration, initially_on: bool, now: MonotonicInstant) -> Self {
        info!(
            actuator = %actuator.kind(),
            freeze_timeout = ?freeze_timeout,
            initially_on,
            "Switch initialized"
        );

        Self {
            actuator,
            is_on: initially_on,
            last_on_time: now,
            freeze_timeout,
        }
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn freeze_timeout(&self) -> Duration {
        self.freeze_timeout
    }

    pub fn last_on_time(&self) -> MonotonicInstant {
        self.last_on_time
    }

    /// Time left in the freeze window; zero once a non-forced off would apply
    pub fn freeze_remaining(&self, now: MonotonicInstant) -> Duration {
        self.last_on_time.remaining_in(self.freeze_timeout, now)
    }

    /// Release the actuator's resources
    pub async fn shutdown(&self) -> relayswitch_actuator_api::ActuatorResult<()> {
        self.actuator.shutdown().await
    }
}

#[async_trait]
impl<A: Actuator> Switch for DebouncedSwitch<A> {
    /// `force` has no effect on "on". The freeze window restarts on every
    /// call, including ones where the actuator fails.
    async fn on(&mut self, _force: bool, now: MonotonicInstant) -> SwitchEvent {
        let event = if self.is_on {
            debug!("Switch already on, extending freeze window");
            SwitchEvent::AlreadyOn
        } else {
            match self.actuator.on().await {
                Ok(()) => {
                    self.is_on = true;
                    info!(actuator = %self.actuator.kind(), "Switch turned on");
                    SwitchEvent::TurnedOn
                }
                Err(e) => {
                    warn!(actuator = %self.actuator.kind(), error = %e, "Failed to turn switch on");
                    SwitchEvent::ActuatorFailed {
                        action: SwitchAction::On,
                        error: e.to_string(),
                    }
                }
            }
        };

        self.last_on_time = now;
        event
    }

    async fn off(&mut self, force: bool, now: MonotonicInstant) -> SwitchEvent {
        let frozen = !self.last_on_time.expired_by(now, self.freeze_timeout);

        if !force {
            if !self.is_on {
                return SwitchEvent::AlreadyOff;
            }
            if frozen {
                let remaining = self.freeze_remaining(now);
                debug!(remaining = ?remaining, "Switch off suppressed by freeze window");
                return SwitchEvent::OffSuppressed { remaining };
            }
        }

        match self.actuator.off().await {
            Ok(()) => {
                self.is_on = false;
                info!(actuator = %self.actuator.kind(), forced = force, "Switch turned off");
                SwitchEvent::TurnedOff { forced: force }
            }
            Err(e) => {
                warn!(actuator = %self.actuator.kind(), error = %e, "Failed to turn switch off");
                SwitchEvent::ActuatorFailed {
                    action: SwitchAction::Off,
                    error: e.to_string(),
                }
            }
        }
    }

    fn is_on(&self) -> bool {
        self.is_on
    }
}
