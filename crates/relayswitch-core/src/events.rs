//! Core events emitted by the switch and orchestrator

use relayswitch_api::RemoteCommand;
use std::time::Duration;

/// Which actuator call an event refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchAction {
    On,
    Off,
}

impl std::fmt::Display for SwitchAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SwitchAction::On => f.write_str("on"),
            SwitchAction::Off => f.write_str("off"),
        }
    }
}

/// Outcome of one `on()`/`off()` call on a switch
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SwitchEvent {
    /// Actuator driven on
    TurnedOn,

    /// Already on; only the freeze window was refreshed
    AlreadyOn,

    /// Actuator driven off
    TurnedOff { forced: bool },

    /// Already off and nothing forced a repeat
    AlreadyOff,

    /// Off requested inside the freeze window
    OffSuppressed { remaining: Duration },

    /// Actuator call failed; switch state unchanged
    ActuatorFailed { action: SwitchAction, error: String },
}

impl SwitchEvent {
    /// Whether the device state changed
    pub fn is_transition(&self) -> bool {
        matches!(self, SwitchEvent::TurnedOn | SwitchEvent::TurnedOff { .. })
    }
}

/// Where a switch request came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    Remote,
    Local,
}

/// Events emitted by the orchestrator
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoreEvent {
    /// A command arrived from the relay
    CommandReceived(RemoteCommand),

    /// The switch was asked to change state
    Switched { origin: Origin, event: SwitchEvent },

    /// A local off was refused because a remote "play" still holds the switch
    LocalOffHeld { remaining: Duration },
}
