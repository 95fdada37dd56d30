//! Remote command arbitration
//!
//! A remote "play" takes the switch over: it turns the switch on and, for
//! `remote_freeze_timeout` afterwards, refuses local offs. A remote "stop"
//! releases the hold and forces the switch off immediately.

use relayswitch_api::RemoteCommand;
use relayswitch_util::MonotonicInstant;
use std::time::Duration;
use tracing::{debug, info};

use crate::{Switch, SwitchEvent};

pub struct RemoteArbiter {
    forced: bool,
    /// `None` means outside the hold window, which is where "stop" and
    /// startup both leave it
    last_remote_event: Option<MonotonicInstant>,
    remote_freeze_timeout: Duration,
    last_ack: Option<MonotonicInstant>,
}

impl RemoteArbiter {
    pub fn new(remote_freeze_timeout: Duration) -> Self {
        Self {
            forced: false,
            last_remote_event: None,
            remote_freeze_timeout,
            last_ack: None,
        }
    }

    /// Apply one remote command, driving `switch` as needed
    pub async fn handle_command<S: Switch + ?Sized>(
        &mut self,
        command: &RemoteCommand,
        switch: &mut S,
        now: MonotonicInstant,
    ) -> Option<SwitchEvent> {
        match command {
            RemoteCommand::Play => {
                info!("Remote play");
                self.forced = true;
                self.last_remote_event = Some(now);
                Some(switch.on(false, now).await)
            }
            RemoteCommand::Stop => {
                info!("Remote stop");
                self.forced = false;
                self.last_remote_event = None;
                Some(switch.off(true, now).await)
            }
            RemoteCommand::StatusAck => {
                debug!("Relay acknowledged status");
                self.last_ack = Some(now);
                None
            }
            RemoteCommand::Unknown(raw) => {
                info!(message = %raw, "Ignoring unrecognised relay message");
                None
            }
        }
    }

    /// Whether a local off may reach the switch right now
    pub fn enable_off(&self, now: MonotonicInstant) -> bool {
        self.hold_remaining(now).is_none()
    }

    /// Time left on an active remote hold, if any
    pub fn hold_remaining(&self, now: MonotonicInstant) -> Option<Duration> {
        if !self.forced {
            return None;
        }
        let at = self.last_remote_event?;
        let remaining = at.remaining_in(self.remote_freeze_timeout, now);
        (!remaining.is_zero()).then_some(remaining)
    }

    pub fn is_forced(&self) -> bool {
        self.forced
    }

    /// When the relay last acknowledged us
    pub fn last_ack(&self) -> Option<MonotonicInstant> {
        self.last_ack
    }

    pub fn remote_freeze_timeout(&self) -> Duration {
        self.remote_freeze_timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DebouncedSwitch;
    use relayswitch_actuator_api::MockActuator;

    const REMOTE_FREEZE: Duration = Duration::from_secs(600);

    fn secs(base: MonotonicInstant, s: u64) -> MonotonicInstant {
        base + Duration::from_secs(s)
    }

    fn fixture(t0: MonotonicInstant) -> (RemoteArbiter, DebouncedSwitch<MockActuator>, MockActuator) {
        let mock = MockActuator::new();
        let switch = DebouncedSwitch::new(mock.clone(), Duration::from_secs(15), false, t0);
        (RemoteArbiter::new(REMOTE_FREEZE), switch, mock)
    }

    #[test]
    fn fresh_arbiter_allows_off() {
        let t0 = MonotonicInstant::now();
        let arbiter = RemoteArbiter::new(REMOTE_FREEZE);
        assert!(arbiter.enable_off(t0));
        assert!(!arbiter.is_forced());
        assert_eq!(arbiter.last_ack(), None);
    }

    #[tokio::test]
    async fn play_holds_switch_for_remote_window() {
        let t0 = MonotonicInstant::now();
        let (mut arbiter, mut switch, _mock) = fixture(t0);

        let event = arbiter.handle_command(&RemoteCommand::Play, &mut switch, t0).await;
        assert_eq!(event, Some(SwitchEvent::TurnedOn));
        assert!(arbiter.is_forced());

        assert!(!arbiter.enable_off(secs(t0, 300)));
        assert_eq!(
            arbiter.hold_remaining(secs(t0, 300)),
            Some(Duration::from_secs(300))
        );
        assert!(arbiter.enable_off(secs(t0, 600)));
        assert!(arbiter.enable_off(secs(t0, 700)));
    }

    #[tokio::test]
    async fn stop_releases_hold_and_forces_off() {
        let t0 = MonotonicInstant::now();
        let (mut arbiter, mut switch, mock) = fixture(t0);

        arbiter.handle_command(&RemoteCommand::Play, &mut switch, t0).await;
        let event = arbiter
            .handle_command(&RemoteCommand::Stop, &mut switch, secs(t0, 1))
            .await;

        assert_eq!(event, Some(SwitchEvent::TurnedOff { forced: true }));
        assert!(!arbiter.is_forced());
        assert!(arbiter.enable_off(secs(t0, 1)));
        assert!(!switch.is_on());
        assert_eq!(mock.off_calls(), 1);
    }

    #[tokio::test]
    async fn status_ack_records_time_only() {
        let t0 = MonotonicInstant::now();
        let (mut arbiter, mut switch, mock) = fixture(t0);

        let event = arbiter
            .handle_command(&RemoteCommand::StatusAck, &mut switch, secs(t0, 3))
            .await;

        assert_eq!(event, None);
        assert_eq!(arbiter.last_ack(), Some(secs(t0, 3)));
        assert_eq!(mock.on_calls() + mock.off_calls(), 0);
    }

    #[tokio::test]
    async fn unknown_command_changes_nothing() {
        let t0 = MonotonicInstant::now();
        let (mut arbiter, mut switch, mock) = fixture(t0);
        arbiter.handle_command(&RemoteCommand::Play, &mut switch, t0).await;

        let unknown = RemoteCommand::Unknown(r#"{"M":"say","C":"hello"}"#.into());
        let event = arbiter.handle_command(&unknown, &mut switch, secs(t0, 1)).await;

        assert_eq!(event, None);
        assert!(arbiter.is_forced());
        assert!(!arbiter.enable_off(secs(t0, 1)));
        assert_eq!(mock.on_calls(), 1);
    }

    #[tokio::test]
    async fn second_play_restarts_hold() {
        let t0 = MonotonicInstant::now();
        let (mut arbiter, mut switch, _mock) = fixture(t0);

        arbiter.handle_command(&RemoteCommand::Play, &mut switch, t0).await;
        let event = arbiter
            .handle_command(&RemoteCommand::Play, &mut switch, secs(t0, 500))
            .await;

        assert_eq!(event, Some(SwitchEvent::AlreadyOn));
        assert!(!arbiter.enable_off(secs(t0, 700)));
        assert!(arbiter.enable_off(secs(t0, 1101)));
    }

    #[tokio::test]
    async fn very_long_hold_does_not_overflow() {
        let t0 = MonotonicInstant::now();
        let forever = Duration::from_secs(i64::MAX as u64);
        let mut arbiter = RemoteArbiter::new(forever);
        let mut switch = DebouncedSwitch::new(MockActuator::new(), forever, false, t0);

        arbiter.handle_command(&RemoteCommand::Play, &mut switch, t0).await;

        assert!(!arbiter.enable_off(t0));
        assert_eq!(arbiter.hold_remaining(t0), Some(forever));
        assert!(matches!(
            switch.off(false, secs(t0, 1)).await,
            SwitchEvent::OffSuppressed { .. }
        ));
    }
}
