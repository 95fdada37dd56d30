//! Orchestrator: one session, one arbiter, one switch

use relayswitch_actuator_api::Actuator;
use relayswitch_config::Settings;
use relayswitch_session::{Connector, Endpoint, SessionClient, SessionConfig};
use relayswitch_util::{MonotonicInstant, RelayError};
use tracing::{debug, info};

use crate::{CoreEvent, DebouncedSwitch, Origin, RemoteArbiter, Switch, SwitchEvent};

/// Session parameters derived from validated settings
pub fn session_config(settings: &Settings) -> SessionConfig {
    let mut config = SessionConfig::new(
        Endpoint::new(settings.relay.host.clone(), settings.relay.port),
        settings.device.id.clone(),
        settings.device.api_key.clone(),
    );
    config.heartbeat_interval = settings.relay.heartbeat_interval;
    config.reconnect_delay = settings.relay.reconnect_delay;
    config
}

/// Drives the switch from relay commands and local requests.
///
/// Everything happens on the caller's task: `tick` does one session step and
/// applies its result, local requests are applied between ticks.
pub struct Orchestrator<C: Connector, A: Actuator> {
    session: SessionClient<C>,
    arbiter: RemoteArbiter,
    switch: DebouncedSwitch<A>,
    auto_off: bool,
}

impl<C: Connector, A: Actuator> Orchestrator<C, A> {
    pub fn new(
        session: SessionClient<C>,
        arbiter: RemoteArbiter,
        switch: DebouncedSwitch<A>,
        auto_off: bool,
    ) -> Self {
        Self {
            session,
            arbiter,
            switch,
            auto_off,
        }
    }

    /// Build every component from settings
    pub fn from_settings(settings: &Settings, connector: C, actuator: A, now: MonotonicInstant) -> Self {
        let session = SessionClient::new(connector, session_config(settings));
        let arbiter = RemoteArbiter::new(settings.remote.freeze_timeout);
        let switch = DebouncedSwitch::new(
            actuator,
            settings.switch.freeze_timeout,
            settings.switch.initially_on,
            now,
        );
        Self::new(session, arbiter, switch, settings.switch.auto_off)
    }

    pub fn session(&self) -> &SessionClient<C> {
        &self.session
    }

    pub fn arbiter(&self) -> &RemoteArbiter {
        &self.arbiter
    }

    pub fn switch(&self) -> &DebouncedSwitch<A> {
        &self.switch
    }

    /// Establish the first relay session
    pub async fn start(&mut self, now: MonotonicInstant) {
        info!(
            endpoint = %self.session.config().endpoint,
            auto_off = self.auto_off,
            "Starting relay session"
        );
        self.session.start(now).await;
    }

    /// One scheduling step
    pub async fn tick(&mut self, now: MonotonicInstant) -> Vec<CoreEvent> {
        let mut events = Vec::new();

        if let Some(command) = self.session.step_once(now).await {
            let switched = self
                .arbiter
                .handle_command(&command, &mut self.switch, now)
                .await;
            events.push(CoreEvent::CommandReceived(command));
            if let Some(event) = switched {
                events.push(CoreEvent::Switched {
                    origin: Origin::Remote,
                    event,
                });
            }
        }

        if self.auto_off && self.switch.is_on() && self.arbiter.enable_off(now) {
            let event = self.switch.off(false, now).await;
            if !matches!(event, SwitchEvent::OffSuppressed { .. }) {
                events.push(CoreEvent::Switched {
                    origin: Origin::Local,
                    event,
                });
            }
        }

        events
    }

    /// Local "on"
    pub async fn request_on(&mut self, now: MonotonicInstant) -> CoreEvent {
        debug!("Local on requested");
        CoreEvent::Switched {
            origin: Origin::Local,
            event: self.switch.on(false, now).await,
        }
    }

    /// Local "off", refused while a remote play holds the switch
    pub async fn request_off(&mut self, now: MonotonicInstant) -> CoreEvent {
        debug!("Local off requested");
        if let Some(remaining) = self.arbiter.hold_remaining(now) {
            info!(remaining = ?remaining, "Local off held by remote play");
            return CoreEvent::LocalOffHeld { remaining };
        }

        CoreEvent::Switched {
            origin: Origin::Local,
            event: self.switch.off(false, now).await,
        }
    }

    /// Close the relay session and release the actuator
    pub async fn shutdown(&mut self) -> relayswitch_util::Result<()> {
        let session = self.session.close().await;
        let actuator = self.switch.shutdown().await;
        info!(switch_on = self.switch.is_on(), "Orchestrator stopped");

        session.map_err(|e| RelayError::session(e.to_string()))?;
        actuator.map_err(|e| RelayError::actuator(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relayswitch_actuator_api::MockActuator;
    use relayswitch_api::RemoteCommand;
    use relayswitch_config::parse_config;
    use relayswitch_session::{ConnectionState, MockConnector};
    use std::time::Duration;

    fn settings(extra_switch: &str) -> Settings {
        let toml = format!(
            r#"
            config_version = 1

            [device]
            id = "1234"
            api_key = "secret"

            [relay]
            host = "relay.test"
            reconnect_delay_seconds = 0

            [switch]
            freeze_timeout_seconds = 15
            {extra_switch}

            [remote]
            freeze_timeout_seconds = 600

            [actuator]
            type = "memory"
            "#
        );
        parse_config(&toml).unwrap()
    }

    fn secs(base: MonotonicInstant, s: u64) -> MonotonicInstant {
        base + Duration::from_secs(s)
    }

    async fn started(
        extra_switch: &str,
        t0: MonotonicInstant,
    ) -> (Orchestrator<MockConnector, MockActuator>, MockConnector, MockActuator) {
        let relay = MockConnector::new();
        let mock = MockActuator::new();
        let mut orchestrator =
            Orchestrator::from_settings(&settings(extra_switch), relay.clone(), mock.clone(), t0);
        orchestrator.start(t0).await;
        (orchestrator, relay, mock)
    }

    #[test]
    fn session_config_follows_settings() {
        let config = session_config(&settings(""));
        assert_eq!(config.endpoint, Endpoint::new("relay.test", 8181));
        assert_eq!(config.device_id, "1234");
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.heartbeat_interval, Duration::from_secs(40));
        assert_eq!(config.reconnect_delay, Duration::ZERO);
    }

    #[tokio::test]
    async fn remote_play_then_local_off_sequence() {
        let t0 = MonotonicInstant::now();
        let (mut orchestrator, relay, mock) = started("", t0).await;
        relay.push_line(r#"{"M":"say","C":"play"}"#);

        let events = orchestrator.tick(t0).await;
        assert_eq!(
            events,
            vec![
                CoreEvent::CommandReceived(RemoteCommand::Play),
                CoreEvent::Switched {
                    origin: Origin::Remote,
                    event: SwitchEvent::TurnedOn,
                },
            ]
        );

        assert_eq!(
            orchestrator.request_off(secs(t0, 300)).await,
            CoreEvent::LocalOffHeld {
                remaining: Duration::from_secs(300)
            }
        );
        assert!(orchestrator.switch().is_on());

        assert_eq!(
            orchestrator.request_off(secs(t0, 700)).await,
            CoreEvent::Switched {
                origin: Origin::Local,
                event: SwitchEvent::TurnedOff { forced: false },
            }
        );
        assert_eq!(mock.off_calls(), 1);
    }

    #[tokio::test]
    async fn local_on_is_debounced() {
        let t0 = MonotonicInstant::now();
        let (mut orchestrator, _relay, _mock) = started("", t0).await;

        orchestrator.request_on(t0).await;
        assert!(matches!(
            orchestrator.request_off(secs(t0, 10)).await,
            CoreEvent::Switched {
                event: SwitchEvent::OffSuppressed { .. },
                ..
            }
        ));
        assert!(orchestrator.switch().is_on());

        orchestrator.request_off(secs(t0, 16)).await;
        assert!(!orchestrator.switch().is_on());
    }

    #[tokio::test]
    async fn remote_stop_overrides_local_freeze() {
        let t0 = MonotonicInstant::now();
        let (mut orchestrator, relay, _mock) = started("", t0).await;

        orchestrator.request_on(t0).await;
        relay.push_line(r#"{"M":"say","C":"stop"}"#);
        let events = orchestrator.tick(secs(t0, 1)).await;

        assert!(events.contains(&CoreEvent::Switched {
            origin: Origin::Remote,
            event: SwitchEvent::TurnedOff { forced: true },
        }));
        assert!(!orchestrator.switch().is_on());
        assert!(orchestrator.arbiter().enable_off(secs(t0, 1)));
    }

    #[tokio::test]
    async fn auto_off_after_freeze_window() {
        let t0 = MonotonicInstant::now();
        let (mut orchestrator, _relay, _mock) = started("auto_off = true", t0).await;

        orchestrator.request_on(t0).await;
        assert!(orchestrator.tick(secs(t0, 5)).await.is_empty());
        assert!(orchestrator.switch().is_on());

        let events = orchestrator.tick(secs(t0, 16)).await;
        assert_eq!(
            events,
            vec![CoreEvent::Switched {
                origin: Origin::Local,
                event: SwitchEvent::TurnedOff { forced: false },
            }]
        );
    }

    #[tokio::test]
    async fn auto_off_respects_remote_hold() {
        let t0 = MonotonicInstant::now();
        let (mut orchestrator, relay, _mock) = started("auto_off = true", t0).await;
        relay.push_line(r#"{"M":"say","C":"play"}"#);

        orchestrator.tick(t0).await;
        assert!(orchestrator.tick(secs(t0, 100)).await.is_empty());
        assert!(orchestrator.switch().is_on());

        orchestrator.tick(secs(t0, 601)).await;
        assert!(!orchestrator.switch().is_on());
    }

    #[tokio::test]
    async fn status_ack_is_recorded() {
        let t0 = MonotonicInstant::now();
        let (mut orchestrator, relay, _mock) = started("", t0).await;
        relay.push_line(r#"{"M":"checked"}"#);

        let events = orchestrator.tick(secs(t0, 2)).await;

        assert_eq!(events, vec![CoreEvent::CommandReceived(RemoteCommand::StatusAck)]);
        assert_eq!(orchestrator.arbiter().last_ack(), Some(secs(t0, 2)));
    }

    #[tokio::test]
    async fn local_off_under_unbounded_remote_hold() {
        let t0 = MonotonicInstant::now();
        let relay = MockConnector::new();
        let forever = Duration::from_secs(i64::MAX as u64);
        let session = SessionClient::new(relay.clone(), session_config(&settings("")));
        let switch = DebouncedSwitch::new(MockActuator::new(), forever, false, t0);
        let mut orchestrator = Orchestrator::new(session, RemoteArbiter::new(forever), switch, true);
        orchestrator.start(t0).await;
        relay.push_line(r#"{"M":"say","C":"play"}"#);

        orchestrator.tick(t0).await;

        assert_eq!(
            orchestrator.request_off(t0).await,
            CoreEvent::LocalOffHeld { remaining: forever }
        );
        assert!(orchestrator.tick(secs(t0, 1)).await.is_empty());
        assert!(orchestrator.switch().is_on());
    }

    #[tokio::test]
    async fn shutdown_closes_session_and_actuator() {
        let t0 = MonotonicInstant::now();
        let (mut orchestrator, relay, mock) = started("", t0).await;

        orchestrator.shutdown().await.unwrap();

        assert_eq!(relay.close_count(), 1);
        assert!(mock.was_shut_down());
        assert_eq!(orchestrator.session().state(), ConnectionState::Disconnected);
    }
}
