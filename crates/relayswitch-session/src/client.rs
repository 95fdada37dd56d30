//! Session client: handshake, line receive, heartbeat, reconnect

use relayswitch_api::{LINE_TERMINATOR, Outbound, RemoteCommand, decode_line};
use relayswitch_util::MonotonicInstant;
use std::io;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::{Connector, Endpoint, SessionError, SessionReader, SessionResult, SessionWriter};

/// Send silence after which a status heartbeat goes out
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(40);

/// Pause between connection attempts
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_secs(2);

/// "Nothing buffered" results tolerated per receive
pub const DEFAULT_READ_RETRIES: u32 = 3;

/// Pause after each "nothing buffered" result
pub const DEFAULT_READ_RETRY_PAUSE: Duration = Duration::from_millis(5);

/// Upper bound on single-byte reads per receive
pub const MAX_LINE_READS: usize = 1024;

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub endpoint: Endpoint,
    pub device_id: String,
    pub api_key: String,
    pub heartbeat_interval: Duration,
    pub reconnect_delay: Duration,
    pub read_retries: u32,
    pub read_retry_pause: Duration,
}

impl SessionConfig {
    pub fn new(endpoint: Endpoint, device_id: impl Into<String>, api_key: impl Into<String>) -> Self {
        Self {
            endpoint,
            device_id: device_id.into(),
            api_key: api_key.into(),
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            read_retries: DEFAULT_READ_RETRIES,
            read_retry_pause: DEFAULT_READ_RETRY_PAUSE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    /// Stream open, check-in not yet sent
    Connected,
    Authenticated,
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Authenticated => "authenticated",
        };
        f.write_str(name)
    }
}

struct Connection<R, W> {
    reader: R,
    writer: W,
}

/// Long-lived session with the relay.
///
/// Driven cooperatively: the owner calls [`SessionClient::step_once`] once
/// per tick. Each step receives at most one line, sends a heartbeat when due,
/// and re-establishes the session (at most once) if either side found the
/// connection gone.
pub struct SessionClient<C: Connector> {
    connector: C,
    config: SessionConfig,
    state: ConnectionState,
    connection: Option<Connection<C::Reader, C::Writer>>,
    last_send: MonotonicInstant,
    sessions_established: u64,
}

impl<C: Connector> SessionClient<C> {
    pub fn new(connector: C, config: SessionConfig) -> Self {
        Self {
            connector,
            config,
            state: ConnectionState::Disconnected,
            connection: None,
            last_send: MonotonicInstant::now(),
            sessions_established: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Successful check-ins since construction
    pub fn sessions_established(&self) -> u64 {
        self.sessions_established
    }

    /// Open a stream to the relay, retrying until one attempt succeeds.
    ///
    /// Any previous stream is dropped first.
    pub async fn connect(&mut self) {
        self.connection = None;
        self.state = ConnectionState::Connecting;

        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            match self.connector.connect(&self.config.endpoint).await {
                Ok((reader, writer)) => {
                    info!(endpoint = %self.config.endpoint, attempt, "Connected to relay");
                    self.connection = Some(Connection { reader, writer });
                    self.state = ConnectionState::Connected;
                    return;
                }
                Err(e) => {
                    warn!(
                        endpoint = %self.config.endpoint,
                        attempt,
                        error = %e,
                        retry_in = ?self.config.reconnect_delay,
                        "Relay connection failed"
                    );
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    /// Send the check-in handshake on the current stream.
    ///
    /// The handshake counts as a send at `now` or the moment it went out,
    /// whichever is later, so a slow reconnect does not make the next
    /// heartbeat look overdue. On failure the stream is dropped and the client
    /// is left disconnected.
    pub async fn authenticate(&mut self, now: MonotonicInstant) -> SessionResult<()> {
        let line = Outbound::checkin(&self.config.device_id, &self.config.api_key).to_line()?;
        let connection = self.connection.as_mut().ok_or(SessionError::NotConnected)?;

        let sent = connection.writer.send(&line).await;
        if let Err(e) = sent {
            self.connection = None;
            self.state = ConnectionState::Disconnected;
            return Err(SessionError::ConnectionLost(e));
        }

        self.last_send = now.max(MonotonicInstant::now());
        self.state = ConnectionState::Authenticated;
        self.sessions_established += 1;
        info!(device_id = %self.config.device_id, "Checked in with relay");
        Ok(())
    }

    /// Connect and check in, repeating until both succeed
    pub async fn start(&mut self, now: MonotonicInstant) {
        loop {
            self.connect().await;
            match self.authenticate(now).await {
                Ok(()) => return,
                Err(e) => {
                    warn!(error = %e, "Check-in failed, reconnecting");
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
            }
        }
    }

    /// Drop the current stream and establish a fresh session
    pub async fn reconnect(&mut self, now: MonotonicInstant) {
        info!(endpoint = %self.config.endpoint, "Reconnecting to relay");
        self.connection = None;
        self.state = ConnectionState::Disconnected;
        self.start(now).await;
    }

    /// Receive at most one complete line from the stream
    pub async fn receive_line(&mut self) -> SessionResult<Option<String>> {
        let connection = self.connection.as_mut().ok_or(SessionError::NotConnected)?;
        read_line(
            &mut connection.reader,
            self.config.read_retries,
            self.config.read_retry_pause,
        )
        .await
    }

    /// Send a status heartbeat if the send side has been quiet long enough.
    ///
    /// Returns whether a heartbeat went out.
    pub async fn heartbeat(&mut self, now: MonotonicInstant) -> SessionResult<bool> {
        let connection = self.connection.as_mut().ok_or(SessionError::NotConnected)?;
        send_heartbeat(
            &mut connection.writer,
            &mut self.last_send,
            now,
            self.config.heartbeat_interval,
        )
        .await
    }

    /// One cooperative session step.
    ///
    /// Receive and heartbeat run concurrently on the two stream halves. A
    /// command that arrived before the connection dropped is still returned.
    pub async fn step_once(&mut self, now: MonotonicInstant) -> Option<RemoteCommand> {
        let Some(connection) = self.connection.as_mut() else {
            self.reconnect(now).await;
            return None;
        };

        let (received, heartbeat) = tokio::join!(
            read_line(
                &mut connection.reader,
                self.config.read_retries,
                self.config.read_retry_pause,
            ),
            send_heartbeat(
                &mut connection.writer,
                &mut self.last_send,
                now,
                self.config.heartbeat_interval,
            ),
        );

        let mut lost = false;

        let command = match received {
            Ok(Some(line)) => match RemoteCommand::parse(&line) {
                Ok(command) => {
                    debug!(?command, "Received relay message");
                    Some(command)
                }
                Err(e) => {
                    warn!(error = %e, line = %line, "Discarding malformed message");
                    None
                }
            },
            Ok(None) => None,
            Err(e) if e.is_connection_loss() => {
                warn!(error = %e, "Relay connection lost while receiving");
                lost = true;
                None
            }
            Err(e) => {
                warn!(error = %e, "Discarding malformed message");
                None
            }
        };

        if let Err(e) = heartbeat {
            warn!(error = %e, "Heartbeat failed");
            lost = true;
        }

        if lost {
            self.reconnect(now).await;
        }

        command
    }

    /// Shut the stream down and stay disconnected
    pub async fn close(&mut self) -> SessionResult<()> {
        self.state = ConnectionState::Disconnected;
        let Some(mut connection) = self.connection.take() else {
            return Ok(());
        };

        connection
            .writer
            .close()
            .await
            .map_err(SessionError::ConnectionLost)?;
        info!("Relay session closed");
        Ok(())
    }
}

/// Assemble one line from single-byte reads.
///
/// Gives up after `retries` "nothing buffered" results or `MAX_LINE_READS`
/// reads, discarding any partial line. Empty lines yield `None`.
async fn read_line<R: SessionReader>(
    reader: &mut R,
    retries: u32,
    pause: Duration,
) -> SessionResult<Option<String>> {
    let mut line = Vec::new();
    let mut budget = retries;
    let mut byte = [0u8; 1];

    for _ in 0..MAX_LINE_READS {
        match reader.try_read_bytes(&mut byte) {
            Ok(0) => return Err(SessionError::ConnectionClosed),
            Ok(_) if byte[0] == LINE_TERMINATOR => {
                if line.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(decode_line(line)?));
            }
            Ok(_) => line.push(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => {
                budget = budget.saturating_sub(1);
                if budget == 0 {
                    break;
                }
                tokio::time::sleep(pause).await;
            }
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(SessionError::ConnectionLost(e)),
        }
    }

    if !line.is_empty() {
        debug!(bytes = line.len(), "Dropping incomplete line");
    }
    Ok(None)
}

async fn send_heartbeat<W: SessionWriter>(
    writer: &mut W,
    last_send: &mut MonotonicInstant,
    now: MonotonicInstant,
    interval: Duration,
) -> SessionResult<bool> {
    if !last_send.expired_by(now, interval) {
        return Ok(false);
    }

    let line = Outbound::Status.to_line()?;
    writer
        .send(&line)
        .await
        .map_err(SessionError::ConnectionLost)?;
    *last_send = now;
    debug!("Sent status heartbeat");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MockConnector;

    fn test_config() -> SessionConfig {
        let mut config = SessionConfig::new(Endpoint::new("mock", 8181), "1234", "secret");
        config.reconnect_delay = Duration::from_millis(1);
        config.read_retry_pause = Duration::from_millis(1);
        config
    }

    async fn started(relay: &MockConnector, now: MonotonicInstant) -> SessionClient<MockConnector> {
        let mut client = SessionClient::new(relay.clone(), test_config());
        client.start(now).await;
        client
    }

    #[tokio::test]
    async fn start_sends_one_checkin() {
        let relay = MockConnector::new();
        let client = started(&relay, MonotonicInstant::now()).await;

        assert_eq!(client.state(), ConnectionState::Authenticated);
        assert_eq!(relay.connect_attempts(), 1);
        assert_eq!(
            relay.sent_lines(),
            vec![r#"{"M":"checkin","ID":"1234","K":"secret"}"#.to_string() + "\n"]
        );
    }

    #[tokio::test]
    async fn connect_retries_until_relay_accepts() {
        let relay = MockConnector::new();
        relay.fail_next_connects(2);

        let client = started(&relay, MonotonicInstant::now()).await;

        assert_eq!(relay.connect_attempts(), 3);
        assert_eq!(relay.checkin_count(), 1);
        assert_eq!(client.sessions_established(), 1);
    }

    #[tokio::test]
    async fn failed_checkin_reconnects() {
        let relay = MockConnector::new();
        relay.fail_next_writes(1);

        let client = started(&relay, MonotonicInstant::now()).await;

        assert_eq!(relay.connect_attempts(), 2);
        assert_eq!(relay.checkin_count(), 1);
        assert_eq!(client.state(), ConnectionState::Authenticated);
    }

    #[tokio::test]
    async fn receive_returns_one_line_per_call() {
        let relay = MockConnector::new();
        let mut client = started(&relay, MonotonicInstant::now()).await;
        relay.push_inbound(b"{\"M\":\"checked\"}\n{\"M\":\"say\",\"C\":\"play\"}\n".to_vec());

        assert_eq!(
            client.receive_line().await.unwrap().as_deref(),
            Some(r#"{"M":"checked"}"#)
        );
        assert_eq!(
            client.receive_line().await.unwrap().as_deref(),
            Some(r#"{"M":"say","C":"play"}"#)
        );
    }

    #[tokio::test]
    async fn receive_gives_up_after_retry_budget() {
        let relay = MockConnector::new();
        let mut client = started(&relay, MonotonicInstant::now()).await;

        assert_eq!(client.receive_line().await.unwrap(), None);
        assert_eq!(relay.read_calls(), u64::from(DEFAULT_READ_RETRIES));
    }

    #[tokio::test]
    async fn receive_waits_out_short_gap() {
        let relay = MockConnector::new();
        let mut client = started(&relay, MonotonicInstant::now()).await;
        relay.push_inbound(br#"{"M":"#.to_vec());
        relay.push_would_block();
        relay.push_would_block();
        relay.push_line(r#""checked"}"#);

        assert_eq!(
            client.receive_line().await.unwrap().as_deref(),
            Some(r#"{"M":"checked"}"#)
        );
    }

    #[tokio::test]
    async fn receive_discards_partial_line() {
        let relay = MockConnector::new();
        let mut client = started(&relay, MonotonicInstant::now()).await;

        relay.push_inbound(br#"{"M":"say","#.to_vec());
        assert_eq!(client.receive_line().await.unwrap(), None);

        // The tail arrives later and no longer forms valid JSON on its own
        relay.push_line(r#""C":"play"}"#);
        assert_eq!(
            client.receive_line().await.unwrap().as_deref(),
            Some(r#""C":"play"}"#)
        );
    }

    #[tokio::test]
    async fn receive_stops_at_read_cap() {
        let relay = MockConnector::new();
        let mut client = started(&relay, MonotonicInstant::now()).await;
        relay.push_inbound(vec![b'x'; MAX_LINE_READS + 10]);

        assert_eq!(client.receive_line().await.unwrap(), None);
        assert_eq!(relay.read_calls(), MAX_LINE_READS as u64);
        assert_eq!(relay.pending_inbound(), 1);
    }

    #[tokio::test]
    async fn receive_rejects_invalid_utf8() {
        let relay = MockConnector::new();
        let mut client = started(&relay, MonotonicInstant::now()).await;
        relay.push_inbound(vec![0xff, 0xfe, b'\n']);

        let err = client.receive_line().await.unwrap_err();
        assert!(matches!(err, SessionError::Malformed(_)));
        assert!(!err.is_connection_loss());
    }

    #[tokio::test]
    async fn heartbeat_waits_for_interval() {
        let relay = MockConnector::new();
        let t0 = MonotonicInstant::now();
        let mut client = started(&relay, t0).await;

        assert!(!client.heartbeat(t0 + Duration::from_secs(40)).await.unwrap());
        assert!(client.heartbeat(t0 + Duration::from_secs(41)).await.unwrap());
        assert!(!client.heartbeat(t0 + Duration::from_secs(60)).await.unwrap());
        assert_eq!(relay.status_count(), 1);
    }

    #[tokio::test]
    async fn step_returns_parsed_command() {
        let relay = MockConnector::new();
        let t0 = MonotonicInstant::now();
        let mut client = started(&relay, t0).await;
        relay.push_line(r#"{"M":"say","ID":"U1","NAME":"guest","C":"stop","T":"1"}"#);

        assert_eq!(client.step_once(t0).await, Some(RemoteCommand::Stop));
        assert_eq!(client.step_once(t0).await, None);
    }

    #[tokio::test]
    async fn step_skips_malformed_json() {
        let relay = MockConnector::new();
        let t0 = MonotonicInstant::now();
        let mut client = started(&relay, t0).await;
        relay.push_line("not json");

        assert_eq!(client.step_once(t0).await, None);
        assert_eq!(relay.connect_attempts(), 1);
    }

    #[tokio::test]
    async fn failed_heartbeat_reconnects_exactly_once() {
        let relay = MockConnector::new();
        let t0 = MonotonicInstant::now();
        let mut client = started(&relay, t0).await;

        relay.fail_next_writes(1);
        let later = t0 + Duration::from_secs(41);
        assert_eq!(client.step_once(later).await, None);

        assert_eq!(relay.connect_attempts(), 2);
        assert_eq!(relay.checkin_count(), 2);
        assert_eq!(client.sessions_established(), 2);
        assert_eq!(client.state(), ConnectionState::Authenticated);

        // Fresh session counts as a send; no immediate heartbeat follows
        client.step_once(later).await;
        assert_eq!(relay.connect_attempts(), 2);
        assert_eq!(relay.status_count(), 0);
    }

    #[tokio::test]
    async fn slow_reconnect_does_not_trigger_heartbeat() {
        let relay = MockConnector::new();
        let mut config = test_config();
        config.heartbeat_interval = Duration::from_millis(100);
        config.reconnect_delay = Duration::from_millis(300);
        let t0 = MonotonicInstant::now();
        let mut client = SessionClient::new(relay.clone(), config);
        client.start(t0).await;

        relay.fail_next_writes(1);
        relay.fail_next_connects(1);
        client.step_once(t0 + Duration::from_millis(150)).await;
        assert_eq!(relay.checkin_count(), 2);

        client.step_once(MonotonicInstant::now()).await;
        assert_eq!(relay.status_count(), 0);
    }

    #[tokio::test]
    async fn relay_close_reconnects() {
        let relay = MockConnector::new();
        let t0 = MonotonicInstant::now();
        let mut client = started(&relay, t0).await;
        relay.push_eof();

        client.step_once(t0).await;

        assert_eq!(relay.connect_attempts(), 2);
        assert_eq!(relay.checkin_count(), 2);
    }

    #[tokio::test]
    async fn command_survives_connection_loss_in_same_step() {
        let relay = MockConnector::new();
        let t0 = MonotonicInstant::now();
        let mut client = started(&relay, t0).await;
        relay.push_line(r#"{"M":"say","C":"play"}"#);
        relay.fail_next_writes(1);

        let command = client.step_once(t0 + Duration::from_secs(41)).await;

        assert_eq!(command, Some(RemoteCommand::Play));
        assert_eq!(relay.checkin_count(), 2);
    }

    #[tokio::test]
    async fn close_shuts_writer() {
        let relay = MockConnector::new();
        let mut client = started(&relay, MonotonicInstant::now()).await;

        client.close().await.unwrap();
        client.close().await.unwrap();

        assert_eq!(relay.close_count(), 1);
        assert_eq!(client.state(), ConnectionState::Disconnected);
        assert!(matches!(
            client.receive_line().await,
            Err(SessionError::NotConnected)
        ));
    }
}
