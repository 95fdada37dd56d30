//! UDP datagram actuator
//!
//! Sends a fixed payload per state to a host/port, typically a broadcast
//! address on the local segment. Nothing is expected back.

use async_trait::async_trait;
use nix::sys::socket::{setsockopt, sockopt};
use relayswitch_actuator_api::{Actuator, ActuatorError, ActuatorKind, ActuatorResult};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::net::UdpSocket;
use tokio::sync::Mutex;
use tracing::{debug, info};

/// Device driven by UDP datagrams
pub struct UdpActuator {
    socket: Mutex<Option<UdpSocket>>,
    host: String,
    port: u16,
    on_payload: Vec<u8>,
    off_payload: Vec<u8>,
    on: AtomicBool,
}

impl UdpActuator {
    /// Bind an ephemeral socket with `SO_REUSEADDR` and `SO_BROADCAST` set
    pub fn bind(
        host: impl Into<String>,
        port: u16,
        on_payload: impl Into<Vec<u8>>,
        off_payload: impl Into<Vec<u8>>,
    ) -> ActuatorResult<Self> {
        let socket = std::net::UdpSocket::bind("0.0.0.0:0")?;
        setsockopt(&socket, sockopt::ReuseAddr, &true)
            .map_err(|e| ActuatorError::Io(e.into()))?;
        socket.set_broadcast(true)?;
        socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(socket)?;

        let host = host.into();
        debug!(
            local = ?socket.local_addr().ok(),
            target = %format!("{}:{}", host, port),
            "UDP actuator bound"
        );

        Ok(Self {
            socket: Mutex::new(Some(socket)),
            host,
            port,
            on_payload: on_payload.into(),
            off_payload: off_payload.into(),
            on: AtomicBool::new(false),
        })
    }

    async fn send(&self, payload: &[u8]) -> ActuatorResult<()> {
        let socket = self.socket.lock().await;
        let socket = socket.as_ref().ok_or(ActuatorError::Closed)?;

        let sent = socket
            .send_to(payload, (self.host.as_str(), self.port))
            .await?;
        if sent != payload.len() {
            return Err(ActuatorError::UnexpectedResponse(format!(
                "short datagram: {} of {} bytes",
                sent,
                payload.len()
            )));
        }

        debug!(host = %self.host, port = self.port, bytes = sent, "Datagram sent");
        Ok(())
    }
}

#[async_trait]
impl Actuator for UdpActuator {
    fn kind(&self) -> ActuatorKind {
        ActuatorKind::Udp
    }

    async fn on(&self) -> ActuatorResult<()> {
        self.send(&self.on_payload).await?;
        self.on.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn off(&self) -> ActuatorResult<()> {
        self.send(&self.off_payload).await?;
        self.on.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn is_on(&self) -> bool {
        self.on.load(Ordering::SeqCst)
    }

    async fn shutdown(&self) -> ActuatorResult<()> {
        if self.socket.lock().await.take().is_some() {
            info!(host = %self.host, port = self.port, "UDP actuator socket closed");
        }
        Ok(())
    }
}
