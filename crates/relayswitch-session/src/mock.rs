//! Scripted relay transport for testing

use async_trait::async_trait;
use std::collections::VecDeque;
use std::io;
use std::sync::{Arc, Mutex};

use crate::{Connector, Endpoint, SessionReader, SessionWriter};

/// One scripted outcome for the read half
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockRead {
    /// Bytes made available to the reader
    Bytes(Vec<u8>),
    /// One explicit "nothing buffered" result
    WouldBlock,
    /// Peer closed the stream
    Eof,
}

#[derive(Debug, Default)]
struct MockRelay {
    inbound: VecDeque<MockRead>,
    sent: Vec<Vec<u8>>,
    connects: u32,
    failing_connects: u32,
    failing_writes: u32,
    read_calls: u64,
    closes: u32,
}

/// Mock relay for unit/integration testing.
///
/// Clones share the same script, so a test can keep one handle while the
/// session client owns another. The inbound script outlives individual
/// connections, the same way a relay buffers for a reconnecting device.
#[derive(Debug, Clone, Default)]
pub struct MockConnector {
    relay: Arc<Mutex<MockRelay>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes for the reader
    pub fn push_inbound(&self, bytes: impl Into<Vec<u8>>) {
        self.relay
            .lock()
            .unwrap()
            .inbound
            .push_back(MockRead::Bytes(bytes.into()));
    }

    /// Queue one inbound line, terminator appended
    pub fn push_line(&self, line: &str) {
        let mut bytes = line.as_bytes().to_vec();
        bytes.push(b'\n');
        self.push_inbound(bytes);
    }

    /// Queue one "nothing buffered" result ahead of later bytes
    pub fn push_would_block(&self) {
        self.relay
            .lock()
            .unwrap()
            .inbound
            .push_back(MockRead::WouldBlock);
    }

    /// Queue a peer close
    pub fn push_eof(&self) {
        self.relay.lock().unwrap().inbound.push_back(MockRead::Eof);
    }

    /// Make the next `count` connection attempts fail
    pub fn fail_next_connects(&self, count: u32) {
        self.relay.lock().unwrap().failing_connects = count;
    }

    /// Make the next `count` writes fail with a broken pipe
    pub fn fail_next_writes(&self, count: u32) {
        self.relay.lock().unwrap().failing_writes = count;
    }

    /// Connection attempts so far, failed ones included
    pub fn connect_attempts(&self) -> u32 {
        self.relay.lock().unwrap().connects
    }

    /// Number of `try_read_bytes` calls across all connections
    pub fn read_calls(&self) -> u64 {
        self.relay.lock().unwrap().read_calls
    }

    /// Times the writer was shut down
    pub fn close_count(&self) -> u32 {
        self.relay.lock().unwrap().closes
    }

    /// Every successfully written chunk, decoded lossily, in order
    pub fn sent_lines(&self) -> Vec<String> {
        self.relay
            .lock()
            .unwrap()
            .sent
            .iter()
            .map(|bytes| String::from_utf8_lossy(bytes).into_owned())
            .collect()
    }

    /// Number of check-in handshakes written
    pub fn checkin_count(&self) -> usize {
        self.count_sent(r#""M":"checkin""#)
    }

    /// Number of status heartbeats written
    pub fn status_count(&self) -> usize {
        self.count_sent(r#""M":"status""#)
    }

    fn count_sent(&self, needle: &str) -> usize {
        self.sent_lines()
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    /// Unread inbound script entries
    pub fn pending_inbound(&self) -> usize {
        self.relay.lock().unwrap().inbound.len()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Reader = MockReader;
    type Writer = MockWriter;

    async fn connect(&self, _endpoint: &Endpoint) -> io::Result<(MockReader, MockWriter)> {
        let mut relay = self.relay.lock().unwrap();
        relay.connects += 1;
        if relay.failing_connects > 0 {
            relay.failing_connects -= 1;
            return Err(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                "mock relay refused connection",
            ));
        }

        Ok((
            MockReader {
                relay: self.relay.clone(),
            },
            MockWriter {
                relay: self.relay.clone(),
                closed: false,
            },
        ))
    }
}

/// Read half handed out by `MockConnector`
#[derive(Debug)]
pub struct MockReader {
    relay: Arc<Mutex<MockRelay>>,
}

impl SessionReader for MockReader {
    fn try_read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut relay = self.relay.lock().unwrap();
        relay.read_calls += 1;

        match relay.inbound.pop_front() {
            None | Some(MockRead::WouldBlock) => Err(io::ErrorKind::WouldBlock.into()),
            Some(MockRead::Eof) => Ok(0),
            Some(MockRead::Bytes(mut bytes)) => {
                let n = buf.len().min(bytes.len());
                buf[..n].copy_from_slice(&bytes[..n]);
                if n < bytes.len() {
                    let rest = bytes.split_off(n);
                    relay.inbound.push_front(MockRead::Bytes(rest));
                }
                Ok(n)
            }
        }
    }
}

/// Write half handed out by `MockConnector`
#[derive(Debug)]
pub struct MockWriter {
    relay: Arc<Mutex<MockRelay>>,
    closed: bool,
}

#[async_trait]
impl SessionWriter for MockWriter {
    async fn send(&mut self, bytes: &[u8]) -> io::Result<()> {
        if self.closed {
            return Err(io::ErrorKind::NotConnected.into());
        }

        let mut relay = self.relay.lock().unwrap();
        if relay.failing_writes > 0 {
            relay.failing_writes -= 1;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "mock relay dropped"));
        }
        relay.sent.push(bytes.to_vec());
        Ok(())
    }

    async fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        self.relay.lock().unwrap().closes += 1;
        Ok(())
    }
}
