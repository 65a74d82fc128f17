//! UDP event loop

use std::io;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr};
use std::sync::Arc;
use std::time::{Duration, Instant};

use bytes::Bytes;
use tokio::net::{UdpSocket, lookup_host};
use tokio::sync::mpsc;

use super::config::ClientConfig;
use crate::error::{CallRecError, Result};
use crate::protocol::rewind::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::rewind::{PacketEncoder, RewindPacket, has_signature};
use crate::recorder::CallTracker;
use crate::session::{LoginState, Outcome, RelaySession, Request};

/// Datagrams buffered between the reader task and the event loop
const DATAGRAM_QUEUE: usize = 256;

/// Client for one relay connection
///
/// A reader task pushes every datagram into a queue; all session and call
/// state is mutated by [`RelayClient::run`] alone.
#[derive(Debug)]
pub struct RelayClient {
    config: ClientConfig,
    socket: Arc<UdpSocket>,
    server_addr: SocketAddr,
    session: RelaySession,
    encoder: PacketEncoder,
    tracker: CallTracker,
}

impl RelayClient {
    /// Resolve the relay and open a connected UDP socket
    ///
    /// # Errors
    ///
    /// Returns `CallRecError::AddressResolution` if the relay address does
    /// not resolve, or `CallRecError::Network` if the socket cannot be
    /// bound or connected.
    pub async fn connect(config: ClientConfig, tracker: CallTracker) -> Result<Self> {
        let server_addr = resolve(&config.server_address).await?;

        let bind_addr = config.source_address.unwrap_or_else(|| match server_addr {
            SocketAddr::V4(_) => SocketAddr::from((Ipv4Addr::UNSPECIFIED, 0)),
            SocketAddr::V6(_) => SocketAddr::from((Ipv6Addr::UNSPECIFIED, 0)),
        });

        let socket = UdpSocket::bind(bind_addr).await?;
        socket.connect(server_addr).await?;
        tracing::info!(
            "Connecting to {} from {}",
            server_addr,
            socket.local_addr()?
        );

        Ok(Self {
            session: RelaySession::new(config.session.clone()),
            config,
            socket: Arc::new(socket),
            server_addr,
            encoder: PacketEncoder::new(),
            tracker,
        })
    }

    /// Relay address in use
    #[must_use]
    pub fn server_addr(&self) -> SocketAddr {
        self.server_addr
    }

    /// Local socket address
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.socket.local_addr()?)
    }

    /// Current login state
    #[must_use]
    pub fn login_state(&self) -> LoginState {
        self.session.state()
    }

    /// The call tracker
    #[must_use]
    pub fn tracker(&self) -> &CallTracker {
        &self.tracker
    }

    /// Run until a fatal condition
    ///
    /// Keepalives start immediately. The active call, if any, is finalised
    /// before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns `CallRecError::ServerTimeout`, `CallRecError::ServerClosed`,
    /// a socket error, or a fatal recording error.
    pub async fn run(&mut self) -> Result<()> {
        let (tx, mut rx) = mpsc::channel(DATAGRAM_QUEUE);
        let reader = tokio::spawn(receive_datagrams(Arc::clone(&self.socket), tx));

        let result = self.event_loop(&mut rx).await;
        reader.abort();

        if result.is_err() {
            self.tracker.finish();
        }
        result
    }

    async fn event_loop(&mut self, rx: &mut mpsc::Receiver<io::Result<Bytes>>) -> Result<()> {
        let mut next_keepalive = Instant::now();
        let mut last_valid = Instant::now();

        loop {
            if Instant::now() >= next_keepalive {
                let keepalive = self.session.keepalive();
                self.send(&keepalive).await?;
                next_keepalive = Instant::now() + self.config.keepalive_interval;
            }

            match tokio::time::timeout(self.next_wait(next_keepalive), rx.recv()).await {
                Ok(Some(Ok(datagram))) => {
                    if self.process_datagram(&datagram).await? {
                        last_valid = Instant::now();
                    }
                }
                Ok(Some(Err(e))) => tracing::warn!("Receive error: {}", e),
                Ok(None) => {
                    return Err(CallRecError::Network(io::Error::other(
                        "datagram receiver stopped",
                    )));
                }
                Err(_) => {}
            }

            if last_valid.elapsed() >= self.config.server_timeout {
                if !self.session.state().has_contact() {
                    tracing::warn!("No answer from relay {}", self.server_addr);
                }
                return Err(CallRecError::ServerTimeout {
                    duration: self.config.server_timeout,
                });
            }

            self.tracker.check_hang_time(Instant::now());
        }
    }

    /// Wait no longer than the next keepalive or hang-time deadline
    fn next_wait(&self, next_keepalive: Instant) -> Duration {
        let now = Instant::now();
        let mut wait = self
            .config
            .recv_wait
            .min(next_keepalive.saturating_duration_since(now));

        if let Some(call) = self.tracker.active_call() {
            let hang_time = self.tracker.config().hang_time;
            wait = wait.min(hang_time.saturating_sub(call.idle_time(now)));
        }
        wait
    }

    /// Returns whether the datagram counted as valid relay activity
    async fn process_datagram(&mut self, datagram: &[u8]) -> Result<bool> {
        if !has_signature(datagram) {
            tracing::debug!("Ignoring {} byte datagram without signature", datagram.len());
            return Ok(false);
        }

        let packet = match RewindPacket::decode(datagram) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::warn!("Dropping packet: {}", e);
                return Ok(false);
            }
        };
        tracing::trace!(
            "Received type 0x{:04x} seq {} ({} bytes payload)",
            packet.type_code,
            packet.sequence,
            packet.payload.len()
        );

        let outcome = self.session.handle_packet(&packet)?;
        let valid = outcome.is_valid();

        match outcome {
            Outcome::Reply(request) => self.send(&request).await?,
            Outcome::Call(signal) => match self.tracker.handle(signal) {
                Ok(_) => {}
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => tracing::warn!("{}", e),
            },
            Outcome::Handled | Outcome::Invalid => {}
        }

        Ok(valid)
    }

    async fn send(&mut self, request: &Request) -> Result<()> {
        let datagram = self
            .encoder
            .encode(request.packet_type(), request.payload());
        tracing::debug!(
            "Sending {:?} seq {}",
            request.packet_type(),
            self.encoder.next_sequence().wrapping_sub(1)
        );
        self.socket.send(&datagram).await?;
        Ok(())
    }
}

async fn resolve(address: &str) -> Result<SocketAddr> {
    let resolution_error = |message: String| CallRecError::AddressResolution {
        address: address.to_string(),
        message,
    };

    lookup_host(address)
        .await
        .map_err(|e| resolution_error(e.to_string()))?
        .next()
        .ok_or_else(|| resolution_error("no addresses found".to_string()))
}

async fn receive_datagrams(socket: Arc<UdpSocket>, tx: mpsc::Sender<io::Result<Bytes>>) {
    let mut buf = [0u8; MAX_DATAGRAM_SIZE];

    loop {
        let received = socket
            .recv(&mut buf)
            .await
            .map(|len| Bytes::copy_from_slice(&buf[..len]));

        if tx.send(received).await.is_err() {
            tracing::debug!("Datagram channel closed, stopping receiver");
            break;
        }
    }
}
