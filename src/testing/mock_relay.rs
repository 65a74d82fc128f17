//! Mock REWIND relay for testing purposes.
//!
//! Binds a loopback UDP socket and plays the server side of the login
//! handshake: keepalives are answered with a keepalive, configuration and
//! subscription requests are acknowledged by echoing them. Call traffic,
//! challenges and close requests are sent explicitly by the test.

use std::io;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;

use crate::protocol::rewind::constants::MAX_DATAGRAM_SIZE;
use crate::protocol::rewind::{PacketEncoder, PacketType, RewindPacket, SuperHeader};

/// Configuration for the mock relay.
#[derive(Debug, Clone)]
pub struct MockRelayConfig {
    /// Answer keepalives with a keepalive.
    pub answer_keepalive: bool,
    /// Acknowledge configuration requests.
    pub ack_configuration: bool,
    /// Acknowledge subscription requests.
    pub ack_subscription: bool,
}

impl Default for MockRelayConfig {
    fn default() -> Self {
        Self {
            answer_keepalive: true,
            ack_configuration: true,
            ack_subscription: true,
        }
    }
}

/// A mock relay serving one client.
#[derive(Debug)]
pub struct MockRelay {
    config: MockRelayConfig,
    socket: UdpSocket,
    client: Option<SocketAddr>,
    encoder: PacketEncoder,
    received: Vec<RewindPacket>,
}

impl MockRelay {
    /// Bind on an ephemeral loopback port with the default behaviour.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub async fn bind() -> io::Result<Self> {
        Self::with_config(MockRelayConfig::default()).await
    }

    /// Bind on an ephemeral loopback port.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket cannot be bound.
    pub async fn with_config(config: MockRelayConfig) -> io::Result<Self> {
        let socket = UdpSocket::bind("127.0.0.1:0").await?;
        Ok(Self {
            config,
            socket,
            client: None,
            encoder: PacketEncoder::new(),
            received: Vec::new(),
        })
    }

    /// Address clients should connect to.
    ///
    /// # Errors
    ///
    /// Returns an error if the socket address cannot be queried.
    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Address of the client, once it has sent something.
    #[must_use]
    pub fn client(&self) -> Option<SocketAddr> {
        self.client
    }

    /// Every packet received so far, in arrival order.
    #[must_use]
    pub fn received(&self) -> &[RewindPacket] {
        &self.received
    }

    /// Receive one packet and answer it as configured.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if nothing arrives within `wait`, `InvalidData`
    /// for a datagram that does not decode, or a socket error.
    pub async fn recv_packet(&mut self, wait: Duration) -> io::Result<RewindPacket> {
        let mut buf = [0u8; MAX_DATAGRAM_SIZE];
        let (len, from) = tokio::time::timeout(wait, self.socket.recv_from(&mut buf))
            .await
            .map_err(|_| io::Error::new(io::ErrorKind::TimedOut, "no packet from client"))??;
        self.client = Some(from);

        let packet = RewindPacket::decode(&buf[..len])
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        self.answer(&packet).await?;
        self.received.push(packet.clone());
        Ok(packet)
    }

    /// Receive until a packet of the given type arrives.
    ///
    /// Packets of other types are answered and recorded along the way.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if no such packet arrives within `wait`.
    pub async fn wait_for(
        &mut self,
        packet_type: PacketType,
        wait: Duration,
    ) -> io::Result<RewindPacket> {
        let deadline = tokio::time::Instant::now() + wait;
        loop {
            let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
            let packet = self.recv_packet(remaining).await?;
            if packet.packet_type() == Some(packet_type) {
                return Ok(packet);
            }
        }
    }

    /// Wait until the client's subscription has been acknowledged.
    ///
    /// # Errors
    ///
    /// Returns `TimedOut` if the client does not subscribe within `wait`.
    pub async fn wait_logged_in(&mut self, wait: Duration) -> io::Result<RewindPacket> {
        self.wait_for(PacketType::Subscription, wait).await
    }

    /// Send a raw datagram to the client.
    ///
    /// # Errors
    ///
    /// Returns `NotConnected` if the client has not been heard from yet.
    pub async fn send_raw(&self, datagram: &[u8]) -> io::Result<()> {
        let client = self
            .client
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotConnected, "no client yet"))?;
        self.socket.send_to(datagram, client).await?;
        Ok(())
    }

    /// Send a packet to the client.
    ///
    /// # Errors
    ///
    /// Returns an error if the client is unknown or the send fails.
    pub async fn send(
        &mut self,
        packet_type: PacketType,
        payload: impl Into<Bytes>,
    ) -> io::Result<()> {
        let datagram = self.encoder.encode(packet_type, payload);
        self.send_raw(&datagram).await
    }

    /// Ask the client to re-authenticate.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails.
    pub async fn send_challenge(&mut self, challenge: &[u8]) -> io::Result<()> {
        self.send(PacketType::Challenge, Bytes::copy_from_slice(challenge))
            .await
    }

    /// Announce a call.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails.
    pub async fn send_super_header(&mut self, header: &SuperHeader) -> io::Result<()> {
        self.send(PacketType::SuperHeader, header.encode()).await
    }

    /// Send one audio frame.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails.
    pub async fn send_audio(&mut self, frame: &[u8]) -> io::Result<()> {
        self.send(PacketType::AudioFrame, Bytes::copy_from_slice(frame))
            .await
    }

    /// End the current call.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails.
    pub async fn send_terminator(&mut self) -> io::Result<()> {
        self.send(PacketType::TerminatorWithLc, Bytes::new()).await
    }

    /// Send a text report.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails.
    pub async fn send_report(&mut self, text: &str) -> io::Result<()> {
        self.send(PacketType::Report, Bytes::copy_from_slice(text.as_bytes()))
            .await
    }

    /// Close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the send fails.
    pub async fn send_close(&mut self) -> io::Result<()> {
        self.send(PacketType::Close, Bytes::new()).await
    }

    async fn answer(&mut self, packet: &RewindPacket) -> io::Result<()> {
        let reply = match packet.packet_type() {
            Some(PacketType::KeepAlive) if self.config.answer_keepalive => {
                Some((PacketType::KeepAlive, Bytes::new()))
            }
            Some(PacketType::Configuration) if self.config.ack_configuration => {
                Some((PacketType::Configuration, packet.payload.clone()))
            }
            Some(PacketType::Subscription) if self.config.ack_subscription => {
                Some((PacketType::Subscription, packet.payload.clone()))
            }
            _ => None,
        };

        if let Some((packet_type, payload)) = reply {
            self.send(packet_type, payload).await?;
        }
        Ok(())
    }
}
