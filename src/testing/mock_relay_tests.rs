use std::time::Duration;

use tokio::net::UdpSocket;

use super::mock_relay::{MockRelay, MockRelayConfig};
use crate::protocol::rewind::{
    ConfigurationData, PacketEncoder, PacketType, RewindPacket, VersionData,
};

const WAIT: Duration = Duration::from_secs(2);

async fn client_for(relay: &MockRelay) -> UdpSocket {
    let socket = UdpSocket::bind("127.0.0.1:0").await.unwrap();
    socket.connect(relay.local_addr().unwrap()).await.unwrap();
    socket
}

async fn recv(socket: &UdpSocket) -> RewindPacket {
    let mut buf = [0u8; 2048];
    let len = tokio::time::timeout(WAIT, socket.recv(&mut buf))
        .await
        .unwrap()
        .unwrap();
    RewindPacket::decode(&buf[..len]).unwrap()
}

#[tokio::test]
async fn test_answers_keepalive_and_learns_client() {
    let mut relay = MockRelay::bind().await.unwrap();
    let client = client_for(&relay).await;
    let mut encoder = PacketEncoder::new();

    client
        .send(&encoder.encode(PacketType::KeepAlive, VersionData::recorder(7).encode()))
        .await
        .unwrap();
    let packet = relay.recv_packet(WAIT).await.unwrap();

    assert_eq!(packet.packet_type(), Some(PacketType::KeepAlive));
    assert_eq!(relay.client(), Some(client.local_addr().unwrap()));
    assert_eq!(recv(&client).await.packet_type(), Some(PacketType::KeepAlive));
}

#[tokio::test]
async fn test_echoes_configuration() {
    let mut relay = MockRelay::bind().await.unwrap();
    let client = client_for(&relay).await;
    let payload = ConfigurationData { options: 1 }.encode();

    client
        .send(&PacketEncoder::new().encode(PacketType::Configuration, payload.clone()))
        .await
        .unwrap();
    relay.recv_packet(WAIT).await.unwrap();

    let ack = recv(&client).await;
    assert_eq!(ack.packet_type(), Some(PacketType::Configuration));
    assert_eq!(ack.payload, payload);
}

#[tokio::test]
async fn test_silent_relay_does_not_answer() {
    let mut relay = MockRelay::with_config(MockRelayConfig {
        answer_keepalive: false,
        ..MockRelayConfig::default()
    })
    .await
    .unwrap();
    let client = client_for(&relay).await;

    client
        .send(&PacketEncoder::new().encode(PacketType::KeepAlive, VersionData::recorder(7).encode()))
        .await
        .unwrap();
    relay.recv_packet(WAIT).await.unwrap();

    let mut buf = [0u8; 64];
    let answered =
        tokio::time::timeout(Duration::from_millis(100), client.recv(&mut buf)).await;
    assert!(answered.is_err());
}

#[tokio::test]
async fn test_send_before_client_known() {
    let mut relay = MockRelay::bind().await.unwrap();
    let err = relay.send_close().await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::NotConnected);
}

#[tokio::test]
async fn test_recv_timeout() {
    let mut relay = MockRelay::bind().await.unwrap();
    let err = relay
        .recv_packet(Duration::from_millis(20))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::TimedOut);
    assert!(relay.received().is_empty());
}
