use super::codec::*;
use super::packet::{PacketType, RewindPacket};

#[test]
fn test_sequence_increments_per_packet() {
    let mut encoder = PacketEncoder::new();

    let first = encoder.packet(PacketType::KeepAlive, Vec::new());
    let second = encoder.packet(PacketType::Configuration, vec![1, 0, 0, 0]);
    let third = encoder.encode(PacketType::Subscription, vec![0u8; 8]);

    assert_eq!(first.sequence, 0);
    assert_eq!(second.sequence, 1);
    assert_eq!(RewindPacket::decode(&third).unwrap().sequence, 2);
    assert_eq!(encoder.next_sequence(), 3);
}

#[test]
fn test_sequence_wraps() {
    let mut encoder = PacketEncoder::starting_at(u32::MAX);

    assert_eq!(encoder.packet(PacketType::KeepAlive, Vec::new()).sequence, u32::MAX);
    assert_eq!(encoder.packet(PacketType::KeepAlive, Vec::new()).sequence, 0);
}
