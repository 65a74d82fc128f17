use bytes::Bytes;

use super::packet::{PacketType, RewindPacket};

/// Builds outgoing packets from a single connection-wide sequence counter
#[derive(Debug, Default)]
pub struct PacketEncoder {
    /// Sequence number given to the next packet
    next_sequence: u32,
}

impl PacketEncoder {
    /// Create an encoder starting at sequence 0
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an encoder starting at a given sequence number
    #[must_use]
    pub fn starting_at(sequence: u32) -> Self {
        Self {
            next_sequence: sequence,
        }
    }

    /// Sequence number the next packet will carry
    #[must_use]
    pub fn next_sequence(&self) -> u32 {
        self.next_sequence
    }

    /// Stamp a payload with the next sequence number
    pub fn packet(&mut self, packet_type: PacketType, payload: impl Into<Bytes>) -> RewindPacket {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        RewindPacket::new(packet_type, sequence, payload)
    }

    /// Stamp and encode in one step
    pub fn encode(&mut self, packet_type: PacketType, payload: impl Into<Bytes>) -> Bytes {
        self.packet(packet_type, payload).encode()
    }
}
