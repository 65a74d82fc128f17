//! REWIND relay protocol
//!
//! Every datagram starts with the `REWIND01` signature followed by a
//! little-endian envelope (type, flags, sequence number, payload length)
//! and a fixed-layout payload keyed by the packet type.

mod codec;
mod field;
mod packet;
mod payload;

#[cfg(test)]
mod codec_tests;

pub use codec::PacketEncoder;
pub use field::{Callsign, FixedField};
pub use packet::{DecodeError, PacketType, RewindPacket, has_signature};
pub use payload::{
    ConfigurationData, SessionType, SubscriptionData, SuperHeader, VersionData,
    challenge_response,
};

/// REWIND protocol constants
pub mod constants {
    /// Signature at the start of every datagram
    pub const SIGNATURE: &[u8; 8] = b"REWIND01";

    /// Envelope size: signature + type + flags + sequence + payload length
    pub const HEADER_SIZE: usize = SIGNATURE.len() + 10;

    /// Largest datagram the client reads
    pub const MAX_DATAGRAM_SIZE: usize = 2048;

    /// Packet class bases
    pub const CLASS_REWIND_CONTROL: u16 = 0x0000;
    /// System console class
    pub const CLASS_SYSTEM_CONSOLE: u16 = 0x0100;
    /// Application class
    pub const CLASS_APPLICATION: u16 = 0x0900;

    /// Simple application service advertised in keepalives
    pub const SERVICE_SIMPLE_APPLICATION: u8 = 0x20;

    /// Software description sent in keepalives
    pub const VERSION_DESCRIPTION: &str = "Call recorder";

    /// Width of the description field in keepalives
    pub const DESCRIPTION_LENGTH: usize = VERSION_DESCRIPTION.len();

    /// Configuration option asking the relay to forward super headers
    pub const OPTION_SUPER_HEADER: u32 = 1 << 0;

    /// Width of callsign fields in super headers
    pub const CALLSIGN_LENGTH: usize = 10;

    /// Challenge response size (SHA-256 digest)
    pub const CHALLENGE_RESPONSE_SIZE: usize = 32;
}
