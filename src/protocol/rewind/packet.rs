use bytes::{BufMut, Bytes, BytesMut};
use byteorder::{ByteOrder, LittleEndian};
use thiserror::Error;

use super::constants::{
    CLASS_APPLICATION, CLASS_REWIND_CONTROL, CLASS_SYSTEM_CONSOLE, HEADER_SIZE, SIGNATURE,
};

/// REWIND packet types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum PacketType {
    /// Keepalive carrying version data
    KeepAlive = CLASS_REWIND_CONTROL,
    /// Relay closes the connection
    Close = CLASS_REWIND_CONTROL + 1,
    /// Relay asks for (re-)authentication
    Challenge = CLASS_REWIND_CONTROL + 2,
    /// Challenge response
    Authentication = CLASS_REWIND_CONTROL + 3,
    /// Free-form server report
    Report = CLASS_SYSTEM_CONSOLE,
    /// Configuration request / ack
    Configuration = CLASS_APPLICATION,
    /// Subscription request / ack
    Subscription = CLASS_APPLICATION + 0x01,
    /// DMR terminator with link control (call ended)
    TerminatorWithLc = CLASS_APPLICATION + 0x12,
    /// DMR audio frame
    AudioFrame = CLASS_APPLICATION + 0x20,
    /// Super header (call identity)
    SuperHeader = CLASS_APPLICATION + 0x28,
    /// Failure code
    FailureCode = CLASS_APPLICATION + 0x29,
}

impl PacketType {
    /// Parse from the wire code
    #[must_use]
    pub fn from_code(code: u16) -> Option<Self> {
        match code {
            0x0000 => Some(Self::KeepAlive),
            0x0001 => Some(Self::Close),
            0x0002 => Some(Self::Challenge),
            0x0003 => Some(Self::Authentication),
            0x0100 => Some(Self::Report),
            0x0900 => Some(Self::Configuration),
            0x0901 => Some(Self::Subscription),
            0x0912 => Some(Self::TerminatorWithLc),
            0x0920 => Some(Self::AudioFrame),
            0x0928 => Some(Self::SuperHeader),
            0x0929 => Some(Self::FailureCode),
            _ => None,
        }
    }

    /// Wire code
    #[must_use]
    pub fn code(self) -> u16 {
        self as u16
    }
}

/// Packet decode errors
///
/// All of these are local to a single datagram: the caller drops the
/// datagram and carries on.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    /// Datagram does not start with the protocol signature
    #[error("missing REWIND signature")]
    BadSignature,

    /// Datagram shorter than the envelope
    #[error("buffer too small: need {needed} bytes, have {have}")]
    BufferTooSmall {
        /// Bytes required
        needed: usize,
        /// Bytes available
        have: usize,
    },

    /// Declared payload length exceeds the datagram
    #[error("invalid payload length: declared {declared}, available {available}")]
    TruncatedPayload {
        /// Payload length from the envelope
        declared: usize,
        /// Bytes left after the envelope
        available: usize,
    },

    /// Payload shorter than its fixed layout
    #[error("{kind} payload too short: need {needed} bytes, have {have}")]
    PayloadTooShort {
        /// Payload variant being decoded
        kind: &'static str,
        /// Bytes required
        needed: usize,
        /// Bytes available
        have: usize,
    },
}

/// True if the datagram starts with the REWIND signature
#[must_use]
pub fn has_signature(buf: &[u8]) -> bool {
    buf.starts_with(SIGNATURE)
}

/// A REWIND datagram: envelope plus payload
///
/// The type is kept as the raw wire code so that packets of unknown type
/// survive a decode/encode cycle unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewindPacket {
    /// Raw packet type code
    pub type_code: u16,
    /// Envelope flags
    pub flags: u16,
    /// Sender's sequence number
    pub sequence: u32,
    /// Payload bytes
    pub payload: Bytes,
}

impl RewindPacket {
    /// Create a packet with no flags set
    #[must_use]
    pub fn new(packet_type: PacketType, sequence: u32, payload: impl Into<Bytes>) -> Self {
        Self {
            type_code: packet_type.code(),
            flags: 0,
            sequence,
            payload: payload.into(),
        }
    }

    /// Known packet type, if any
    #[must_use]
    pub fn packet_type(&self) -> Option<PacketType> {
        PacketType::from_code(self.type_code)
    }

    /// Encoded size in bytes
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Encode packet to bytes
    ///
    /// Payloads longer than `u16::MAX` cannot be described by the envelope
    /// and are truncated to that length.
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let payload_len = u16::try_from(self.payload.len()).unwrap_or(u16::MAX);
        let payload = &self.payload[..usize::from(payload_len)];

        let mut buf = BytesMut::with_capacity(HEADER_SIZE + payload.len());
        buf.put_slice(SIGNATURE);
        buf.put_u16_le(self.type_code);
        buf.put_u16_le(self.flags);
        buf.put_u32_le(self.sequence);
        buf.put_u16_le(payload_len);
        buf.put_slice(payload);
        buf.freeze()
    }

    /// Decode a datagram
    ///
    /// Bytes after the declared payload are ignored.
    ///
    /// # Errors
    ///
    /// Returns `DecodeError` if the signature is wrong, the envelope is
    /// incomplete, or the declared payload cannot be read in full.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        if !has_signature(buf) {
            return Err(DecodeError::BadSignature);
        }
        if buf.len() < HEADER_SIZE {
            return Err(DecodeError::BufferTooSmall {
                needed: HEADER_SIZE,
                have: buf.len(),
            });
        }

        let type_code = LittleEndian::read_u16(&buf[8..10]);
        let flags = LittleEndian::read_u16(&buf[10..12]);
        let sequence = LittleEndian::read_u32(&buf[12..16]);
        let declared = usize::from(LittleEndian::read_u16(&buf[16..18]));

        let rest = &buf[HEADER_SIZE..];
        if declared > rest.len() {
            return Err(DecodeError::TruncatedPayload {
                declared,
                available: rest.len(),
            });
        }

        Ok(Self {
            type_code,
            flags,
            sequence,
            payload: Bytes::copy_from_slice(&rest[..declared]),
        })
    }
}
