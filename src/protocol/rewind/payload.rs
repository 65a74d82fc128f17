//! Fixed-layout REWIND payloads
//!
//! All integers are little-endian. Each payload encodes to exactly
//! `SIZE` bytes.

use bytes::{BufMut, Bytes, BytesMut};
use byteorder::{ByteOrder, LittleEndian};
use sha2::{Digest, Sha256};

use super::constants::{
    CALLSIGN_LENGTH, CHALLENGE_RESPONSE_SIZE, DESCRIPTION_LENGTH, SERVICE_SIMPLE_APPLICATION,
    VERSION_DESCRIPTION,
};
use super::field::{Callsign, FixedField};
use super::packet::DecodeError;

fn ensure_len(kind: &'static str, buf: &[u8], needed: usize) -> Result<(), DecodeError> {
    if buf.len() < needed {
        return Err(DecodeError::PayloadTooShort {
            kind,
            needed,
            have: buf.len(),
        });
    }
    Ok(())
}

/// Voice session types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SessionType {
    /// Private (one-to-one) voice call
    PrivateVoice,
    /// Group (talkgroup) voice call
    #[default]
    GroupVoice,
    /// Any other code seen on the wire
    Other(u32),
}

impl SessionType {
    /// Wire code
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::PrivateVoice => 5,
            Self::GroupVoice => 7,
            Self::Other(code) => code,
        }
    }

    /// Parse from the wire code
    #[must_use]
    pub fn from_code(code: u32) -> Self {
        match code {
            5 => Self::PrivateVoice,
            7 => Self::GroupVoice,
            other => Self::Other(other),
        }
    }

    /// Short label used in call log lines
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::PrivateVoice => "private",
            _ => "group",
        }
    }
}

/// Keepalive payload: who we are and what software is talking
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionData {
    /// Application ID registered with the relay
    pub remote_id: u32,
    /// Service code
    pub service: u8,
    /// Software description
    pub description: FixedField<DESCRIPTION_LENGTH>,
}

impl VersionData {
    /// Encoded size
    pub const SIZE: usize = 5 + DESCRIPTION_LENGTH;

    /// Version data for this recorder
    #[must_use]
    pub fn recorder(remote_id: u32) -> Self {
        Self {
            remote_id,
            service: SERVICE_SIMPLE_APPLICATION,
            description: FixedField::pad(VERSION_DESCRIPTION),
        }
    }

    /// Encode to bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_u32_le(self.remote_id);
        buf.put_u8(self.service);
        buf.put_slice(self.description.as_bytes());
        buf.freeze()
    }

    /// Decode from a payload
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::PayloadTooShort` if fewer than `SIZE` bytes are given.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("version", buf, Self::SIZE)?;
        Ok(Self {
            remote_id: LittleEndian::read_u32(&buf[0..4]),
            service: buf[4],
            description: FixedField::from_slice(&buf[5..Self::SIZE]),
        })
    }
}

/// Configuration request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigurationData {
    /// Option bits
    pub options: u32,
}

impl ConfigurationData {
    /// Encoded size
    pub const SIZE: usize = 4;

    /// Encode to bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        Bytes::copy_from_slice(&self.options.to_le_bytes())
    }

    /// Decode from a payload
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::PayloadTooShort` if fewer than `SIZE` bytes are given.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("configuration", buf, Self::SIZE)?;
        Ok(Self {
            options: LittleEndian::read_u32(buf),
        })
    }
}

/// Subscription request payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriptionData {
    /// Session type to subscribe to
    pub session_type: SessionType,
    /// Talkgroup or private target
    pub dst_id: u32,
}

impl SubscriptionData {
    /// Encoded size
    pub const SIZE: usize = 8;

    /// Encode to bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_u32_le(self.session_type.code());
        buf.put_u32_le(self.dst_id);
        buf.freeze()
    }

    /// Decode from a payload
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::PayloadTooShort` if fewer than `SIZE` bytes are given.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("subscription", buf, Self::SIZE)?;
        Ok(Self {
            session_type: SessionType::from_code(LittleEndian::read_u32(&buf[0..4])),
            dst_id: LittleEndian::read_u32(&buf[4..8]),
        })
    }
}

/// Super header: the identity of a call
///
/// Two headers describe the same call iff every field matches,
/// including callsign padding bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SuperHeader {
    /// Group or private voice
    pub session_type: SessionType,
    /// Source radio ID
    pub src_id: u32,
    /// Destination (talkgroup or radio) ID
    pub dst_id: u32,
    /// Source callsign
    pub src_call: Callsign,
    /// Destination callsign
    pub dst_call: Callsign,
}

impl SuperHeader {
    /// Encoded size
    pub const SIZE: usize = 12 + 2 * CALLSIGN_LENGTH;

    /// Encode to bytes
    #[must_use]
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(Self::SIZE);
        buf.put_u32_le(self.session_type.code());
        buf.put_u32_le(self.src_id);
        buf.put_u32_le(self.dst_id);
        buf.put_slice(self.src_call.as_bytes());
        buf.put_slice(self.dst_call.as_bytes());
        buf.freeze()
    }

    /// Decode from a payload
    ///
    /// # Errors
    ///
    /// Returns `DecodeError::PayloadTooShort` if fewer than `SIZE` bytes are given.
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        ensure_len("super header", buf, Self::SIZE)?;
        let calls = &buf[12..];
        Ok(Self {
            session_type: SessionType::from_code(LittleEndian::read_u32(&buf[0..4])),
            src_id: LittleEndian::read_u32(&buf[4..8]),
            dst_id: LittleEndian::read_u32(&buf[8..12]),
            src_call: Callsign::from_slice(&calls[..CALLSIGN_LENGTH]),
            dst_call: Callsign::from_slice(&calls[CALLSIGN_LENGTH..2 * CALLSIGN_LENGTH]),
        })
    }
}

/// Compute the response to a relay challenge
///
/// The response is `SHA-256(challenge || secret)`.
#[must_use]
pub fn challenge_response(challenge: &[u8], secret: &str) -> [u8; CHALLENGE_RESPONSE_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(challenge);
    hasher.update(secret.as_bytes());

    let mut response = [0u8; CHALLENGE_RESPONSE_SIZE];
    response.copy_from_slice(&hasher.finalize());
    response
}
