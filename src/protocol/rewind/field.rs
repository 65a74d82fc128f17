//! Zero-padded fixed-width byte fields
//!
//! Callsigns and the keepalive description travel as fixed-size arrays
//! padded with zero bytes. They are never null-terminated strings: the
//! whole array is significant for equality, and text is recovered by
//! trimming the padding.

use std::fmt;

use super::constants::CALLSIGN_LENGTH;

/// A fixed-width byte field padded with zeros
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct FixedField<const N: usize>([u8; N]);

/// Callsign field as carried in super headers
pub type Callsign = FixedField<CALLSIGN_LENGTH>;

impl<const N: usize> FixedField<N> {
    /// Field width in bytes
    pub const WIDTH: usize = N;

    /// An all-zero field
    #[must_use]
    pub const fn empty() -> Self {
        Self([0u8; N])
    }

    /// Wrap raw bytes as received on the wire
    #[must_use]
    pub const fn from_bytes(bytes: [u8; N]) -> Self {
        Self(bytes)
    }

    /// Copy from a slice, truncating or zero-padding to the field width
    #[must_use]
    pub fn from_slice(bytes: &[u8]) -> Self {
        let mut out = [0u8; N];
        let len = bytes.len().min(N);
        out[..len].copy_from_slice(&bytes[..len]);
        Self(out)
    }

    /// Pad a string into the field; text longer than the field is truncated
    #[must_use]
    pub fn pad(text: &str) -> Self {
        Self::from_slice(text.as_bytes())
    }

    /// Raw bytes including padding
    #[must_use]
    pub fn as_bytes(&self) -> &[u8; N] {
        &self.0
    }

    /// Text with zero padding trimmed from both ends
    #[must_use]
    pub fn trimmed(&self) -> String {
        String::from_utf8_lossy(&self.0)
            .trim_matches('\0')
            .to_string()
    }

    /// True when the field holds no text
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl<const N: usize> Default for FixedField<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> fmt::Debug for FixedField<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.trimmed())
    }
}

impl<const N: usize> fmt::Display for FixedField<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.trimmed())
    }
}

impl<const N: usize> From<&str> for FixedField<N> {
    fn from(text: &str) -> Self {
        Self::pad(text)
    }
}
