use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

use crate::protocol::rewind::DecodeError;

/// Errors that can occur while running the recorder
///
/// Variants split into two classes. Fatal errors end the session: the
/// entry point logs them and exits. Everything else is reported as a
/// warning and the recorder keeps running, possibly with a degraded
/// recording.
#[derive(Debug, Error)]
pub enum CallRecError {
    // ===== Configuration Errors =====
    /// Configuration file could not be read
    #[error("can't read config file {path}: {source}")]
    ConfigRead {
        /// Path of the config file
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Configuration file is not valid JSON for the expected schema
    #[error("error parsing config file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Configuration value is out of range or inconsistent
    #[error("invalid config: {field} - {message}")]
    InvalidConfig {
        /// Offending key
        field: &'static str,
        /// Why it was rejected
        message: String,
    },

    // ===== Connection Errors =====
    /// Relay address could not be resolved
    #[error("can't resolve {address}: {message}")]
    AddressResolution {
        /// Address as configured
        address: String,
        /// Description of the failure
        message: String,
    },

    /// Socket failure
    #[error("network error: {0}")]
    Network(#[from] io::Error),

    /// No valid packet from the relay within the server timeout
    #[error("timeout, disconnected after {duration:?} without a valid packet")]
    ServerTimeout {
        /// Configured server timeout
        duration: Duration,
    },

    /// Relay sent a close request
    #[error("got close request")]
    ServerClosed,

    // ===== Recording Errors =====
    /// A pipe between pipeline stages could not be set up
    #[error("can't get {pipe} pipe for exec command {stage}")]
    PipeSetup {
        /// 1-based stage number
        stage: usize,
        /// Which stream
        pipe: &'static str,
    },

    /// A configured recording command failed to start
    #[error("can't start command {stage} ({program}): {source}")]
    ProcessSpawn {
        /// 1-based stage number
        stage: usize,
        /// Program name
        program: String,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Per-call output file could not be created
    #[error("can't create output file {path}: {source}")]
    OutputFile {
        /// Path that was attempted
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// Per-call file could not be appended to the daily aggregate
    #[error("can't append {call_file} to daily aggregate {aggregate}: {source}")]
    Aggregate {
        /// Finished per-call file
        call_file: PathBuf,
        /// Aggregate file
        aggregate: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    // ===== Packet Errors =====
    /// Malformed datagram
    #[error("invalid packet: {0}")]
    Decode(#[from] DecodeError),
}

impl CallRecError {
    /// Check if this error ends the session
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::OutputFile { .. } | Self::Aggregate { .. } | Self::Decode(_)
        )
    }
}

/// Result type alias for recorder operations
pub type Result<T> = std::result::Result<T, CallRecError>;
