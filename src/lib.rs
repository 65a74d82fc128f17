//! # rewind-callrec
//!
//! A call recorder for REWIND relay servers.
//!
//! ## Features
//!
//! - REWIND login handshake with challenge re-authentication
//! - Talkgroup or private call subscription
//! - One external command pipeline per recorded call
//! - Per-call files and optional daily aggregate files
//!
//! ## Example
//!
//! ```rust,no_run
//! use rewind_callrec::{CallTracker, Config, RelayClient};
//!
//! # async fn example() -> Result<(), rewind_callrec::CallRecError> {
//! let config = Config::from_file("config.json")?;
//! let tracker = CallTracker::new(config.recorder_config());
//!
//! let mut client = RelayClient::connect(config.client_config(), tracker).await?;
//! client.run().await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! - **Transport**: `RelayClient` - UDP socket and the event loop
//! - **Session**: `RelaySession` - login state machine, no I/O
//! - **Recording**: `CallTracker` - call boundaries and process pipelines
//! - **Protocol**: `protocol::rewind` - packet codec

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod client;
pub mod config;
/// Error types
pub mod error;
pub mod protocol;
pub mod recorder;
pub mod session;

/// Testing utilities
pub mod testing;

// Re-exports
pub use client::{ClientConfig, RelayClient};
pub use config::Config;
pub use error::{CallRecError, Result};
pub use recorder::{CallTracker, RecorderConfig, RecordingCommand};
pub use session::{LoginState, RelaySession, SessionConfig};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
