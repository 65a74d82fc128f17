//! Relay connection
//!
//! Owns the UDP socket and runs the single event loop that feeds the
//! session state machine and the call tracker.

mod config;
mod relay_client;


pub use config::{
    ClientConfig, DEFAULT_KEEPALIVE_INTERVAL, DEFAULT_RECV_WAIT, DEFAULT_SERVER_TIMEOUT,
};
pub use relay_client::RelayClient;
