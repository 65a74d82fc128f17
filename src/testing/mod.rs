//! Test helpers
//!
//! An in-process relay that plays the server side of the protocol over
//! loopback UDP.

pub mod mock_relay;
#[cfg(test)]
mod mock_relay_tests;

pub use mock_relay::{MockRelay, MockRelayConfig};
