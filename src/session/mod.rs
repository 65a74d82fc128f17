//! Relay session handling
//!
//! Login handshake (keepalive, configuration, subscription), challenge
//! re-authentication, and classification of call traffic.

mod relay;
mod state;


pub use relay::{CallSignal, Outcome, RelaySession, Request, SessionConfig};
pub use state::LoginState;
