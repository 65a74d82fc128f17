//! Transport configuration

use std::net::SocketAddr;
use std::time::Duration;

use crate::session::SessionConfig;

/// Default interval between keepalives
pub const DEFAULT_KEEPALIVE_INTERVAL: Duration = Duration::from_secs(5);

/// Default wait for a datagram before periodic bookkeeping runs
pub const DEFAULT_RECV_WAIT: Duration = Duration::from_secs(5);

/// Default time without a valid packet before giving up
pub const DEFAULT_SERVER_TIMEOUT: Duration = Duration::from_secs(30);

/// Relay connection settings
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Relay `host:port`
    pub server_address: String,

    /// Local address to bind; any address of the relay's family if `None`
    pub source_address: Option<SocketAddr>,

    /// Login and subscription parameters
    pub session: SessionConfig,

    /// Time without a valid packet after which the session is dead
    pub server_timeout: Duration,

    /// Interval between keepalives
    pub keepalive_interval: Duration,

    /// Maximum wait for a datagram per loop iteration
    pub recv_wait: Duration,
}

impl ClientConfig {
    /// Create with default timings
    pub fn new(server_address: impl Into<String>, session: SessionConfig) -> Self {
        Self {
            server_address: server_address.into(),
            source_address: None,
            session,
            server_timeout: DEFAULT_SERVER_TIMEOUT,
            keepalive_interval: DEFAULT_KEEPALIVE_INTERVAL,
            recv_wait: DEFAULT_RECV_WAIT,
        }
    }

    /// Bind to a specific local address
    #[must_use]
    pub fn source_address(mut self, addr: SocketAddr) -> Self {
        self.source_address = Some(addr);
        self
    }

    /// Set server timeout
    #[must_use]
    pub fn server_timeout(mut self, timeout: Duration) -> Self {
        self.server_timeout = timeout;
        self
    }

    /// Set keepalive interval
    #[must_use]
    pub fn keepalive_interval(mut self, interval: Duration) -> Self {
        self.keepalive_interval = interval;
        self
    }

    /// Set receive wait
    #[must_use]
    pub fn recv_wait(mut self, wait: Duration) -> Self {
        self.recv_wait = wait;
        self
    }
}
