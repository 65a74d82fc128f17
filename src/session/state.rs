//! Login states of a relay session

/// Where the session stands in the login handshake
///
/// The relay drives every transition: the client only answers what it
/// receives. A challenge can arrive at any point and always drops the
/// session back to `Authenticating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LoginState {
    /// Nothing sent yet
    #[default]
    Disconnected,
    /// Keepalive sent, relay has not answered
    AwaitingServer,
    /// Relay answered; configuration request outstanding
    LoggedOut,
    /// Challenge response sent
    Authenticating,
    /// Subscription request outstanding
    Subscribing,
    /// Subscription acknowledged
    LoggedIn,
}

impl LoginState {
    /// Is the subscription active?
    #[must_use]
    pub fn is_logged_in(self) -> bool {
        self == Self::LoggedIn
    }

    /// Has the relay answered at least once?
    #[must_use]
    pub fn has_contact(self) -> bool {
        !matches!(self, Self::Disconnected | Self::AwaitingServer)
    }
}
