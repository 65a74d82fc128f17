//! Relay session state machine
//!
//! Reacts to decoded packets, tracks the login handshake and tells the
//! caller what to send back and what call activity was seen. It never
//! touches the socket or the recorder itself.

use bytes::Bytes;

use super::state::LoginState;
use crate::error::{CallRecError, Result};
use crate::protocol::rewind::constants::{CHALLENGE_RESPONSE_SIZE, OPTION_SUPER_HEADER};
use crate::protocol::rewind::{
    ConfigurationData, PacketType, RewindPacket, SessionType, SubscriptionData, SuperHeader,
    VersionData, challenge_response,
};

/// Session parameters
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Application ID sent in keepalives
    pub app_id: u32,
    /// Shared secret for the challenge response
    pub secret: String,
    /// Talkgroup (or private target) to subscribe to
    pub talkgroup: u32,
    /// Session type to subscribe to
    pub session_type: SessionType,
}

/// A packet the session wants sent to the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Keepalive with version data
    KeepAlive(VersionData),
    /// Ask the relay to forward super headers
    Configuration(ConfigurationData),
    /// Subscribe to a talkgroup
    Subscription(SubscriptionData),
    /// Answer a challenge
    ChallengeResponse([u8; CHALLENGE_RESPONSE_SIZE]),
}

impl Request {
    /// Packet type carrying this request
    #[must_use]
    pub fn packet_type(&self) -> PacketType {
        match self {
            Self::KeepAlive(_) => PacketType::KeepAlive,
            Self::Configuration(_) => PacketType::Configuration,
            Self::Subscription(_) => PacketType::Subscription,
            Self::ChallengeResponse(_) => PacketType::Authentication,
        }
    }

    /// Encoded payload
    #[must_use]
    pub fn payload(&self) -> Bytes {
        match self {
            Self::KeepAlive(data) => data.encode(),
            Self::Configuration(data) => data.encode(),
            Self::Subscription(data) => data.encode(),
            Self::ChallengeResponse(response) => Bytes::copy_from_slice(response),
        }
    }
}

/// Call activity seen on the relay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallSignal {
    /// A call with this identity is on air
    SuperHeader(SuperHeader),
    /// The current call ended
    Terminator,
    /// Audio payload for the current call
    AudioFrame(Bytes),
}

/// What a received packet amounted to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Not understood; does not count as relay activity
    Invalid,
    /// Understood, nothing to do
    Handled,
    /// Answer the relay
    Reply(Request),
    /// Forward to the call tracker
    Call(CallSignal),
}

impl Outcome {
    /// Did the packet count as valid relay activity?
    #[must_use]
    pub fn is_valid(&self) -> bool {
        !matches!(self, Self::Invalid)
    }
}

/// Login state for one relay connection
#[derive(Debug)]
pub struct RelaySession {
    config: SessionConfig,
    state: LoginState,
}

impl RelaySession {
    /// Create a session that has not sent anything yet
    #[must_use]
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            state: LoginState::Disconnected,
        }
    }

    /// Current login state
    #[must_use]
    pub fn state(&self) -> LoginState {
        self.state
    }

    /// Is the subscription active?
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.state.is_logged_in()
    }

    /// Keepalive to send now
    pub fn keepalive(&mut self) -> Request {
        if self.state == LoginState::Disconnected {
            self.state = LoginState::AwaitingServer;
        }
        Request::KeepAlive(VersionData::recorder(self.config.app_id))
    }

    /// Handle a decoded packet
    ///
    /// # Errors
    ///
    /// Returns `CallRecError::ServerClosed` when the relay closes the
    /// connection. Every other packet, however malformed, yields an
    /// `Outcome`.
    pub fn handle_packet(&mut self, packet: &RewindPacket) -> Result<Outcome> {
        let Some(packet_type) = packet.packet_type() else {
            tracing::debug!("Unknown packet type 0x{:04x}", packet.type_code);
            return Ok(Outcome::Invalid);
        };

        let outcome = match packet_type {
            PacketType::KeepAlive => self.on_keepalive(),
            PacketType::Configuration => self.on_configuration_ack(),
            PacketType::Subscription => self.on_subscription_ack(),
            PacketType::Challenge => self.on_challenge(&packet.payload),
            PacketType::Report => {
                tracing::info!("server report: {}", payload_text(&packet.payload));
                Outcome::Handled
            }
            PacketType::FailureCode => {
                log_failure_code(&packet.payload);
                Outcome::Handled
            }
            PacketType::SuperHeader => match SuperHeader::decode(&packet.payload) {
                Ok(header) => Outcome::Call(CallSignal::SuperHeader(header)),
                Err(e) => {
                    tracing::warn!("Dropping super header: {}", e);
                    Outcome::Invalid
                }
            },
            PacketType::TerminatorWithLc => Outcome::Call(CallSignal::Terminator),
            PacketType::AudioFrame => {
                Outcome::Call(CallSignal::AudioFrame(packet.payload.clone()))
            }
            PacketType::Close => return Err(CallRecError::ServerClosed),
            PacketType::Authentication => Outcome::Invalid,
        };

        Ok(outcome)
    }

    fn on_keepalive(&mut self) -> Outcome {
        if self.state.is_logged_in() {
            return Outcome::Handled;
        }
        if !matches!(self.state, LoginState::LoggedOut | LoginState::Subscribing) {
            self.state = LoginState::LoggedOut;
        }
        Outcome::Reply(Request::Configuration(ConfigurationData {
            options: OPTION_SUPER_HEADER,
        }))
    }

    fn on_configuration_ack(&mut self) -> Outcome {
        tracing::info!("got configuration ack");
        if self.state.is_logged_in() {
            return Outcome::Handled;
        }
        self.state = LoginState::Subscribing;
        Outcome::Reply(Request::Subscription(SubscriptionData {
            session_type: self.config.session_type,
            dst_id: self.config.talkgroup,
        }))
    }

    fn on_subscription_ack(&mut self) -> Outcome {
        tracing::info!("got subscription ack");
        if self.state == LoginState::Subscribing {
            tracing::info!("logged in, talkgroup {}", self.config.talkgroup);
            self.state = LoginState::LoggedIn;
        } else if !self.state.is_logged_in() {
            tracing::debug!("Ignoring subscription ack in state {:?}", self.state);
        }
        Outcome::Handled
    }

    fn on_challenge(&mut self, challenge: &[u8]) -> Outcome {
        tracing::info!("got challenge");
        self.state = LoginState::Authenticating;
        Outcome::Reply(Request::ChallengeResponse(challenge_response(
            challenge,
            &self.config.secret,
        )))
    }
}

fn payload_text(payload: &[u8]) -> String {
    String::from_utf8_lossy(payload)
        .trim_matches('\0')
        .trim()
        .to_string()
}

fn log_failure_code(payload: &[u8]) {
    match <[u8; 4]>::try_from(payload.get(..4).unwrap_or_default()) {
        Ok(code) => tracing::warn!("got failure code: {}", u32::from_le_bytes(code)),
        Err(_) => tracing::warn!("got failure code: {:02x?}", payload),
    }
}
