//! Recorder configuration file
//!
//! The JSON keys follow the PascalCase names used by existing recorder
//! deployments, so a `config.json` written for them loads unchanged.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::client::ClientConfig;
use crate::error::{CallRecError, Result};
use crate::protocol::rewind::SessionType;
use crate::recorder::{RecorderConfig, RecordingCommand};
use crate::session::SessionConfig;

/// Session type to subscribe to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionKind {
    /// Talkgroup calls
    #[default]
    Group,
    /// Private calls to an ID
    Private,
}

impl From<SubscriptionKind> for SessionType {
    fn from(kind: SubscriptionKind) -> Self {
        match kind {
            SubscriptionKind::Group => SessionType::GroupVoice,
            SubscriptionKind::Private => SessionType::PrivateVoice,
        }
    }
}

/// Contents of the configuration file
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Config {
    /// Relay host name or address
    pub server_host: String,
    /// Relay UDP port
    pub server_port: u16,
    /// Shared secret for the challenge response
    pub server_password: String,
    /// Local address to bind (`host:port`), empty for any
    #[serde(default)]
    pub source_address: String,
    /// Application ID
    #[serde(rename = "AppID")]
    pub app_id: u32,
    /// Seconds without a valid packet before giving up
    pub server_timeout_seconds: u64,
    /// Talkgroup (or private target) to record
    #[serde(rename = "RecTalkgroupID")]
    pub rec_talkgroup_id: u32,
    /// Group or private subscription
    #[serde(default)]
    pub rec_session_type: SubscriptionKind,
    /// Seconds of silence that end a call
    pub call_hang_time_seconds: u64,
    /// First recording stage
    #[serde(default)]
    pub call_exec_command1: String,
    /// Log the first stage's stderr
    #[serde(default)]
    pub call_exec_command1_show_stderr: bool,
    /// Second recording stage
    #[serde(default)]
    pub call_exec_command2: String,
    /// Log the second stage's stderr
    #[serde(default)]
    pub call_exec_command2_show_stderr: bool,
    /// Third recording stage
    #[serde(default)]
    pub call_exec_command3: String,
    /// Log the third stage's stderr
    #[serde(default)]
    pub call_exec_command3_show_stderr: bool,
    /// Root directory for recordings
    pub output_dir: String,
    /// Recording file extension
    pub output_file_extension: String,
    /// Append calls to daily aggregate files
    #[serde(default)]
    pub create_daily_aggregate_file: bool,
}

impl Config {
    /// Load and validate a configuration file
    ///
    /// # Errors
    ///
    /// Returns `CallRecError::ConfigRead`, `ConfigParse` or `InvalidConfig`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CallRecError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// Parse and validate configuration JSON
    ///
    /// # Errors
    ///
    /// Returns `CallRecError::ConfigParse` or `InvalidConfig`.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the recorder cannot run with
    ///
    /// # Errors
    ///
    /// Returns `CallRecError::InvalidConfig` naming the first bad key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |field: &'static str, message: &str| {
            Err(CallRecError::InvalidConfig {
                field,
                message: message.to_string(),
            })
        };

        if self.server_host.trim().is_empty() {
            return invalid("ServerHost", "must not be empty");
        }
        if self.server_port == 0 {
            return invalid("ServerPort", "must not be 0");
        }
        if self.server_timeout_seconds == 0 {
            return invalid("ServerTimeoutSeconds", "must be at least 1");
        }
        if self.call_hang_time_seconds == 0 {
            return invalid("CallHangTimeSeconds", "must be at least 1");
        }
        if self.output_file_extension.trim().is_empty() {
            return invalid("OutputFileExtension", "must not be empty");
        }
        if !self.source_address.is_empty() && self.source_address.parse::<SocketAddr>().is_err() {
            return invalid("SourceAddress", "must be an ip:port address");
        }

        let slots = self.command_slots();
        let gap = slots
            .windows(2)
            .position(|pair| pair[0].0.trim().is_empty() && !pair[1].0.trim().is_empty());
        if let Some(gap) = gap {
            return invalid(
                ["CallExecCommand2", "CallExecCommand3"][gap],
                "set while the previous command is empty",
            );
        }

        Ok(())
    }

    fn command_slots(&self) -> [(&str, bool); 3] {
        [
            (self.call_exec_command1.as_str(), self.call_exec_command1_show_stderr),
            (self.call_exec_command2.as_str(), self.call_exec_command2_show_stderr),
            (self.call_exec_command3.as_str(), self.call_exec_command3_show_stderr),
        ]
    }

    /// `host:port` of the relay
    #[must_use]
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Transport and session settings
    #[must_use]
    pub fn client_config(&self) -> ClientConfig {
        let session = SessionConfig {
            app_id: self.app_id,
            secret: self.server_password.clone(),
            talkgroup: self.rec_talkgroup_id,
            session_type: self.rec_session_type.into(),
        };

        let mut config = ClientConfig::new(self.server_address(), session)
            .server_timeout(Duration::from_secs(self.server_timeout_seconds));
        if let Ok(addr) = self.source_address.parse() {
            config = config.source_address(addr);
        }
        config
    }

    /// Call recording settings
    #[must_use]
    pub fn recorder_config(&self) -> RecorderConfig {
        let commands = self
            .command_slots()
            .into_iter()
            .take_while(|(line, _)| !line.trim().is_empty())
            .fold(
                RecorderConfig::with_output_dir(PathBuf::from(&self.output_dir)),
                |config, (line, show_stderr)| {
                    config.command(RecordingCommand::new(line, show_stderr))
                },
            );

        commands
            .extension(self.output_file_extension.trim_start_matches('.'))
            .hang_time(Duration::from_secs(self.call_hang_time_seconds))
            .daily_aggregate(self.create_daily_aggregate_file)
    }
}
