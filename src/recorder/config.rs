//! Recorder configuration

use std::path::PathBuf;
use std::time::Duration;

use super::command::RecordingCommand;

/// Maximum number of chained recording commands
pub const MAX_COMMANDS: usize = 3;

/// Call recorder configuration
#[derive(Debug, Clone)]
pub struct RecorderConfig {
    /// Root directory for recordings
    pub output_dir: PathBuf,

    /// Extension of per-call and aggregate files (without the dot)
    pub extension: String,

    /// Idle time after which an unterminated call is closed
    pub hang_time: Duration,

    /// Append each finished call to a per-day aggregate file
    pub daily_aggregate: bool,

    /// Recording stages, first stage fed with audio payload
    pub commands: Vec<RecordingCommand>,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("recordings"),
            extension: "raw".to_string(),
            hang_time: Duration::from_secs(3),
            daily_aggregate: false,
            commands: Vec::new(),
        }
    }
}

impl RecorderConfig {
    /// Create with a custom output directory
    pub fn with_output_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: dir.into(),
            ..Default::default()
        }
    }

    /// Set file extension
    #[must_use]
    pub fn extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set hang time
    #[must_use]
    pub fn hang_time(mut self, hang_time: Duration) -> Self {
        self.hang_time = hang_time;
        self
    }

    /// Enable or disable daily aggregate files
    #[must_use]
    pub fn daily_aggregate(mut self, enabled: bool) -> Self {
        self.daily_aggregate = enabled;
        self
    }

    /// Append a recording stage; stages beyond `MAX_COMMANDS` are ignored
    #[must_use]
    pub fn command(mut self, command: RecordingCommand) -> Self {
        if self.commands.len() < MAX_COMMANDS {
            self.commands.push(command);
        } else {
            tracing::warn!("Ignoring recording command beyond {}", MAX_COMMANDS);
        }
        self
    }
}
