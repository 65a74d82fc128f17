//! Call boundary detection
//!
//! At most one call is recorded at a time. A super header opens a call; a
//! different super header, a terminator, or silence longer than the hang
//! time closes it.

use std::fs::{self, File};
use std::path::Path;
use std::time::Instant;

use chrono::{Local, NaiveDateTime};

use super::aggregate::append_to_aggregate;
use super::call::{ActiveCall, FinishedCall};
use super::command::ExpandedCommand;
use super::config::RecorderConfig;
use super::paths;
use super::pipeline::{Pipeline, StageExit};
use crate::error::{CallRecError, Result};
use crate::protocol::rewind::SuperHeader;
use crate::session::CallSignal;

/// Tracks the call being recorded
#[derive(Debug)]
pub struct CallTracker {
    config: RecorderConfig,
    active: Option<ActiveCall>,
}

impl CallTracker {
    /// Create an idle tracker
    #[must_use]
    pub fn new(config: RecorderConfig) -> Self {
        Self {
            config,
            active: None,
        }
    }

    /// Tracker configuration
    #[must_use]
    pub fn config(&self) -> &RecorderConfig {
        &self.config
    }

    /// The call being recorded, if any
    #[must_use]
    pub fn active_call(&self) -> Option<&ActiveCall> {
        self.active.as_ref()
    }

    /// Is a call being recorded?
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active.is_some()
    }

    /// Route call activity from the session
    ///
    /// Returns the call that was finalised as a result, if any.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if a new call's pipeline cannot be started.
    pub fn handle(&mut self, signal: CallSignal) -> Result<Option<FinishedCall>> {
        match signal {
            CallSignal::SuperHeader(header) => self.on_super_header(header),
            CallSignal::Terminator => Ok(self.on_terminator()),
            CallSignal::AudioFrame(payload) => {
                self.on_audio_frame(&payload);
                Ok(None)
            }
        }
    }

    /// A super header was seen
    ///
    /// A header different from the active call's closes that call first;
    /// with no call active a new one starts.
    ///
    /// # Errors
    ///
    /// Returns a fatal error if the new call's pipeline cannot be started.
    pub fn on_super_header(&mut self, header: SuperHeader) -> Result<Option<FinishedCall>> {
        let changed = self
            .active
            .as_ref()
            .is_some_and(|call| *call.header() != header);
        let finished = if changed { self.finish() } else { None };

        if self.active.is_none() {
            self.start(header, Local::now().naive_local())?;
        }

        Ok(finished)
    }

    /// Audio payload arrived; dropped when no call is active
    pub fn on_audio_frame(&mut self, payload: &[u8]) {
        if let Some(call) = self.active.as_mut() {
            call.write_frame(payload);
        }
    }

    /// Explicit end of call
    pub fn on_terminator(&mut self) -> Option<FinishedCall> {
        self.finish()
    }

    /// Close the active call if it has been silent for the hang time
    pub fn check_hang_time(&mut self, now: Instant) -> Option<FinishedCall> {
        let idle = self.active.as_ref()?.idle_time(now);
        if idle < self.config.hang_time {
            return None;
        }
        tracing::info!("call timeout");
        self.finish()
    }

    /// Finalise the active call, if any
    ///
    /// Waits for every pipeline stage, then appends the recording to the
    /// daily aggregate when enabled. Aggregate failures are logged and do
    /// not affect the per-call file.
    pub fn finish(&mut self) -> Option<FinishedCall> {
        let call = self.active.take()?;
        log_call(call.header(), "ended");

        let mut finished = call.close();
        for warning in finished
            .exits
            .iter()
            .filter_map(|exit| exit_warning(&finished.header, exit))
        {
            tracing::warn!("{}", warning);
        }

        if self.config.daily_aggregate {
            let aggregate = paths::aggregate_file(
                &finished.path,
                &finished.header,
                &finished.started_at,
                &self.config.extension,
            );
            match append_to_aggregate(&finished.path, &aggregate) {
                Ok(bytes) => {
                    tracing::debug!("Appended {} bytes to {}", bytes, aggregate.display());
                    finished.aggregate = Some(aggregate);
                }
                Err(e) => tracing::warn!("{}", e),
            }
        }

        Some(finished)
    }

    fn start(&mut self, header: SuperHeader, started_at: NaiveDateTime) -> Result<()> {
        log_call(&header, "started");

        let path = paths::call_file(
            &self.config.output_dir,
            &header,
            &started_at,
            &self.config.extension,
        );

        let output = match create_output(&path) {
            Ok(file) => Some(file),
            Err(e) => {
                tracing::warn!("{}", e);
                None
            }
        };

        let commands: Vec<ExpandedCommand> = self
            .config
            .commands
            .iter()
            .filter_map(|command| command.expand(&header))
            .collect();

        let pipeline = Pipeline::start(&commands, output)?;
        self.active = Some(ActiveCall::new(header, started_at, path, pipeline));
        Ok(())
    }
}

fn create_output(path: &Path) -> Result<File> {
    let wrap = |source| CallRecError::OutputFile {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir).map_err(wrap)?;
    }
    File::create(path).map_err(wrap)
}

/// Warning for a stage that did not exit cleanly, naming the call
pub(super) fn exit_warning(header: &SuperHeader, exit: &StageExit) -> Option<String> {
    if exit.success() {
        return None;
    }
    let outcome = exit
        .status
        .map_or_else(|| "could not be waited on".to_string(), |s| format!("exited with {s}"));
    Some(format!(
        "command {} ({}) {}, dst: {} src: {}",
        exit.stage, exit.program, outcome, header.dst_id, header.src_id
    ))
}

fn log_call(header: &SuperHeader, event: &str) {
    tracing::info!(
        "{} call {}, dst: {} src: {} ({})",
        header.session_type.label(),
        event,
        header.dst_id,
        header.src_id,
        header.src_call
    );
}
