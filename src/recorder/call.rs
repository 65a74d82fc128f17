//! A call being recorded

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::NaiveDateTime;

use super::pipeline::{Pipeline, StageExit};
use crate::protocol::rewind::SuperHeader;

/// The call currently on air
#[derive(Debug)]
pub struct ActiveCall {
    header: SuperHeader,
    /// Local wall-clock start, used for file naming
    started_at: NaiveDateTime,
    started: Instant,
    last_frame: Instant,
    path: PathBuf,
    pipeline: Pipeline,
    frames: u64,
    bytes: u64,
    /// Set after the first failed write so the warning is logged once
    write_failed: bool,
}

impl ActiveCall {
    pub(super) fn new(
        header: SuperHeader,
        started_at: NaiveDateTime,
        path: PathBuf,
        pipeline: Pipeline,
    ) -> Self {
        let now = Instant::now();
        Self {
            header,
            started_at,
            started: now,
            last_frame: now,
            path,
            pipeline,
            frames: 0,
            bytes: 0,
            write_failed: false,
        }
    }

    /// Identity of the call
    #[must_use]
    pub fn header(&self) -> &SuperHeader {
        &self.header
    }

    /// Local start time
    #[must_use]
    pub fn started_at(&self) -> NaiveDateTime {
        self.started_at
    }

    /// Per-call output path
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Audio frames received so far
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }

    /// Time since the last audio frame (or the start, before any frame)
    #[must_use]
    pub fn idle_time(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.last_frame)
    }

    pub(super) fn write_frame(&mut self, payload: &[u8]) {
        self.last_frame = Instant::now();
        self.frames += 1;

        match self.pipeline.write(payload) {
            Ok(()) => self.bytes += payload.len() as u64,
            Err(e) => {
                if !self.write_failed {
                    tracing::warn!(
                        "Can't write audio for call dst: {} src: {}: {}",
                        self.header.dst_id,
                        self.header.src_id,
                        e
                    );
                    self.write_failed = true;
                }
            }
        }
    }

    /// Shut the pipeline down and summarise the call
    pub(super) fn close(self) -> FinishedCall {
        let exits = self.pipeline.finish();
        FinishedCall {
            header: self.header,
            started_at: self.started_at,
            path: self.path,
            duration: self.started.elapsed(),
            frames: self.frames,
            bytes: self.bytes,
            exits,
            aggregate: None,
        }
    }
}

/// Summary of a finalised call
#[derive(Debug)]
pub struct FinishedCall {
    /// Identity of the call
    pub header: SuperHeader,
    /// Local start time
    pub started_at: NaiveDateTime,
    /// Per-call output path
    pub path: PathBuf,
    /// Time from start to finalisation
    pub duration: Duration,
    /// Audio frames received
    pub frames: u64,
    /// Payload bytes written into the pipeline
    pub bytes: u64,
    /// How each pipeline stage ended
    pub exits: Vec<StageExit>,
    /// Aggregate file the call was appended to
    pub aggregate: Option<PathBuf>,
}
