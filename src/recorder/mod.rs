//! Call recording
//!
//! Turns call activity into per-call files: one external process pipeline
//! per call, output named after the call's destination, source and start
//! time, optionally collected into a daily aggregate.

mod aggregate;
mod call;
mod command;
mod config;
pub mod paths;
mod pipeline;
mod tracker;

#[cfg(test)]
mod pipeline_tests;

pub use aggregate::append_to_aggregate;
pub use call::{ActiveCall, FinishedCall};
pub use command::{ExpandedCommand, RecordingCommand, substitute};
pub use config::{MAX_COMMANDS, RecorderConfig};
pub use pipeline::{Pipeline, StageExit};
pub use tracker::CallTracker;
