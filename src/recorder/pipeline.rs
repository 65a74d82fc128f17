//! Chained recording processes
//!
//! A pipeline is zero to three external processes wired stdout to stdin,
//! fed from the call's audio payload and ending in the call's output file:
//!
//! ```text
//! audio -> [stage 1] -> [stage 2] -> [stage 3] -> output file
//! ```
//!
//! Stages are spawned from the last one backwards so that each stage's
//! stdin pipe exists before the stage feeding it is started. Shutdown
//! runs the other way: the audio input is closed first and each stage is
//! waited on in order, so everything buffered upstream has reached the
//! file before the pipeline reports completion. With no stages configured
//! the payload is written straight to the output file.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStderr, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::command::ExpandedCommand;
use crate::error::{CallRecError, Result};

/// How long a stage's stderr drain may take to reach end of stream after
/// the stage has exited
const DRAIN_GRACE: Duration = Duration::from_millis(500);

/// Where audio payload is written
#[derive(Debug)]
enum Input {
    /// Stdin of the first stage
    Process(ChildStdin),
    /// Output file, no stages configured
    File(File),
    /// Nowhere: no stages and no output file
    Discard,
}

/// A running stage
#[derive(Debug)]
struct Stage {
    /// 1-based position in the pipeline
    number: usize,
    program: String,
    child: Child,
    drain: Option<JoinHandle<()>>,
}

/// How a stage ended
#[derive(Debug)]
pub struct StageExit {
    /// 1-based position in the pipeline
    pub stage: usize,
    /// Program name
    pub program: String,
    /// Exit status, `None` if waiting failed
    pub status: Option<ExitStatus>,
    /// Whether the stderr drain reached end of stream and was joined;
    /// `None` when the stage's stderr is not logged
    pub stderr_drained: Option<bool>,
}

impl StageExit {
    /// Did the stage exit cleanly?
    #[must_use]
    pub fn success(&self) -> bool {
        self.status.is_some_and(|status| status.success())
    }
}

/// A running recording pipeline
#[derive(Debug)]
pub struct Pipeline {
    input: Input,
    /// Stages in pipeline order (stage 1 first)
    stages: Vec<Stage>,
}

impl Pipeline {
    /// Start the configured stages
    ///
    /// `output` receives the last stage's stdout; when it is `None` that
    /// output is discarded.
    ///
    /// # Errors
    ///
    /// Returns `CallRecError::ProcessSpawn` if a stage cannot be started and
    /// `CallRecError::PipeSetup` if a stage's pipes cannot be wired. Stages
    /// already running are killed before the error is returned.
    pub fn start(commands: &[ExpandedCommand], output: Option<File>) -> Result<Self> {
        if commands.is_empty() {
            return Ok(Self {
                input: output.map_or(Input::Discard, Input::File),
                stages: Vec::new(),
            });
        }

        let mut sink = Some(output.map_or_else(Stdio::null, Stdio::from));
        let mut upstream: Option<ChildStdin> = None;
        let mut stages: Vec<Stage> = Vec::with_capacity(commands.len());

        for (index, command) in commands.iter().enumerate().rev() {
            let stdout = match upstream.take() {
                Some(stdin) => Stdio::from(stdin),
                None => sink.take().unwrap_or_else(Stdio::null),
            };

            match start_stage(index + 1, command, stdout) {
                Ok((stage, stdin)) => {
                    stages.push(stage);
                    upstream = Some(stdin);
                }
                Err(e) => {
                    kill_stages(&mut stages);
                    return Err(e);
                }
            }
        }

        stages.reverse();
        Ok(Self {
            input: upstream.map_or(Input::Discard, Input::Process),
            stages,
        })
    }

    /// Number of running stages
    #[must_use]
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Feed audio payload into the pipeline
    ///
    /// # Errors
    ///
    /// Returns the I/O error from the first stage's stdin or the output file.
    pub fn write(&mut self, payload: &[u8]) -> io::Result<()> {
        match &mut self.input {
            Input::Process(stdin) => stdin.write_all(payload),
            Input::File(file) => file.write_all(payload),
            Input::Discard => Ok(()),
        }
    }

    /// Close the input and wait for every stage in order
    ///
    /// A stage exiting with a non-zero status does not stop the remaining
    /// stages from being waited on. After each stage exits, its stderr
    /// drain gets `DRAIN_GRACE` to log what is left; a drain still held
    /// open past that (by a grandchild process) is detached.
    pub fn finish(mut self) -> Vec<StageExit> {
        match std::mem::replace(&mut self.input, Input::Discard) {
            Input::File(file) => {
                if let Err(e) = file.sync_all() {
                    tracing::warn!("Can't sync output file: {}", e);
                }
            }
            Input::Process(stdin) => drop(stdin),
            Input::Discard => {}
        }

        std::mem::take(&mut self.stages)
            .into_iter()
            .map(wait_stage)
            .collect()
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        kill_stages(&mut self.stages);
    }
}

fn start_stage(
    number: usize,
    command: &ExpandedCommand,
    stdout: Stdio,
) -> Result<(Stage, ChildStdin)> {
    let stderr = if command.show_stderr {
        Stdio::piped()
    } else {
        Stdio::null()
    };

    let child = Command::new(&command.program)
        .args(&command.args)
        .stdin(Stdio::piped())
        .stdout(stdout)
        .stderr(stderr)
        .spawn()
        .map_err(|source| CallRecError::ProcessSpawn {
            stage: number,
            program: command.program.clone(),
            source,
        })?;

    tracing::debug!(
        "Started command {} ({}), pid {}",
        number,
        command.program,
        child.id()
    );

    let mut stage = Stage {
        number,
        program: command.program.clone(),
        child,
        drain: None,
    };

    let Some(stdin) = stage.child.stdin.take() else {
        kill_stages(std::slice::from_mut(&mut stage));
        return Err(CallRecError::PipeSetup {
            stage: number,
            pipe: "stdin",
        });
    };

    if command.show_stderr {
        let drain = stage
            .child
            .stderr
            .take()
            .and_then(|stderr| drain_stderr(&command.program, stderr).ok());
        if drain.is_none() {
            kill_stages(std::slice::from_mut(&mut stage));
            return Err(CallRecError::PipeSetup {
                stage: number,
                pipe: "stderr",
            });
        }
        stage.drain = drain;
    }

    Ok((stage, stdin))
}

/// Log a stage's stderr line by line until it closes
fn drain_stderr(program: &str, stderr: ChildStderr) -> io::Result<JoinHandle<()>> {
    let program = program.to_string();
    thread::Builder::new()
        .name(format!("stderr-{program}"))
        .spawn(move || {
            for line in BufReader::new(stderr).split(b'\n') {
                match line {
                    Ok(bytes) => {
                        let text = String::from_utf8_lossy(&bytes);
                        let text = text.trim_end();
                        if !text.is_empty() {
                            tracing::info!("{}: {}", program, text);
                        }
                    }
                    Err(e) => {
                        tracing::warn!("Can't read stderr of {}: {}", program, e);
                        break;
                    }
                }
            }
        })
}

fn wait_stage(mut stage: Stage) -> StageExit {
    let status = match stage.child.wait() {
        Ok(status) => {
            tracing::debug!(
                "Command {} ({}) finished: {}",
                stage.number,
                stage.program,
                status
            );
            Some(status)
        }
        Err(e) => {
            tracing::debug!(
                "Can't wait for command {} ({}): {}",
                stage.number,
                stage.program,
                e
            );
            None
        }
    };

    let stderr_drained = stage.drain.take().map(|drain| {
        let joined = join_drain(drain);
        if !joined {
            tracing::debug!("stderr of {} still open, detaching", stage.program);
        }
        joined
    });

    StageExit {
        stage: stage.number,
        program: stage.program,
        status,
        stderr_drained,
    }
}

/// Join a drain once it has read to end of stream, waiting at most
/// `DRAIN_GRACE`
fn join_drain(drain: JoinHandle<()>) -> bool {
    let deadline = Instant::now() + DRAIN_GRACE;
    while !drain.is_finished() {
        if Instant::now() >= deadline {
            return false;
        }
        thread::sleep(Duration::from_millis(5));
    }
    drain.join().is_ok()
}

fn kill_stages(stages: &mut [Stage]) {
    for stage in stages {
        let _ = stage.child.kill();
        let _ = stage.child.wait();
    }
}
