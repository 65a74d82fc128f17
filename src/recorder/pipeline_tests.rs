use std::fs::{self, File};

use super::command::ExpandedCommand;
use super::pipeline::*;
use crate::error::CallRecError;

fn command(program: &str, args: &[&str]) -> ExpandedCommand {
    ExpandedCommand {
        program: program.to_string(),
        args: args.iter().map(ToString::to_string).collect(),
        show_stderr: false,
    }
}

fn shell(script: &str) -> ExpandedCommand {
    command("sh", &["-c", script])
}

#[test]
fn test_direct_write_without_stages() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.raw");

    let mut pipeline = Pipeline::start(&[], Some(File::create(&path).unwrap())).unwrap();
    assert_eq!(pipeline.stage_count(), 0);
    pipeline.write(b"abc").unwrap();
    pipeline.write(b"def").unwrap();
    let exits = pipeline.finish();

    assert!(exits.is_empty());
    assert_eq!(fs::read(&path).unwrap(), b"abcdef");
}

#[test]
fn test_discard_without_output() {
    let mut pipeline = Pipeline::start(&[], None).unwrap();
    pipeline.write(b"dropped").unwrap();
    assert!(pipeline.finish().is_empty());
}

#[cfg(unix)]
#[test]
fn test_single_stage_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.raw");

    let mut pipeline =
        Pipeline::start(&[command("cat", &[])], Some(File::create(&path).unwrap())).unwrap();
    pipeline.write(b"hello ").unwrap();
    pipeline.write(b"world").unwrap();
    let exits = pipeline.finish();

    assert_eq!(exits.len(), 1);
    assert!(exits[0].status.unwrap().success());
    assert_eq!(fs::read(&path).unwrap(), b"hello world");
}

#[cfg(unix)]
#[test]
fn test_three_stages_chain_in_order() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.txt");
    let commands = [
        command("tr", &["a-z", "A-Z"]),
        shell("sed 's/^/[/'"),
        shell("sed 's/$/]/'"),
    ];

    let mut pipeline = Pipeline::start(&commands, Some(File::create(&path).unwrap())).unwrap();
    assert_eq!(pipeline.stage_count(), 3);
    pipeline.write(b"first\nsecond\n").unwrap();
    let exits = pipeline.finish();

    let stages: Vec<usize> = exits.iter().map(|e| e.stage).collect();
    assert_eq!(stages, [1, 2, 3]);
    assert!(exits.iter().all(|e| e.status.unwrap().success()));
    assert_eq!(fs::read_to_string(&path).unwrap(), "[FIRST]\n[SECOND]\n");
}

#[cfg(unix)]
#[test]
fn test_failed_stage_still_waits_for_all() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.raw");
    let commands = [shell("cat; exit 3"), command("cat", &[])];

    let mut pipeline = Pipeline::start(&commands, Some(File::create(&path).unwrap())).unwrap();
    pipeline.write(b"payload").unwrap();
    let exits = pipeline.finish();

    assert_eq!(exits.len(), 2);
    assert_eq!(exits[0].status.unwrap().code(), Some(3));
    assert!(exits[1].status.unwrap().success());
    assert_eq!(fs::read(&path).unwrap(), b"payload");
}

#[cfg(unix)]
#[test]
fn test_stderr_drain_does_not_block() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("call.raw");
    let mut noisy = shell("echo starting >&2; cat; echo done >&2");
    noisy.show_stderr = true;

    let mut pipeline = Pipeline::start(&[noisy], Some(File::create(&path).unwrap())).unwrap();
    pipeline.write(b"x").unwrap();
    let exits = pipeline.finish();

    assert!(exits[0].status.unwrap().success());
    assert_eq!(exits[0].stderr_drained, Some(true));
    assert_eq!(fs::read(&path).unwrap(), b"x");
}

#[cfg(unix)]
#[test]
fn test_stderr_held_by_grandchild_is_detached() {
    let mut noisy = shell("sleep 3 & cat");
    noisy.show_stderr = true;

    let mut pipeline = Pipeline::start(&[noisy], None).unwrap();
    pipeline.write(b"x").unwrap();
    let started = std::time::Instant::now();
    let exits = pipeline.finish();

    assert!(exits[0].success());
    assert_eq!(exits[0].stderr_drained, Some(false));
    assert!(started.elapsed() < std::time::Duration::from_secs(2));
}

#[cfg(unix)]
#[test]
fn test_quiet_stage_has_no_drain() {
    let mut pipeline = Pipeline::start(&[command("cat", &[])], None).unwrap();
    pipeline.write(b"x").unwrap();
    let exits = pipeline.finish();
    assert_eq!(exits[0].stderr_drained, None);
}

#[cfg(unix)]
#[test]
fn test_missing_output_file_discards_stage_output() {
    let mut pipeline = Pipeline::start(&[command("cat", &[])], None).unwrap();
    pipeline.write(b"nowhere").unwrap();
    let exits = pipeline.finish();
    assert!(exits[0].status.unwrap().success());
}

#[test]
fn test_spawn_failure_names_stage() {
    let commands = [
        command("cat", &[]),
        command("/nonexistent/recorder-stage", &[]),
    ];

    let err = Pipeline::start(&commands, None).unwrap_err();

    assert!(err.is_fatal());
    assert!(matches!(
        err,
        CallRecError::ProcessSpawn { stage: 2, ref program, .. } if program == "/nonexistent/recorder-stage"
    ));
}

#[cfg(unix)]
#[test]
fn test_spawn_failure_of_first_stage_after_later_started() {
    let commands = [
        command("/nonexistent/recorder-stage", &[]),
        command("cat", &[]),
    ];

    let err = Pipeline::start(&commands, None).unwrap_err();

    assert!(matches!(err, CallRecError::ProcessSpawn { stage: 1, .. }));
}
