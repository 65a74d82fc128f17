use std::path::{Path, PathBuf};
use std::time::Duration;

use rewind_callrec::protocol::rewind::{
    Callsign, ConfigurationData, PacketType, SessionType, SuperHeader, challenge_response,
};
use rewind_callrec::testing::MockRelay;
use rewind_callrec::{
    CallRecError, CallTracker, ClientConfig, Config, LoginState, RecorderConfig, RelayClient,
    Result,
};

const WAIT: Duration = Duration::from_secs(5);

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

fn config_json(relay: &MockRelay, output_dir: &Path, aggregate: bool) -> String {
    let addr = relay.local_addr().unwrap();
    format!(
        r#"{{
            "ServerHost": "{}",
            "ServerPort": {},
            "ServerPassword": "s3cret",
            "AppID": 310999,
            "ServerTimeoutSeconds": 5,
            "RecTalkgroupID": 91,
            "CallHangTimeSeconds": 2,
            "OutputDir": "{}",
            "OutputFileExtension": "amb",
            "CreateDailyAggregateFile": {}
        }}"#,
        addr.ip(),
        addr.port(),
        output_dir.display(),
        aggregate
    )
}

fn fast(config: ClientConfig) -> ClientConfig {
    config
        .keepalive_interval(Duration::from_millis(100))
        .recv_wait(Duration::from_millis(50))
}

fn header(src_id: u32, callsign: &str) -> SuperHeader {
    SuperHeader {
        session_type: SessionType::GroupVoice,
        src_id,
        dst_id: 91,
        src_call: Callsign::pad(callsign),
        dst_call: Callsign::empty(),
    }
}

fn spawn_run(mut client: RelayClient) -> tokio::task::JoinHandle<(RelayClient, Result<()>)> {
    tokio::spawn(async move {
        let result = client.run().await;
        (client, result)
    })
}

fn files_under(dir: &Path) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        if path.is_dir() {
            files.extend(files_under(&path));
        } else {
            files.push(path);
        }
    }
    files.sort();
    files
}

#[tokio::test]
async fn test_handshake_record_and_close() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut relay = MockRelay::bind().await.unwrap();
    let config = Config::from_json(&config_json(&relay, dir.path(), true)).unwrap();

    let client = RelayClient::connect(
        fast(config.client_config()),
        CallTracker::new(config.recorder_config()),
    )
    .await
    .unwrap();
    let handle = spawn_run(client);

    let configuration = relay
        .wait_for(PacketType::Configuration, WAIT)
        .await
        .unwrap();
    assert_eq!(
        ConfigurationData::decode(&configuration.payload).unwrap(),
        ConfigurationData { options: 1 }
    );
    relay.wait_logged_in(WAIT).await.unwrap();

    relay.send_super_header(&header(2160001, "HG1ABC")).await.unwrap();
    relay.send_audio(&[0x11; 27]).await.unwrap();
    relay.send_audio(&[0x22; 27]).await.unwrap();
    relay.send_super_header(&header(2160002, "HG2DEF")).await.unwrap();
    relay.send_audio(&[0x33; 27]).await.unwrap();
    relay.send_terminator().await.unwrap();
    relay.send_close().await.unwrap();

    let (client, result) = handle.await.unwrap();
    assert!(matches!(result, Err(CallRecError::ServerClosed)));
    assert_eq!(client.login_state(), LoginState::LoggedIn);

    let files = files_under(dir.path());
    assert_eq!(files.len(), 3, "two calls and one aggregate: {files:?}");

    let first = files
        .iter()
        .find(|p| p.to_string_lossy().ends_with("-2160001-hg1abc.amb"))
        .unwrap();
    let second = files
        .iter()
        .find(|p| p.to_string_lossy().ends_with("-2160002-hg2def.amb"))
        .unwrap();
    let aggregate = files
        .iter()
        .find(|p| p.to_string_lossy().ends_with("-91.amb"))
        .unwrap();

    assert_eq!(std::fs::read(first).unwrap().len(), 54);
    assert_eq!(std::fs::read(second).unwrap(), vec![0x33; 27]);

    let mut expected = std::fs::read(first).unwrap();
    expected.extend(std::fs::read(second).unwrap());
    assert_eq!(std::fs::read(aggregate).unwrap(), expected);

    // All three share the destination/date directory
    assert!(first.starts_with(dir.path().join("91")));
    assert_eq!(first.parent(), aggregate.parent());
}

#[tokio::test]
async fn test_challenge_reauthenticates() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut relay = MockRelay::bind().await.unwrap();
    let config = Config::from_json(&config_json(&relay, dir.path(), false)).unwrap();

    let client = RelayClient::connect(
        fast(config.client_config()),
        CallTracker::new(RecorderConfig::with_output_dir(dir.path())),
    )
    .await
    .unwrap();
    let handle = spawn_run(client);

    relay.wait_logged_in(WAIT).await.unwrap();

    let challenge = b"0123456789abcdef";
    relay.send_challenge(challenge).await.unwrap();
    let answer = relay
        .wait_for(PacketType::Authentication, WAIT)
        .await
        .unwrap();
    assert_eq!(
        answer.payload.as_ref(),
        challenge_response(challenge, "s3cret").as_slice()
    );

    // The next keepalive exchange restarts the login
    relay.wait_for(PacketType::Configuration, WAIT).await.unwrap();
    relay.wait_logged_in(WAIT).await.unwrap();

    relay.send_close().await.unwrap();
    let (client, result) = handle.await.unwrap();
    assert!(matches!(result, Err(CallRecError::ServerClosed)));
    assert_eq!(client.login_state(), LoginState::LoggedIn);
}

#[cfg(unix)]
#[tokio::test]
async fn test_call_through_command_pipeline() {
    use rewind_callrec::RecordingCommand;

    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut relay = MockRelay::bind().await.unwrap();
    let config = Config::from_json(&config_json(&relay, dir.path(), false)).unwrap();
    let recorder = config
        .recorder_config()
        .command(RecordingCommand::new("tr a-z A-Z", true))
        .command(RecordingCommand::new("sed s/$/-$SRCCALL/", false));

    let client = RelayClient::connect(fast(config.client_config()), CallTracker::new(recorder))
        .await
        .unwrap();
    let handle = spawn_run(client);

    relay.wait_logged_in(WAIT).await.unwrap();
    relay.send_super_header(&header(7, "HA5K")).await.unwrap();
    relay.send_audio(b"hello\n").await.unwrap();
    relay.send_terminator().await.unwrap();
    relay.send_close().await.unwrap();

    let (_, result) = handle.await.unwrap();
    assert!(matches!(result, Err(CallRecError::ServerClosed)));

    let files = files_under(dir.path());
    assert_eq!(files.len(), 1);
    assert_eq!(std::fs::read(&files[0]).unwrap(), b"HELLO-HA5K\n");
}
