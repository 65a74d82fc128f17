//! `callrec` - record calls from a REWIND relay

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Mutex;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use rewind_callrec::{CallTracker, Config, RelayClient, Result};

/// Record calls from a REWIND relay server
#[derive(Debug, Parser)]
#[command(name = "callrec", version, about)]
struct Args {
    /// Configuration file
    #[arg(short, long, default_value = "config.json")]
    config: PathBuf,

    /// Log file, appended to alongside stdout
    #[arg(long, default_value = "callrec.log")]
    log_file: PathBuf,
}

fn open_log_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn init_logging(log_file: &Path) {
    let (file, open_error) = match open_log_file(log_file) {
        Ok(file) => (Some(file), None),
        Err(e) => (None, Some(e)),
    };

    let file_layer = file.map(|f| fmt::layer().with_ansi(false).with_writer(Mutex::new(f)));

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .with(file_layer)
        .init();

    if let Some(e) = open_error {
        tracing::warn!("Can't open log file {}: {}", log_file.display(), e);
    }
}

async fn run(args: &Args) -> Result<()> {
    let config = Config::from_file(&args.config)?;
    let tracker = CallTracker::new(config.recorder_config());

    let mut client = RelayClient::connect(config.client_config(), tracker).await?;
    client.run().await
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(&args.log_file);

    tracing::info!("callrec v{} starting", rewind_callrec::VERSION);

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
